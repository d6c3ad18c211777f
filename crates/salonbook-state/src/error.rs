//! # Transition Errors

use thiserror::Error;

use crate::actor::ActorRole;
use crate::booking::BookingStatus;
use crate::machine::BookingEvent;

/// A booking transition was refused. The booking is left unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// No row in the transition table for this (state, event) pair.
    #[error("cannot {event} a booking in state {from}")]
    InvalidTransition {
        /// Status of the booking when the event was requested.
        from: BookingStatus,
        /// The requested event.
        event: BookingEvent,
    },

    /// The transition exists but this actor may not perform it.
    #[error("{role} may not {event} this booking: {reason}")]
    Forbidden {
        /// Role of the refused actor.
        role: ActorRole,
        /// The requested event.
        event: BookingEvent,
        /// Why the actor was refused.
        reason: String,
    },
}
