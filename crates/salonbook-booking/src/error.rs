//! # Error Types
//!
//! [`RepositoryError`] is what storage reports. [`BookingError`] is what the
//! services return: exactly the kinds a caller must distinguish, each an
//! expected outcome rather than a bug.

use thiserror::Error;

use salonbook_core::ValidationError;
use salonbook_state::{BookingEvent, BookingStatus, TransitionError};

/// Failure reported by a [`crate::BookingRepository`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// No record with this id.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record.
        entity: &'static str,
        /// The missing id.
        id: String,
    },

    /// A compare-and-swap precondition no longer held, or a uniqueness
    /// constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store could not be reached, timed out, or the caller cancelled.
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    /// Shorthand for [`RepositoryError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Failure of a booking or directory operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    /// Bad input shape or range.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown booking, hairdresser or salon.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record.
        entity: &'static str,
        /// The missing id.
        id: String,
    },

    /// The actor is not authorized for this record.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The state machine has no such transition.
    #[error("cannot {event} a booking in state {from}")]
    InvalidTransition {
        /// Status when the event was requested.
        from: BookingStatus,
        /// The requested event.
        event: BookingEvent,
    },

    /// Lost an optimistic-concurrency race.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Candidate search found nobody and no target was chosen.
    #[error("no candidates found within {radius_km} km")]
    NoCandidatesFound {
        /// The radius that was searched.
        radius_km: f64,
    },

    /// Storage failure or timeout. Retry with backoff.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl BookingError {
    /// Message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Conflict(reason) => reason.clone(),
            Self::NoCandidatesFound { .. } => "no hairdresser available nearby".to_string(),
            Self::Unavailable(_) => "service temporarily unavailable, please retry".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether retrying the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<ValidationError> for BookingError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<TransitionError> for BookingError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::InvalidTransition { from, event } => {
                Self::InvalidTransition { from, event }
            }
            forbidden @ TransitionError::Forbidden { .. } => Self::Forbidden(forbidden.to_string()),
        }
    }
}

impl From<RepositoryError> for BookingError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepositoryError::Conflict(reason) => Self::Conflict(reason),
            RepositoryError::Unavailable(reason) => Self::Unavailable(reason),
        }
    }
}
