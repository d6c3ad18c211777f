//! # salonbook-state — Booking Lifecycle
//!
//! Domain entities and the state machine that drives a booking from request
//! to completion:
//!
//! - **Actor** ([`actor`]): who is calling. Every transition is authorized
//!   against an [`Actor`] supplied by the auth collaborator.
//!
//! - **Booking** ([`booking`]): the booking entity, its status enum and the
//!   append-only transition log.
//!
//! - **Directory** ([`directory`]): hairdresser and salon profiles, the
//!   candidates a booking is matched against.
//!
//! - **Machine** ([`machine`]): the transition table and
//!   [`BookingStateMachine::plan`], which turns (booking, actor, event) into a
//!   [`StatusUpdate`] without mutating anything.
//!
//! ## Design
//!
//! Unlike a typestate encoding, bookings are loaded from storage with a
//! status only known at runtime, so the machine is a table lookup over
//! `(BookingStatus, BookingEvent)`. Planning is pure; applying a plan is the
//! repository's job, conditioned on the status still matching
//! [`StatusUpdate::from`].

pub mod actor;
pub mod booking;
pub mod directory;
pub mod error;
pub mod machine;

pub use actor::{Actor, ActorRole};
pub use booking::{
    Booking, BookingDraft, BookingStatus, BookingTransitionRecord, ClientRef, ServiceType,
};
pub use directory::{validate_name, validate_photos, Hairdresser, Salon};
pub use error::TransitionError;
pub use machine::{
    BookingEvent, BookingStateMachine, JobSlotChange, StatusUpdate, TransitionRule,
    TRANSITION_TABLE,
};
