//! # salonbook-booking — Booking Orchestration
//!
//! Ties the pure state machine in `salonbook-state` to storage, search and
//! delivery:
//!
//! - **Repository** ([`repository`]): the [`BookingRepository`] persistence
//!   contract, with compare-and-swap status updates.
//! - **Memory** ([`memory`]): [`MemoryRepository`], a lock-based
//!   implementation used by tests and by the server when no database is
//!   configured.
//! - **Locator** ([`locator`]): [`CandidateLocator`], proximity search over
//!   salons and available hairdressers.
//! - **Service** ([`service`]): [`BookingService`], the externally visible
//!   booking operations.
//! - **Directory** ([`directory`]): [`DirectoryService`], salon and
//!   hairdresser management.
//! - **Notify** ([`notify`]): the fire-and-forget [`Notifier`] seam.
//! - **Sweep** ([`sweep`]): periodic cancellation of expired bookings.
//! - **Context** ([`context`]): [`OpContext`], the timeout and cancellation
//!   carried into every repository call.
//!
//! ## Concurrency
//!
//! Every status change is planned against a snapshot and written with
//! [`BookingRepository::update_status`], which fails with
//! [`RepositoryError::Conflict`] if the stored status moved in between.
//! The losing caller sees [`BookingError::Conflict`]; nothing is retried
//! silently.

pub mod config;
pub mod context;
pub mod directory;
pub mod error;
pub mod locator;
pub mod memory;
pub mod notify;
pub mod repository;
pub mod service;
pub mod sweep;
pub mod telemetry;

pub use config::{BookingConfig, ConfigError};
pub use context::OpContext;
pub use directory::{
    DirectoryService, RegisterHairdresserRequest, RegisterSalonRequest, UpdateSalonRequest,
};
pub use error::{BookingError, RepositoryError};
pub use locator::{rank_candidates, Candidate, CandidateLocator, CandidateQuery, CandidateTarget};
pub use memory::MemoryRepository;
pub use notify::{BookingNotification, Notifier, NotifyError, TracingNotifier};
pub use repository::{
    apply_job_slot, BookingQuery, BookingRepository, HairdresserPatch, Page, SalonListing,
    SalonPatch, SortOrder,
};
pub use service::{BookingService, CreateBookingRequest, ListBookingsRequest, ResponseDecision};
pub use sweep::{spawn_expiry_sweeper, SweepReport};
