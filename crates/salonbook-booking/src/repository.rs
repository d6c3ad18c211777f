//! # Booking Repository
//!
//! The persistence contract. Implementations hold no business rules: they
//! store what they are given and enforce these compare-and-swap
//! preconditions:
//!
//! - [`BookingRepository::update_status`] writes only if the stored status
//!   still equals [`StatusUpdate::from`].
//! - An offer claim or withdrawal writes only if the offer is still open
//!   ([`StatusUpdate::stale_against`]).
//! - A [`JobSlotChange::Claim`] writes only if the hairdresser's
//!   `current_job_id` is empty.
//!
//! Any precondition failing is [`RepositoryError::Conflict`] and nothing
//! is written. Booking and slot changes commit together or not at all.
//!
//! [`JobSlotChange::Claim`]: salonbook_state::JobSlotChange::Claim

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use salonbook_core::{BookingId, Coordinate, HairdresserId, Money, SalonId, ServiceLocation, Timestamp};
use salonbook_state::{
    Actor, Booking, BookingStatus, Hairdresser, JobSlotChange, Salon, StatusUpdate,
};

use crate::error::RepositoryError;

/// Ordering of booking lists by `scheduled_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Earliest first.
    Asc,
    /// Latest first.
    #[default]
    Desc,
}

/// Filter and window for [`BookingRepository::list_by_actor`].
#[derive(Debug, Clone, PartialEq)]
pub struct BookingQuery {
    /// Whose bookings. Admin and system see all.
    pub actor: Actor,
    /// Only bookings in this status.
    pub status: Option<BookingStatus>,
    /// Items to skip.
    pub offset: usize,
    /// Maximum items to return.
    pub limit: usize,
    /// Sort direction on `scheduled_time`.
    pub order: SortOrder,
}

/// One window of a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items in this window.
    pub items: Vec<T>,
    /// Matching items across all windows.
    pub total: usize,
    /// Items skipped.
    pub offset: usize,
    /// Window size requested.
    pub limit: usize,
}

/// A validated salon joined with what candidate ranking needs from its
/// owner.
#[derive(Debug, Clone, PartialEq)]
pub struct SalonListing {
    /// The salon.
    pub salon: Salon,
    /// Owner's average rating.
    pub owner_rating: f64,
    /// Owner's base price.
    pub owner_base_price: Money,
}

/// Partial update of a hairdresser profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HairdresserPatch {
    /// New availability.
    pub is_available: Option<bool>,
    /// New location; `Some(None)` clears it.
    pub location: Option<Option<Coordinate>>,
    /// New base price.
    pub base_price: Option<Money>,
}

/// Partial update of a salon.
#[derive(Debug, Clone, PartialEq)]
pub struct SalonPatch {
    /// New name.
    pub name: Option<String>,
    /// New location.
    pub location: Option<ServiceLocation>,
    /// Replacement photo list.
    pub photos: Option<Vec<String>>,
    /// New validation flag.
    pub validated: Option<bool>,
    /// Modification time.
    pub updated_at: Timestamp,
}

impl SalonPatch {
    /// An empty patch stamped with `now`.
    pub fn at(now: Timestamp) -> Self {
        Self {
            name: None,
            location: None,
            photos: None,
            validated: None,
            updated_at: now,
        }
    }

    /// Write the set fields into `salon`.
    pub fn apply(&self, salon: &mut Salon) {
        if let Some(name) = &self.name {
            salon.name = name.clone();
        }
        if let Some(location) = &self.location {
            salon.location = location.clone();
        }
        if let Some(photos) = &self.photos {
            salon.photos = photos.clone();
        }
        if let Some(validated) = self.validated {
            salon.validated = validated;
        }
        salon.updated_at = self.updated_at;
    }
}

impl HairdresserPatch {
    /// Write the set fields into `hairdresser`.
    pub fn apply(&self, hairdresser: &mut Hairdresser) {
        if let Some(available) = self.is_available {
            hairdresser.is_available = available;
        }
        if let Some(location) = self.location {
            hairdresser.location = location;
        }
        if let Some(price) = self.base_price {
            hairdresser.base_price = price;
        }
    }
}

/// Apply a job-slot change to an already-locked hairdresser record.
///
/// `Claim` on an occupied slot is `Conflict`; `ReleaseCompleted` also
/// increments `total_jobs`.
pub fn apply_job_slot(
    hairdresser: &mut Hairdresser,
    change: JobSlotChange,
    booking_id: BookingId,
) -> Result<(), RepositoryError> {
    match change {
        JobSlotChange::Claim(_) => {
            if let Some(current) = hairdresser.current_job_id {
                return Err(RepositoryError::Conflict(format!(
                    "hairdresser already has {current} in progress"
                )));
            }
            hairdresser.current_job_id = Some(booking_id);
        }
        JobSlotChange::Release(_) => {
            hairdresser.current_job_id = None;
        }
        JobSlotChange::ReleaseCompleted(_) => {
            hairdresser.current_job_id = None;
            hairdresser.total_jobs = hairdresser.total_jobs.saturating_add(1);
        }
    }
    Ok(())
}

/// Durable storage for bookings and the directory they are matched
/// against.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    // -- Bookings -----------------------------------------------------------

    /// Persist a new booking.
    async fn create(&self, booking: Booking) -> Result<Booking, RepositoryError>;

    /// Fetch a booking.
    async fn get_by_id(&self, id: BookingId) -> Result<Booking, RepositoryError>;

    /// Apply `update` if the booking's status still equals `update.from`,
    /// together with its job-slot change. Returns the booking as written.
    async fn update_status(&self, update: &StatusUpdate) -> Result<Booking, RepositoryError>;

    /// Bookings visible to `query.actor`, filtered, sorted and windowed.
    async fn list_by_actor(&self, query: &BookingQuery) -> Result<Page<Booking>, RepositoryError>;

    /// `pending` or `confirmed` bookings scheduled before `cutoff`, earliest
    /// first.
    async fn list_expiring(
        &self,
        cutoff: Timestamp,
        limit: usize,
    ) -> Result<Vec<Booking>, RepositoryError>;

    /// Store a rating on a `completed`, unrated booking and fold it into
    /// the hairdresser's average. `Conflict` if already rated or not
    /// completed.
    async fn record_rating(&self, id: BookingId, stars: u8) -> Result<Booking, RepositoryError>;

    // -- Directory ----------------------------------------------------------

    /// Validated salons with their owners' rating and price.
    async fn list_validated_salons(&self) -> Result<Vec<SalonListing>, RepositoryError>;

    /// Hairdressers that are available and have no job in progress.
    async fn list_available_hairdressers(&self) -> Result<Vec<Hairdresser>, RepositoryError>;

    /// Persist a new hairdresser. `Conflict` if the id exists.
    async fn insert_hairdresser(&self, hairdresser: Hairdresser)
        -> Result<Hairdresser, RepositoryError>;

    /// Fetch a hairdresser.
    async fn get_hairdresser(&self, id: HairdresserId) -> Result<Hairdresser, RepositoryError>;

    /// Apply a partial update to a hairdresser.
    async fn update_hairdresser(
        &self,
        id: HairdresserId,
        patch: &HairdresserPatch,
    ) -> Result<Hairdresser, RepositoryError>;

    /// Persist a new salon. `Conflict` if its owner already has one.
    async fn insert_salon(&self, salon: Salon) -> Result<Salon, RepositoryError>;

    /// Fetch a salon.
    async fn get_salon(&self, id: SalonId) -> Result<Salon, RepositoryError>;

    /// Apply a partial update to a salon.
    async fn update_salon(&self, id: SalonId, patch: &SalonPatch) -> Result<Salon, RepositoryError>;
}
