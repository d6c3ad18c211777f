//! # In-Memory Repository
//!
//! [`MemoryRepository`] keeps bookings, hairdressers and salons in
//! [`Store`]s, each an `Arc<RwLock<HashMap<Uuid, T>>>`.
//!
//! All locks are `parking_lot` and never held across an `.await`. When an
//! operation needs more than one store it takes the write locks in a fixed
//! order (bookings, hairdressers, salons), so compound writes are atomic and
//! cannot deadlock.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use salonbook_core::{BookingId, HairdresserId, SalonId, Timestamp};
use salonbook_state::{Booking, BookingStatus, Hairdresser, Salon, StatusUpdate};

use crate::error::RepositoryError;
use crate::repository::{
    apply_job_slot, BookingQuery, BookingRepository, HairdresserPatch, Page, SalonListing,
    SalonPatch, SortOrder,
};

/// Thread-safe map from UUID to record.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Atomically read-validate-update a record.
    ///
    /// Returns `None` if the record doesn't exist, or `Some(result)` with
    /// the closure's `Result`.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, T>> {
        self.data.read()
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, T>> {
        self.data.write()
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// [`BookingRepository`] over in-process stores.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    bookings: Store<Booking>,
    hairdressers: Store<Hairdresser>,
    salons: Store<Salon>,
}

impl MemoryRepository {
    /// An empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored bookings.
    pub fn booking_count(&self) -> usize {
        self.bookings.len()
    }
}

#[async_trait]
impl BookingRepository for MemoryRepository {
    async fn create(&self, booking: Booking) -> Result<Booking, RepositoryError> {
        let mut bookings = self.bookings.write();
        if bookings.contains_key(&booking.id.0) {
            return Err(RepositoryError::Conflict(format!(
                "{} already exists",
                booking.id
            )));
        }
        bookings.insert(booking.id.0, booking.clone());
        Ok(booking)
    }

    async fn get_by_id(&self, id: BookingId) -> Result<Booking, RepositoryError> {
        self.bookings
            .get(&id.0)
            .ok_or_else(|| RepositoryError::not_found("booking", id))
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<Booking, RepositoryError> {
        let mut bookings = self.bookings.write();
        let mut hairdressers = self.hairdressers.write();

        let booking = bookings
            .get_mut(&update.booking_id.0)
            .ok_or_else(|| RepositoryError::not_found("booking", update.booking_id))?;
        if booking.status != update.from {
            return Err(RepositoryError::Conflict(format!(
                "expected status {}, found {}",
                update.from, booking.status
            )));
        }
        if let Some(reason) = update.stale_against(booking) {
            return Err(RepositoryError::Conflict(reason));
        }
        if let Some(change) = update.job_slot {
            let hid = change.hairdresser_id();
            let hairdresser = hairdressers
                .get_mut(&hid.0)
                .ok_or_else(|| RepositoryError::not_found("hairdresser", hid))?;
            apply_job_slot(hairdresser, change, booking.id)?;
        }
        update.apply(booking);
        Ok(booking.clone())
    }

    async fn list_by_actor(&self, query: &BookingQuery) -> Result<Page<Booking>, RepositoryError> {
        let mut matching: Vec<Booking> = self
            .bookings
            .read()
            .values()
            .filter(|b| b.is_visible_to(&query.actor))
            .filter(|b| query.status.map_or(true, |s| b.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            let by_time = a.scheduled_time.cmp(&b.scheduled_time);
            let by_time = match query.order {
                SortOrder::Asc => by_time,
                SortOrder::Desc => by_time.reverse(),
            };
            by_time.then_with(|| a.id.cmp(&b.id))
        });
        let total = matching.len();
        let items = matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();
        Ok(Page {
            items,
            total,
            offset: query.offset,
            limit: query.limit,
        })
    }

    async fn list_expiring(
        &self,
        cutoff: Timestamp,
        limit: usize,
    ) -> Result<Vec<Booking>, RepositoryError> {
        let mut expiring: Vec<Booking> = self
            .bookings
            .read()
            .values()
            .filter(|b| matches!(b.status, BookingStatus::Pending | BookingStatus::Confirmed))
            .filter(|b| b.scheduled_time < cutoff)
            .cloned()
            .collect();
        expiring.sort_by(|a, b| {
            a.scheduled_time
                .cmp(&b.scheduled_time)
                .then_with(|| a.id.cmp(&b.id))
        });
        expiring.truncate(limit);
        Ok(expiring)
    }

    async fn record_rating(&self, id: BookingId, stars: u8) -> Result<Booking, RepositoryError> {
        let mut bookings = self.bookings.write();
        let mut hairdressers = self.hairdressers.write();

        let booking = bookings
            .get_mut(&id.0)
            .ok_or_else(|| RepositoryError::not_found("booking", id))?;
        if booking.status != BookingStatus::Completed {
            return Err(RepositoryError::Conflict(format!(
                "booking is {}, not completed",
                booking.status
            )));
        }
        if booking.rating.is_some() {
            return Err(RepositoryError::Conflict("booking already rated".into()));
        }
        if let Some(hid) = booking.hairdresser_id {
            let hairdresser = hairdressers
                .get_mut(&hid.0)
                .ok_or_else(|| RepositoryError::not_found("hairdresser", hid))?;
            hairdresser.record_rating(stars);
        }
        booking.rating = Some(stars);
        Ok(booking.clone())
    }

    async fn list_validated_salons(&self) -> Result<Vec<SalonListing>, RepositoryError> {
        let hairdressers = self.hairdressers.read();
        let salons = self.salons.read();
        Ok(salons
            .values()
            .filter(|s| s.validated)
            .filter_map(|s| {
                hairdressers.get(&s.owner.0).map(|owner| SalonListing {
                    salon: s.clone(),
                    owner_rating: owner.average_rating,
                    owner_base_price: owner.base_price,
                })
            })
            .collect())
    }

    async fn list_available_hairdressers(&self) -> Result<Vec<Hairdresser>, RepositoryError> {
        Ok(self
            .hairdressers
            .read()
            .values()
            .filter(|h| h.can_take_home_booking())
            .cloned()
            .collect())
    }

    async fn insert_hairdresser(
        &self,
        hairdresser: Hairdresser,
    ) -> Result<Hairdresser, RepositoryError> {
        let mut hairdressers = self.hairdressers.write();
        if hairdressers.contains_key(&hairdresser.id.0) {
            return Err(RepositoryError::Conflict(format!(
                "{} already registered",
                hairdresser.id
            )));
        }
        hairdressers.insert(hairdresser.id.0, hairdresser.clone());
        Ok(hairdresser)
    }

    async fn get_hairdresser(&self, id: HairdresserId) -> Result<Hairdresser, RepositoryError> {
        self.hairdressers
            .get(&id.0)
            .ok_or_else(|| RepositoryError::not_found("hairdresser", id))
    }

    async fn update_hairdresser(
        &self,
        id: HairdresserId,
        patch: &HairdresserPatch,
    ) -> Result<Hairdresser, RepositoryError> {
        self.hairdressers
            .try_update(&id.0, |h| {
                patch.apply(h);
                Ok(h.clone())
            })
            .unwrap_or_else(|| Err(RepositoryError::not_found("hairdresser", id)))
    }

    async fn insert_salon(&self, salon: Salon) -> Result<Salon, RepositoryError> {
        let mut salons = self.salons.write();
        if salons.values().any(|s| s.owner == salon.owner) {
            return Err(RepositoryError::Conflict(format!(
                "{} already owns a salon",
                salon.owner
            )));
        }
        salons.insert(salon.id.0, salon.clone());
        Ok(salon)
    }

    async fn get_salon(&self, id: SalonId) -> Result<Salon, RepositoryError> {
        self.salons
            .get(&id.0)
            .ok_or_else(|| RepositoryError::not_found("salon", id))
    }

    async fn update_salon(&self, id: SalonId, patch: &SalonPatch) -> Result<Salon, RepositoryError> {
        self.salons
            .try_update(&id.0, |s| {
                patch.apply(s);
                Ok(s.clone())
            })
            .unwrap_or_else(|| Err(RepositoryError::not_found("salon", id)))
    }
}
