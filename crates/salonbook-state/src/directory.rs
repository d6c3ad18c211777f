//! # Directory Entities
//!
//! Hairdresser and salon profiles. These are what candidate search ranks
//! and what bookings are assigned to.

use serde::{Deserialize, Serialize};

use salonbook_core::{
    BookingId, Coordinate, HairdresserId, Money, SalonId, ServiceLocation, Timestamp, UserId,
    ValidationError,
};

/// A hairdresser profile.
///
/// `current_job_id` is set exactly while one of this hairdresser's bookings
/// is `in_progress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hairdresser {
    /// Profile id.
    pub id: HairdresserId,
    /// Owning user account.
    pub user_id: UserId,
    /// Mean star rating in [0, 5]. Zero until rated.
    pub average_rating: f64,
    /// Number of ratings folded into `average_rating`.
    #[serde(default)]
    pub rating_count: u32,
    /// Completed jobs.
    pub total_jobs: u32,
    /// Accepting new home bookings.
    pub is_available: bool,
    /// The booking currently in progress.
    pub current_job_id: Option<BookingId>,
    /// Last known position, for home-service matching.
    pub location: Option<Coordinate>,
    /// Starting price quoted to clients.
    pub base_price: Money,
    /// Registration time.
    pub created_at: Timestamp,
}

impl Hairdresser {
    /// A freshly registered, available hairdresser with no history.
    pub fn new(
        user_id: UserId,
        base_price: Money,
        location: Option<Coordinate>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: HairdresserId::new(),
            user_id,
            average_rating: 0.0,
            rating_count: 0,
            total_jobs: 0,
            is_available: true,
            current_job_id: None,
            location,
            base_price,
            created_at: now,
        }
    }

    /// Has a job in progress.
    pub fn is_busy(&self) -> bool {
        self.current_job_id.is_some()
    }

    /// Eligible for a home booking: available and not mid-job.
    pub fn can_take_home_booking(&self) -> bool {
        self.is_available && !self.is_busy()
    }

    /// Fold a 1-5 star rating into the running average.
    pub fn record_rating(&mut self, stars: u8) {
        let total = self.average_rating * f64::from(self.rating_count) + f64::from(stars);
        self.rating_count = self.rating_count.saturating_add(1);
        self.average_rating = (total / f64::from(self.rating_count)).clamp(0.0, 5.0);
    }
}

/// A salon. Owned by exactly one hairdresser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Salon {
    /// Salon id.
    pub id: SalonId,
    /// The owning hairdresser.
    pub owner: HairdresserId,
    /// Display name.
    pub name: String,
    /// Address and coordinate.
    pub location: ServiceLocation,
    /// Photo URLs, in display order.
    pub photos: Vec<String>,
    /// Approved by an administrator. Unvalidated salons are never offered.
    pub validated: bool,
    /// Registration time.
    pub created_at: Timestamp,
    /// Last modification.
    pub updated_at: Timestamp,
}

impl Salon {
    /// A new, not yet validated salon.
    pub fn new(
        owner: HairdresserId,
        name: impl Into<String>,
        location: ServiceLocation,
        photos: Vec<String>,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let name = validate_name(name.into())?;
        validate_photos(&photos)?;
        Ok(Self {
            id: SalonId::new(),
            owner,
            name,
            location,
            photos,
            validated: false,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Trim a salon name and reject an empty one.
pub fn validate_name(name: String) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field: "name" });
    }
    Ok(trimmed.to_string())
}

/// Photo URLs must be absolute http(s).
pub fn validate_photos(photos: &[String]) -> Result<(), ValidationError> {
    for url in photos {
        let ok = (url.starts_with("https://") || url.starts_with("http://"))
            && !url.contains(char::is_whitespace);
        if !ok {
            return Err(ValidationError::InvalidUrl { url: url.clone() });
        }
    }
    Ok(())
}
