//! # Response Views
//!
//! JSON shapes returned by the API, with OpenAPI schemas. Domain types stay
//! free of HTTP concerns; each view is built from its domain record with a
//! `From` impl. Also holds the location inputs shared by several request
//! bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use salonbook_booking::{Candidate, CandidateTarget, Page};
use salonbook_core::{Coordinate, ServiceLocation, Timestamp, ValidationError};
use salonbook_state::{
    Booking, BookingStatus, BookingTransitionRecord, ClientRef, Hairdresser, Salon, ServiceType,
};

fn utc(ts: Timestamp) -> DateTime<Utc> {
    *ts.as_datetime()
}

/// Latitude/longitude pair in request bodies. Range-checked on conversion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct CoordinateInput {
    /// Degrees in [-90, 90].
    pub latitude: f64,
    /// Degrees in [-180, 180].
    pub longitude: f64,
}

impl CoordinateInput {
    pub fn into_coordinate(self) -> Result<Coordinate, ValidationError> {
        Coordinate::new(self.latitude, self.longitude)
    }
}

impl From<Coordinate> for CoordinateInput {
    fn from(c: Coordinate) -> Self {
        Self {
            latitude: c.latitude(),
            longitude: c.longitude(),
        }
    }
}

/// Address with coordinate, in request and response bodies.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationInput {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationInput {
    pub fn into_location(self) -> Result<ServiceLocation, ValidationError> {
        let coordinate = Coordinate::new(self.latitude, self.longitude)?;
        ServiceLocation::new(self.address, coordinate)
    }
}

impl From<&ServiceLocation> for LocationInput {
    fn from(l: &ServiceLocation) -> Self {
        Self {
            address: l.address().to_string(),
            latitude: l.coordinate().latitude(),
            longitude: l.coordinate().longitude(),
        }
    }
}

/// A booking.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingView {
    pub id: Uuid,
    /// `{"kind": "registered", "client_id": ..}` or
    /// `{"kind": "guest", "name": .., "phone": ..}`.
    #[schema(value_type = Object)]
    pub client: ClientRef,
    pub hairdresser_id: Option<Uuid>,
    pub salon_id: Option<Uuid>,
    /// Hairdressers who may claim the booking while it is unassigned.
    pub offered_to: Vec<Uuid>,
    pub hairstyle_id: Uuid,
    #[schema(value_type = String)]
    pub service_type: ServiceType,
    pub location: LocationInput,
    pub scheduled_time: DateTime<Utc>,
    pub estimated_duration_minutes: u32,
    /// Minor units.
    pub client_price: i64,
    /// Minor units.
    pub service_fee: i64,
    #[schema(value_type = String)]
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub rating: Option<u8>,
    #[schema(value_type = Vec<Object>)]
    pub transitions: Vec<BookingTransitionRecord>,
}

impl From<Booking> for BookingView {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id.0,
            client: b.client,
            hairdresser_id: b.hairdresser_id.map(|h| h.0),
            salon_id: b.salon_id.map(|s| s.0),
            offered_to: b.offered_to.iter().map(|h| h.0).collect(),
            hairstyle_id: b.hairstyle_id.0,
            service_type: b.service_type,
            location: LocationInput::from(&b.location),
            scheduled_time: utc(b.scheduled_time),
            estimated_duration_minutes: b.estimated_duration_minutes,
            client_price: b.client_price.minor_units(),
            service_fee: b.service_fee.minor_units(),
            status: b.status,
            created_at: utc(b.created_at),
            started_at: b.started_at.map(utc),
            completed_at: b.completed_at.map(utc),
            cancelled_at: b.cancelled_at.map(utc),
            cancellation_reason: b.cancellation_reason,
            rating: b.rating,
            transitions: b.transitions,
        }
    }
}

/// One page of bookings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingPageView {
    pub items: Vec<BookingView>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

impl From<Page<Booking>> for BookingPageView {
    fn from(p: Page<Booking>) -> Self {
        Self {
            items: p.items.into_iter().map(BookingView::from).collect(),
            total: p.total,
            offset: p.offset,
            limit: p.limit,
        }
    }
}

/// A candidate salon or hairdresser.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CandidateView {
    /// `salon` or `hairdresser`.
    pub kind: String,
    /// Salon id or hairdresser id, per `kind`.
    pub id: Uuid,
    /// Hairdresser who would do the job.
    pub hairdresser_id: Uuid,
    pub name: Option<String>,
    pub distance_km: f64,
    pub rating: f64,
    /// Minor units.
    pub price: i64,
}

impl From<Candidate> for CandidateView {
    fn from(c: Candidate) -> Self {
        let (kind, id) = match c.target {
            CandidateTarget::Salon(id) => ("salon", id.0),
            CandidateTarget::Hairdresser(id) => ("hairdresser", id.0),
        };
        Self {
            kind: kind.to_string(),
            id,
            hairdresser_id: c.hairdresser_id.0,
            name: c.name,
            distance_km: c.distance_km,
            rating: c.rating,
            price: c.price.minor_units(),
        }
    }
}

/// A hairdresser profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HairdresserView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub average_rating: f64,
    pub rating_count: u32,
    pub total_jobs: u32,
    pub is_available: bool,
    pub current_job_id: Option<Uuid>,
    pub location: Option<CoordinateInput>,
    /// Minor units.
    pub base_price: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Hairdresser> for HairdresserView {
    fn from(h: Hairdresser) -> Self {
        Self {
            id: h.id.0,
            user_id: h.user_id.0,
            average_rating: h.average_rating,
            rating_count: h.rating_count,
            total_jobs: h.total_jobs,
            is_available: h.is_available,
            current_job_id: h.current_job_id.map(|b| b.0),
            location: h.location.map(CoordinateInput::from),
            base_price: h.base_price.minor_units(),
            created_at: utc(h.created_at),
        }
    }
}

/// A salon.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SalonView {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub location: LocationInput,
    pub photos: Vec<String>,
    pub validated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Salon> for SalonView {
    fn from(s: Salon) -> Self {
        Self {
            id: s.id.0,
            owner_id: s.owner.0,
            name: s.name,
            location: LocationInput::from(&s.location),
            photos: s.photos,
            validated: s.validated,
            created_at: utc(s.created_at),
            updated_at: utc(s.updated_at),
        }
    }
}
