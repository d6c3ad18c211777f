//! # Booking Entity
//!
//! A client's request for a hairstyle at a time and place, and everything
//! that happens to it afterwards.
//!
//! ## Lifecycle
//!
//! ```text
//! PENDING ──accept──▶ CONFIRMED ──start──▶ IN_PROGRESS ──complete──▶ COMPLETED
//!    │                    │                     │
//!  reject               cancel                cancel
//!    │                    │                     │
//!    ▼                    ▼                     ▼
//! REJECTED            CANCELLED             CANCELLED
//!    (PENDING ──cancel──▶ CANCELLED as well)
//! ```
//!
//! ## Invariants
//!
//! - `completed_at` is set iff status is `Completed`; `cancelled_at` is set
//!   iff status is `Cancelled`.
//! - `transitions` is append-only and its last `to` equals `status`.

use serde::{Deserialize, Serialize};

use salonbook_core::{
    BookingId, ClientId, HairdresserId, HairstyleId, Money, SalonId, ServiceLocation, Timestamp,
    ValidationError,
};

use crate::actor::{Actor, ActorRole};
use crate::machine::BookingEvent;

/// Booking status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Requested, awaiting a hairdresser's decision.
    Pending,
    /// Accepted by a hairdresser.
    Confirmed,
    /// The hairdresser has started the job.
    InProgress,
    /// Job finished. Terminal.
    Completed,
    /// Called off by a participant or by expiry. Terminal.
    Cancelled,
    /// Declined by the hairdresser. Terminal.
    Rejected,
}

impl BookingStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [BookingStatus; 6] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::Rejected,
    ];

    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
        }
    }

    /// Parse a canonical status name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }

    /// Whether no transition leaves this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Rejected)
    }

    /// Whether the booking still occupies a slot in someone's schedule.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the service is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    /// The hairdresser travels to the client.
    Home,
    /// The client goes to a salon.
    Salon,
}

impl ServiceType {
    /// The canonical string name of this service type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Salon => "salon",
        }
    }

    /// Parse a canonical service type name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "home" => Some(Self::Home),
            "salon" => Some(Self::Salon),
            _ => None,
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who the booking is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientRef {
    /// A client with an account.
    Registered {
        /// The client's id.
        client_id: ClientId,
    },
    /// A walk-in identified only by name and phone.
    Guest {
        /// Display name.
        name: String,
        /// Contact phone number.
        phone: String,
    },
}

impl ClientRef {
    /// The registered client id, if any.
    pub fn client_id(&self) -> Option<ClientId> {
        match self {
            Self::Registered { client_id } => Some(*client_id),
            Self::Guest { .. } => None,
        }
    }

    /// Guests need a non-empty name and phone.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Self::Guest { name, phone } = self {
            if name.trim().is_empty() {
                return Err(ValidationError::Empty { field: "guest name" });
            }
            if phone.trim().is_empty() {
                return Err(ValidationError::Empty {
                    field: "guest phone",
                });
            }
        }
        Ok(())
    }
}

/// One entry in a booking's transition log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingTransitionRecord {
    /// Status before the transition.
    pub from: BookingStatus,
    /// Status after the transition.
    pub to: BookingStatus,
    /// The event that caused it.
    pub event: BookingEvent,
    /// Who triggered it.
    pub actor: Actor,
    /// When it was committed.
    pub at: Timestamp,
    /// Free-text reason, for cancellations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// The fields of a booking fixed at creation.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    /// Who the booking is for.
    pub client: ClientRef,
    /// Assigned hairdresser, if known at creation.
    pub hairdresser_id: Option<HairdresserId>,
    /// Salon, for salon bookings.
    pub salon_id: Option<SalonId>,
    /// Hairdressers allowed to claim an unassigned booking.
    pub offered_to: Vec<HairdresserId>,
    /// Requested hairstyle.
    pub hairstyle_id: HairstyleId,
    /// Home or salon.
    pub service_type: ServiceType,
    /// Where the service happens.
    pub location: ServiceLocation,
    /// When the service happens.
    pub scheduled_time: Timestamp,
    /// Expected length of the job in minutes. Must be positive.
    pub estimated_duration_minutes: u32,
    /// What the client pays.
    pub client_price: Money,
    /// Platform share of `client_price`.
    pub service_fee: Money,
}

/// A booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique booking id.
    pub id: BookingId,
    /// Who the booking is for.
    pub client: ClientRef,
    /// The hairdresser doing the job. `None` until claimed.
    pub hairdresser_id: Option<HairdresserId>,
    /// The salon, for salon bookings.
    pub salon_id: Option<SalonId>,
    /// Hairdressers allowed to claim the booking while unassigned.
    #[serde(default)]
    pub offered_to: Vec<HairdresserId>,
    /// Requested hairstyle.
    pub hairstyle_id: HairstyleId,
    /// Home or salon.
    pub service_type: ServiceType,
    /// Where the service happens.
    pub location: ServiceLocation,
    /// When the service happens.
    pub scheduled_time: Timestamp,
    /// Expected length in minutes.
    pub estimated_duration_minutes: u32,
    /// What the client pays, minor units.
    pub client_price: Money,
    /// Platform fee, minor units.
    pub service_fee: Money,
    /// Current status.
    pub status: BookingStatus,
    /// Creation time.
    pub created_at: Timestamp,
    /// Set by `start`.
    pub started_at: Option<Timestamp>,
    /// Set by `complete`.
    pub completed_at: Option<Timestamp>,
    /// Set by `cancel`.
    pub cancelled_at: Option<Timestamp>,
    /// Reason given on cancellation.
    pub cancellation_reason: Option<String>,
    /// Client's 1-5 star rating, once completed.
    pub rating: Option<u8>,
    /// Append-only status history.
    #[serde(default)]
    pub transitions: Vec<BookingTransitionRecord>,
}

impl Booking {
    /// A new `pending` booking.
    pub fn pending(draft: BookingDraft, created_at: Timestamp) -> Self {
        Self {
            id: BookingId::new(),
            client: draft.client,
            hairdresser_id: draft.hairdresser_id,
            salon_id: draft.salon_id,
            offered_to: draft.offered_to,
            hairstyle_id: draft.hairstyle_id,
            service_type: draft.service_type,
            location: draft.location,
            scheduled_time: draft.scheduled_time,
            estimated_duration_minutes: draft.estimated_duration_minutes,
            client_price: draft.client_price,
            service_fee: draft.service_fee,
            status: BookingStatus::Pending,
            created_at,
            started_at: None,
            completed_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            rating: None,
            transitions: Vec::new(),
        }
    }

    /// Whether `actor` may see this booking.
    ///
    /// Clients see their own, hairdressers see bookings assigned or offered
    /// to them, admin and system see everything.
    pub fn is_visible_to(&self, actor: &Actor) -> bool {
        match actor.role {
            ActorRole::Admin | ActorRole::System => true,
            ActorRole::Client => self.client.client_id().map(|c| c.0) == Some(actor.id),
            ActorRole::Hairdresser => {
                self.hairdresser_id.map(|h| h.0) == Some(actor.id)
                    || self.offered_to.iter().any(|h| h.0 == actor.id)
            }
        }
    }

    /// Whether the terminal timestamps agree with the status.
    pub fn timestamps_consistent(&self) -> bool {
        let completed = self.status == BookingStatus::Completed;
        let cancelled = self.status == BookingStatus::Cancelled;
        self.completed_at.is_some() == completed && self.cancelled_at.is_some() == cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salonbook_core::Coordinate;

    fn draft(client: ClientRef) -> BookingDraft {
        BookingDraft {
            client,
            hairdresser_id: None,
            salon_id: None,
            offered_to: vec![],
            hairstyle_id: HairstyleId::new(),
            service_type: ServiceType::Home,
            location: ServiceLocation::new("1 Main St", Coordinate::new(0.0, 0.0).unwrap())
                .unwrap(),
            scheduled_time: Timestamp::now(),
            estimated_duration_minutes: 60,
            client_price: Money::new(5_000).unwrap(),
            service_fee: Money::new(500).unwrap(),
        }
    }

    #[test]
    fn status_names_roundtrip() {
        for s in BookingStatus::ALL {
            assert_eq!(BookingStatus::from_name(s.as_str()), Some(s));
            let json = serde_json::to_string(&s).unwrap();
            assert_eq!(json, format!("\"{}\"", s.as_str()));
        }
        assert_eq!(BookingStatus::from_name("done"), None);
    }

    #[test]
    fn terminal_states() {
        let terminal: Vec<_> = BookingStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            vec![
                BookingStatus::Completed,
                BookingStatus::Cancelled,
                BookingStatus::Rejected
            ]
        );
    }

    #[test]
    fn new_booking_is_pending_and_consistent() {
        let b = Booking::pending(
            draft(ClientRef::Registered {
                client_id: ClientId::new(),
            }),
            Timestamp::now(),
        );
        assert_eq!(b.status, BookingStatus::Pending);
        assert!(b.timestamps_consistent());
        assert!(b.transitions.is_empty());
    }

    #[test]
    fn visibility() {
        let client = ClientId::new();
        let offered = HairdresserId::new();
        let mut d = draft(ClientRef::Registered { client_id: client });
        d.offered_to = vec![offered];
        let b = Booking::pending(d, Timestamp::now());

        assert!(b.is_visible_to(&Actor::client(client)));
        assert!(!b.is_visible_to(&Actor::client(ClientId::new())));
        assert!(b.is_visible_to(&Actor::hairdresser(offered)));
        assert!(!b.is_visible_to(&Actor::hairdresser(HairdresserId::new())));
        assert!(b.is_visible_to(&Actor::admin(uuid::Uuid::new_v4())));
    }

    #[test]
    fn guest_requires_name_and_phone() {
        let ok = ClientRef::Guest {
            name: "Ana".into(),
            phone: "+351 900 000 000".into(),
        };
        assert!(ok.validate().is_ok());
        let bad = ClientRef::Guest {
            name: " ".into(),
            phone: "1".into(),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn client_ref_is_tagged() {
        let json = serde_json::to_value(ClientRef::Guest {
            name: "Ana".into(),
            phone: "1".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "guest");
    }
}
