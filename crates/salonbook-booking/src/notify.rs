//! # Notifications
//!
//! The outbound seam to push delivery. [`crate::BookingService`] calls the
//! [`Notifier`] on a detached task after each committed change; a failure
//! is logged and never reaches the booking caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use salonbook_core::{BookingId, ClientId, HairdresserId, Timestamp};
use salonbook_state::{Booking, BookingEvent, BookingStatus};

/// Delivery failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// What happened to a booking, and who should hear about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingNotification {
    /// The booking.
    pub booking_id: BookingId,
    /// Status before the change; `None` on creation.
    pub previous_status: Option<BookingStatus>,
    /// Status after the change.
    pub status: BookingStatus,
    /// Event applied; `None` on creation.
    pub event: Option<BookingEvent>,
    /// Registered client to notify.
    pub client_id: Option<ClientId>,
    /// Hairdressers to notify: the assignee, or everyone offered.
    pub hairdresser_ids: Vec<HairdresserId>,
    /// Cancellation reason, when cancelled.
    pub reason: Option<String>,
    /// When the change committed.
    pub at: Timestamp,
}

impl BookingNotification {
    /// Notification for a newly created booking.
    pub fn created(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            previous_status: None,
            status: booking.status,
            event: None,
            client_id: booking.client.client_id(),
            hairdresser_ids: recipients(booking),
            reason: None,
            at: booking.created_at,
        }
    }

    /// Notification for the most recent transition of `booking`.
    pub fn transitioned(booking: &Booking) -> Option<Self> {
        let record = booking.transitions.last()?;
        Some(Self {
            booking_id: booking.id,
            previous_status: Some(record.from),
            status: record.to,
            event: Some(record.event),
            client_id: booking.client.client_id(),
            hairdresser_ids: recipients(booking),
            reason: record.reason.clone(),
            at: record.at,
        })
    }
}

fn recipients(booking: &Booking) -> Vec<HairdresserId> {
    match booking.hairdresser_id {
        Some(h) => vec![h],
        None => booking.offered_to.clone(),
    }
}

/// Push-delivery collaborator.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification. Best-effort.
    async fn notify(&self, notification: &BookingNotification) -> Result<(), NotifyError>;
}

/// Logs notifications instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, n: &BookingNotification) -> Result<(), NotifyError> {
        tracing::info!(
            booking_id = %n.booking_id,
            status = %n.status,
            event = n.event.map(|e| e.as_str()),
            recipients = n.hairdresser_ids.len() + usize::from(n.client_id.is_some()),
            "booking notification"
        );
        Ok(())
    }
}
