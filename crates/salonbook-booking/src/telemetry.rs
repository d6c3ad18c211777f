//! Metric names and recording helpers. Recording is a no-op until the
//! binary installs a recorder.

use salonbook_state::{BookingEvent, BookingStatus, ServiceType};

/// Committed status changes, labelled by event and target status.
pub const BOOKING_TRANSITIONS_TOTAL: &str = "salonbook_booking_transitions_total";
/// Compare-and-swap losses.
pub const BOOKING_CONFLICTS_TOTAL: &str = "salonbook_booking_conflicts_total";
/// Bookings created, labelled by service type.
pub const BOOKINGS_CREATED_TOTAL: &str = "salonbook_bookings_created_total";
/// Candidate searches, labelled by service type.
pub const CANDIDATE_SEARCHES_TOTAL: &str = "salonbook_candidate_searches_total";
/// Bookings cancelled by the expiry sweep.
pub const EXPIRED_BOOKINGS_TOTAL: &str = "salonbook_expired_bookings_total";

pub(crate) fn record_transition(event: BookingEvent, to: BookingStatus) {
    metrics::counter!(
        BOOKING_TRANSITIONS_TOTAL,
        "event" => event.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
}

pub(crate) fn record_conflict(event: BookingEvent) {
    metrics::counter!(BOOKING_CONFLICTS_TOTAL, "event" => event.as_str()).increment(1);
}

pub(crate) fn record_created(service_type: ServiceType) {
    metrics::counter!(BOOKINGS_CREATED_TOTAL, "service_type" => service_type.as_str())
        .increment(1);
}

pub(crate) fn record_search(service_type: ServiceType) {
    metrics::counter!(CANDIDATE_SEARCHES_TOTAL, "service_type" => service_type.as_str())
        .increment(1);
}

pub(crate) fn record_expired(count: u64) {
    metrics::counter!(EXPIRED_BOOKINGS_TOTAL).increment(count);
}
