//! # Booking State Machine
//!
//! The transition table and the planner that checks a requested event
//! against it.
//!
//! ## Transition table
//!
//! | From | Event | Roles | To |
//! |---|---|---|---|
//! | pending | accept | hairdresser | confirmed |
//! | pending | reject | hairdresser | rejected |
//! | pending | cancel | client, system | cancelled |
//! | confirmed | start | hairdresser | in_progress |
//! | confirmed | cancel | client, hairdresser, system | cancelled |
//! | in_progress | complete | hairdresser | completed |
//! | in_progress | cancel | hairdresser, admin | cancelled |
//!
//! A reject on an unassigned booking only withdraws that hairdresser's
//! offer. The booking stays `pending` for the remaining candidates and
//! becomes `rejected` once nobody is left.
//!
//! Anything else is [`TransitionError::InvalidTransition`], including a
//! repeat of an event that already succeeded. A pair that is in the table
//! but requested by the wrong role, or by a hairdresser or client who is not
//! party to the booking, is [`TransitionError::Forbidden`].
//!
//! ## Planning vs applying
//!
//! [`BookingStateMachine::plan`] borrows the booking immutably and returns a
//! [`StatusUpdate`]. Nothing changes until the repository applies that
//! update under a compare-and-swap on [`StatusUpdate::from`], together with
//! any [`JobSlotChange`] on the hairdresser.

use serde::{Deserialize, Serialize};

use salonbook_core::{BookingId, HairdresserId, Timestamp};

use crate::actor::{Actor, ActorRole};
use crate::booking::{Booking, BookingStatus, BookingTransitionRecord};
use crate::error::TransitionError;

/// An event requested against a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingEvent {
    /// Hairdresser takes the booking.
    Accept,
    /// Hairdresser declines the booking.
    Reject,
    /// Hairdresser begins the job.
    Start,
    /// Hairdresser finishes the job.
    Complete,
    /// A participant calls the booking off.
    Cancel,
}

impl BookingEvent {
    /// Every event.
    pub const ALL: [BookingEvent; 5] = [
        BookingEvent::Accept,
        BookingEvent::Reject,
        BookingEvent::Start,
        BookingEvent::Complete,
        BookingEvent::Cancel,
    ];

    /// The canonical string name of this event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
        }
    }

    /// Parse a canonical event name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == name)
    }
}

impl std::fmt::Display for BookingEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    /// Required current status.
    pub from: BookingStatus,
    /// Requested event.
    pub event: BookingEvent,
    /// Resulting status.
    pub to: BookingStatus,
    /// Roles allowed to request it.
    pub roles: &'static [ActorRole],
}

/// The complete booking transition table.
pub const TRANSITION_TABLE: &[TransitionRule] = &[
    TransitionRule {
        from: BookingStatus::Pending,
        event: BookingEvent::Accept,
        to: BookingStatus::Confirmed,
        roles: &[ActorRole::Hairdresser],
    },
    TransitionRule {
        from: BookingStatus::Pending,
        event: BookingEvent::Reject,
        to: BookingStatus::Rejected,
        roles: &[ActorRole::Hairdresser],
    },
    TransitionRule {
        from: BookingStatus::Pending,
        event: BookingEvent::Cancel,
        to: BookingStatus::Cancelled,
        roles: &[ActorRole::Client, ActorRole::System],
    },
    TransitionRule {
        from: BookingStatus::Confirmed,
        event: BookingEvent::Start,
        to: BookingStatus::InProgress,
        roles: &[ActorRole::Hairdresser],
    },
    TransitionRule {
        from: BookingStatus::Confirmed,
        event: BookingEvent::Cancel,
        to: BookingStatus::Cancelled,
        roles: &[ActorRole::Client, ActorRole::Hairdresser, ActorRole::System],
    },
    TransitionRule {
        from: BookingStatus::InProgress,
        event: BookingEvent::Complete,
        to: BookingStatus::Completed,
        roles: &[ActorRole::Hairdresser],
    },
    TransitionRule {
        from: BookingStatus::InProgress,
        event: BookingEvent::Cancel,
        to: BookingStatus::Cancelled,
        roles: &[ActorRole::Hairdresser, ActorRole::Admin],
    },
];

impl BookingStatus {
    /// Events with a row leaving this status.
    pub fn valid_events(&self) -> Vec<BookingEvent> {
        TRANSITION_TABLE
            .iter()
            .filter(|r| r.from == *self)
            .map(|r| r.event)
            .collect()
    }

    /// Statuses reachable in one step.
    pub fn valid_transitions(&self) -> Vec<BookingStatus> {
        let mut targets: Vec<BookingStatus> = TRANSITION_TABLE
            .iter()
            .filter(|r| r.from == *self)
            .map(|r| r.to)
            .collect();
        targets.dedup();
        targets
    }
}

/// A change to a hairdresser's job slot, applied atomically with the
/// booking status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "hairdresser_id", rename_all = "snake_case")]
pub enum JobSlotChange {
    /// Set `current_job_id` to this booking. Fails if already occupied.
    Claim(HairdresserId),
    /// Clear `current_job_id`.
    Release(HairdresserId),
    /// Clear `current_job_id` and increment `total_jobs`.
    ReleaseCompleted(HairdresserId),
}

impl JobSlotChange {
    /// The hairdresser whose slot changes.
    pub fn hairdresser_id(&self) -> HairdresserId {
        match self {
            Self::Claim(h) | Self::Release(h) | Self::ReleaseCompleted(h) => *h,
        }
    }
}

/// A planned transition, ready to be written under compare-and-swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// Target booking.
    pub booking_id: BookingId,
    /// Status the booking must still have when the update is written.
    pub from: BookingStatus,
    /// New status.
    pub to: BookingStatus,
    /// The event being applied.
    pub event: BookingEvent,
    /// Claims an unassigned booking for this hairdresser.
    pub assign_hairdresser: Option<HairdresserId>,
    /// Removes this hairdresser from `offered_to` of an unassigned booking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdraw_offer: Option<HairdresserId>,
    /// New `started_at`.
    pub started_at: Option<Timestamp>,
    /// New `completed_at`.
    pub completed_at: Option<Timestamp>,
    /// New `cancelled_at`.
    pub cancelled_at: Option<Timestamp>,
    /// New `cancellation_reason`.
    pub cancellation_reason: Option<String>,
    /// Log entry appended with the change.
    pub record: BookingTransitionRecord,
    /// Hairdresser job-slot change that must commit together.
    pub job_slot: Option<JobSlotChange>,
}

impl StatusUpdate {
    /// Write the planned fields into `booking`.
    ///
    /// Callers check `booking.status == self.from` first; this does not.
    ///
    /// A withdrawal that empties `offered_to` rejects the booking even when
    /// it was planned against a longer list.
    pub fn apply(&self, booking: &mut Booking) {
        booking.status = self.to;
        let mut record = self.record.clone();
        if let Some(h) = self.assign_hairdresser {
            booking.hairdresser_id = Some(h);
            booking.offered_to.clear();
        }
        if let Some(h) = self.withdraw_offer {
            booking.offered_to.retain(|o| *o != h);
            if booking.offered_to.is_empty() {
                booking.status = BookingStatus::Rejected;
                record.to = BookingStatus::Rejected;
            }
        }
        if self.started_at.is_some() {
            booking.started_at = self.started_at;
        }
        if self.completed_at.is_some() {
            booking.completed_at = self.completed_at;
        }
        if self.cancelled_at.is_some() {
            booking.cancelled_at = self.cancelled_at;
            booking.cancellation_reason = self.cancellation_reason.clone();
        }
        booking.transitions.push(record);
    }

    /// Why this update no longer fits `booking`, beyond its status.
    ///
    /// Repositories call this under the same lock as the status check: an
    /// offer claimed or withdrawn since planning cannot be claimed or
    /// withdrawn again.
    pub fn stale_against(&self, booking: &Booking) -> Option<String> {
        let offer = self.assign_hairdresser.or(self.withdraw_offer)?;
        if booking.hairdresser_id.is_some() {
            return Some("booking was already assigned".into());
        }
        if !booking.offered_to.contains(&offer) {
            return Some(format!("{offer} no longer holds an offer"));
        }
        None
    }
}

/// Stateless planner over [`TRANSITION_TABLE`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingStateMachine;

impl BookingStateMachine {
    /// Look up the row for `(from, event)`.
    pub fn rule(from: BookingStatus, event: BookingEvent) -> Option<&'static TransitionRule> {
        TRANSITION_TABLE
            .iter()
            .find(|r| r.from == from && r.event == event)
    }

    /// Plan `event` on `booking` for `actor`.
    ///
    /// `reason` is kept only for cancellations; blank reasons are dropped.
    pub fn plan(
        booking: &Booking,
        actor: &Actor,
        event: BookingEvent,
        reason: Option<String>,
        now: Timestamp,
    ) -> Result<StatusUpdate, TransitionError> {
        let from = booking.status;
        let rule = Self::rule(from, event)
            .ok_or(TransitionError::InvalidTransition { from, event })?;

        if !rule.roles.contains(&actor.role) {
            return Err(forbidden(
                actor,
                event,
                format!("{} cannot {} a {} booking", actor.role, event, from),
            ));
        }
        Self::authorize_party(booking, actor, event)?;

        let reason = match event {
            BookingEvent::Cancel => reason
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
            _ => None,
        };

        let mut update = StatusUpdate {
            booking_id: booking.id,
            from,
            to: rule.to,
            event,
            assign_hairdresser: None,
            withdraw_offer: None,
            started_at: None,
            completed_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            record: BookingTransitionRecord {
                from,
                to: rule.to,
                event,
                actor: *actor,
                at: now,
                reason: reason.clone(),
            },
            job_slot: None,
        };

        match event {
            BookingEvent::Accept => {
                if booking.hairdresser_id.is_none() {
                    update.assign_hairdresser = actor.hairdresser_id();
                }
            }
            BookingEvent::Reject => {
                if booking.hairdresser_id.is_none() {
                    update.withdraw_offer = actor.hairdresser_id();
                    let others = booking
                        .offered_to
                        .iter()
                        .any(|h| Some(*h) != update.withdraw_offer);
                    if others {
                        update.to = BookingStatus::Pending;
                        update.record.to = BookingStatus::Pending;
                    }
                }
            }
            BookingEvent::Start => {
                let hairdresser = assigned(booking, actor, event)?;
                update.started_at = Some(now);
                update.job_slot = Some(JobSlotChange::Claim(hairdresser));
            }
            BookingEvent::Complete => {
                let hairdresser = assigned(booking, actor, event)?;
                update.completed_at = Some(now);
                update.job_slot = Some(JobSlotChange::ReleaseCompleted(hairdresser));
            }
            BookingEvent::Cancel => {
                update.cancelled_at = Some(now);
                update.cancellation_reason = reason;
                if from == BookingStatus::InProgress {
                    update.job_slot = booking.hairdresser_id.map(JobSlotChange::Release);
                }
            }
        }

        Ok(update)
    }

    /// Check that a client or hairdresser is party to the booking.
    fn authorize_party(
        booking: &Booking,
        actor: &Actor,
        event: BookingEvent,
    ) -> Result<(), TransitionError> {
        match actor.role {
            ActorRole::Admin | ActorRole::System => Ok(()),
            ActorRole::Client => {
                if booking.client.client_id().map(|c| c.0) == Some(actor.id) {
                    Ok(())
                } else {
                    Err(forbidden(actor, event, "not the booking's client".into()))
                }
            }
            ActorRole::Hairdresser => match booking.hairdresser_id {
                Some(h) if h.0 == actor.id => Ok(()),
                Some(_) => Err(forbidden(
                    actor,
                    event,
                    "booking is assigned to another hairdresser".into(),
                )),
                None if booking.offered_to.iter().any(|h| h.0 == actor.id) => Ok(()),
                None => Err(forbidden(
                    actor,
                    event,
                    "booking was not offered to this hairdresser".into(),
                )),
            },
        }
    }
}

fn forbidden(actor: &Actor, event: BookingEvent, reason: String) -> TransitionError {
    TransitionError::Forbidden {
        role: actor.role,
        event,
        reason,
    }
}

fn assigned(
    booking: &Booking,
    actor: &Actor,
    event: BookingEvent,
) -> Result<HairdresserId, TransitionError> {
    booking
        .hairdresser_id
        .ok_or_else(|| forbidden(actor, event, "booking has no assigned hairdresser".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::{BookingDraft, ClientRef, ServiceType};
    use salonbook_core::{
        ClientId, Coordinate, HairstyleId, Money, ServiceLocation,
    };
    use uuid::Uuid;

    struct Fixture {
        client: ClientId,
        hairdresser: HairdresserId,
        booking: Booking,
    }

    fn fixture(status: BookingStatus) -> Fixture {
        let client = ClientId::new();
        let hairdresser = HairdresserId::new();
        let mut booking = Booking::pending(
            BookingDraft {
                client: ClientRef::Registered { client_id: client },
                hairdresser_id: Some(hairdresser),
                salon_id: None,
                offered_to: vec![],
                hairstyle_id: HairstyleId::new(),
                service_type: ServiceType::Home,
                location: ServiceLocation::new("1 Main St", Coordinate::new(0.0, 0.0).unwrap())
                    .unwrap(),
                scheduled_time: Timestamp::now(),
                estimated_duration_minutes: 45,
                client_price: Money::new(4_000).unwrap(),
                service_fee: Money::new(400).unwrap(),
            },
            Timestamp::now(),
        );
        booking.status = status;
        Fixture {
            client,
            hairdresser,
            booking,
        }
    }

    fn actor_for(f: &Fixture, role: ActorRole) -> Actor {
        match role {
            ActorRole::Client => Actor::client(f.client),
            ActorRole::Hairdresser => Actor::hairdresser(f.hairdresser),
            ActorRole::Admin => Actor::admin(Uuid::new_v4()),
            ActorRole::System => Actor::system(),
        }
    }

    /// The table as documented, written out independently of
    /// `TRANSITION_TABLE`.
    fn expected(from: BookingStatus, event: BookingEvent) -> Option<(BookingStatus, Vec<ActorRole>)> {
        use ActorRole::*;
        use BookingEvent::*;
        use BookingStatus::*;
        match (from, event) {
            (Pending, Accept) => Some((Confirmed, vec![Hairdresser])),
            (Pending, Reject) => Some((Rejected, vec![Hairdresser])),
            (Pending, Cancel) => Some((Cancelled, vec![Client, System])),
            (Confirmed, Start) => Some((InProgress, vec![Hairdresser])),
            (Confirmed, Cancel) => Some((Cancelled, vec![Client, Hairdresser, System])),
            (InProgress, Complete) => Some((Completed, vec![Hairdresser])),
            (InProgress, Cancel) => Some((Cancelled, vec![Hairdresser, Admin])),
            _ => None,
        }
    }

    #[test]
    fn exhaustive_state_event_role_matrix() {
        for from in BookingStatus::ALL {
            for event in BookingEvent::ALL {
                for role in ActorRole::ALL {
                    let f = fixture(from);
                    let actor = actor_for(&f, role);
                    let result =
                        BookingStateMachine::plan(&f.booking, &actor, event, None, Timestamp::now());
                    match expected(from, event) {
                        None => assert_eq!(
                            result,
                            Err(TransitionError::InvalidTransition { from, event }),
                            "{from} --{event}/{role}--> should be invalid"
                        ),
                        Some((to, roles)) if roles.contains(&role) => {
                            let update = result.unwrap_or_else(|e| {
                                panic!("{from} --{event}/{role}--> failed: {e}")
                            });
                            assert_eq!(update.to, to);
                            assert_eq!(update.from, from);
                        }
                        Some(_) => assert!(
                            matches!(result, Err(TransitionError::Forbidden { .. })),
                            "{from} --{event}/{role}--> should be forbidden, got {result:?}"
                        ),
                    }
                }
            }
        }
    }

    #[test]
    fn terminal_states_have_no_events() {
        for s in BookingStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            assert!(s.valid_events().is_empty());
            assert!(s.valid_transitions().is_empty());
        }
        assert_eq!(
            BookingStatus::Pending.valid_transitions(),
            vec![BookingStatus::Confirmed, BookingStatus::Rejected, BookingStatus::Cancelled]
        );
    }

    #[test]
    fn invalid_transition_takes_precedence_over_forbidden() {
        let f = fixture(BookingStatus::Completed);
        let stranger = Actor::hairdresser(HairdresserId::new());
        assert_eq!(
            BookingStateMachine::plan(&f.booking, &stranger, BookingEvent::Accept, None, Timestamp::now()),
            Err(TransitionError::InvalidTransition {
                from: BookingStatus::Completed,
                event: BookingEvent::Accept
            })
        );
    }

    #[test]
    fn other_hairdresser_is_forbidden() {
        let f = fixture(BookingStatus::Confirmed);
        let other = Actor::hairdresser(HairdresserId::new());
        let result =
            BookingStateMachine::plan(&f.booking, &other, BookingEvent::Start, None, Timestamp::now());
        assert!(matches!(result, Err(TransitionError::Forbidden { .. })));
    }

    #[test]
    fn other_client_is_forbidden() {
        let f = fixture(BookingStatus::Pending);
        let other = Actor::client(ClientId::new());
        let result = BookingStateMachine::plan(
            &f.booking,
            &other,
            BookingEvent::Cancel,
            Some("changed my mind".into()),
            Timestamp::now(),
        );
        assert!(matches!(result, Err(TransitionError::Forbidden { .. })));
    }

    #[test]
    fn unassigned_booking_claimable_only_by_offered() {
        let mut f = fixture(BookingStatus::Pending);
        let offered = HairdresserId::new();
        f.booking.hairdresser_id = None;
        f.booking.offered_to = vec![offered];

        let stranger = Actor::hairdresser(f.hairdresser);
        assert!(matches!(
            BookingStateMachine::plan(&f.booking, &stranger, BookingEvent::Accept, None, Timestamp::now()),
            Err(TransitionError::Forbidden { .. })
        ));

        let update = BookingStateMachine::plan(
            &f.booking,
            &Actor::hairdresser(offered),
            BookingEvent::Accept,
            None,
            Timestamp::now(),
        )
        .unwrap();
        assert_eq!(update.assign_hairdresser, Some(offered));

        let mut booking = f.booking.clone();
        update.apply(&mut booking);
        assert_eq!(booking.hairdresser_id, Some(offered));
        assert!(booking.offered_to.is_empty());
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    fn offered(to: &[HairdresserId]) -> Booking {
        let mut booking = fixture(BookingStatus::Pending).booking;
        booking.hairdresser_id = None;
        booking.offered_to = to.to_vec();
        booking
    }

    #[test]
    fn decline_withdraws_one_offer() {
        let (near, far) = (HairdresserId::new(), HairdresserId::new());
        let mut booking = offered(&[near, far]);

        let update = BookingStateMachine::plan(
            &booking,
            &Actor::hairdresser(far),
            BookingEvent::Reject,
            None,
            Timestamp::now(),
        )
        .unwrap();
        assert_eq!(update.to, BookingStatus::Pending);
        assert_eq!(update.withdraw_offer, Some(far));
        assert_eq!(update.stale_against(&booking), None);

        update.apply(&mut booking);
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.offered_to, vec![near]);
        assert_eq!(booking.transitions.last().map(|t| t.to), Some(BookingStatus::Pending));

        assert!(update.stale_against(&booking).is_some());
        assert!(matches!(
            BookingStateMachine::plan(&booking, &Actor::hairdresser(far), BookingEvent::Accept, None, Timestamp::now()),
            Err(TransitionError::Forbidden { .. })
        ));
        let accept = BookingStateMachine::plan(
            &booking,
            &Actor::hairdresser(near),
            BookingEvent::Accept,
            None,
            Timestamp::now(),
        )
        .unwrap();
        accept.apply(&mut booking);
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.hairdresser_id, Some(near));
    }

    #[test]
    fn last_decline_rejects() {
        let only = HairdresserId::new();
        let mut booking = offered(&[only]);
        let update = BookingStateMachine::plan(
            &booking,
            &Actor::hairdresser(only),
            BookingEvent::Reject,
            None,
            Timestamp::now(),
        )
        .unwrap();
        assert_eq!(update.to, BookingStatus::Rejected);
        update.apply(&mut booking);
        assert_eq!(booking.status, BookingStatus::Rejected);
        assert!(booking.offered_to.is_empty());
    }

    #[test]
    fn overlapping_declines_reject_once_the_list_is_empty() {
        let (a, b) = (HairdresserId::new(), HairdresserId::new());
        let mut booking = offered(&[a, b]);
        let now = Timestamp::now();
        let from_a =
            BookingStateMachine::plan(&booking, &Actor::hairdresser(a), BookingEvent::Reject, None, now)
                .unwrap();
        let from_b =
            BookingStateMachine::plan(&booking, &Actor::hairdresser(b), BookingEvent::Reject, None, now)
                .unwrap();
        assert_eq!(from_a.to, BookingStatus::Pending);
        assert_eq!(from_b.to, BookingStatus::Pending);

        from_a.apply(&mut booking);
        assert_eq!(from_b.stale_against(&booking), None);
        from_b.apply(&mut booking);
        assert_eq!(booking.status, BookingStatus::Rejected);
        assert_eq!(booking.transitions.last().map(|t| t.to), Some(BookingStatus::Rejected));
    }

    #[test]
    fn assigned_hairdresser_decline_rejects() {
        let f = fixture(BookingStatus::Pending);
        let update = BookingStateMachine::plan(
            &f.booking,
            &Actor::hairdresser(f.hairdresser),
            BookingEvent::Reject,
            None,
            Timestamp::now(),
        )
        .unwrap();
        assert_eq!(update.to, BookingStatus::Rejected);
        assert_eq!(update.withdraw_offer, None);
    }

    #[test]
    fn start_claims_slot_and_complete_releases() {
        let f = fixture(BookingStatus::Confirmed);
        let actor = Actor::hairdresser(f.hairdresser);
        let now = Timestamp::now();
        let start = BookingStateMachine::plan(&f.booking, &actor, BookingEvent::Start, None, now).unwrap();
        assert_eq!(start.job_slot, Some(JobSlotChange::Claim(f.hairdresser)));
        assert_eq!(start.started_at, Some(now));

        let mut booking = f.booking.clone();
        start.apply(&mut booking);
        let complete =
            BookingStateMachine::plan(&booking, &actor, BookingEvent::Complete, None, now).unwrap();
        assert_eq!(
            complete.job_slot,
            Some(JobSlotChange::ReleaseCompleted(f.hairdresser))
        );
        complete.apply(&mut booking);
        assert_eq!(booking.status, BookingStatus::Completed);
        assert!(booking.timestamps_consistent());
        assert_eq!(booking.transitions.len(), 2);
    }

    #[test]
    fn cancel_in_progress_releases_slot() {
        let f = fixture(BookingStatus::InProgress);
        let update = BookingStateMachine::plan(
            &f.booking,
            &Actor::admin(Uuid::new_v4()),
            BookingEvent::Cancel,
            Some("  no show  ".into()),
            Timestamp::now(),
        )
        .unwrap();
        assert_eq!(update.job_slot, Some(JobSlotChange::Release(f.hairdresser)));
        assert_eq!(update.cancellation_reason.as_deref(), Some("no show"));

        let mut booking = f.booking.clone();
        update.apply(&mut booking);
        assert!(booking.timestamps_consistent());
        assert_eq!(booking.cancellation_reason.as_deref(), Some("no show"));
    }

    #[test]
    fn cancel_before_start_touches_no_slot() {
        let f = fixture(BookingStatus::Confirmed);
        let update = BookingStateMachine::plan(
            &f.booking,
            &Actor::client(f.client),
            BookingEvent::Cancel,
            Some("   ".into()),
            Timestamp::now(),
        )
        .unwrap();
        assert_eq!(update.job_slot, None);
        assert_eq!(update.cancellation_reason, None);
    }

    #[test]
    fn event_names_roundtrip() {
        for e in BookingEvent::ALL {
            assert_eq!(BookingEvent::from_name(e.as_str()), Some(e));
        }
    }
}
