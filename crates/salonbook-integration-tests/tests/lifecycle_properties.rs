//! # Lifecycle Properties
//!
//! Drives bookings through random (event, actor) sequences and checks that
//! the planner keeps the booking record self-consistent.

use chrono::Duration;
use proptest::prelude::*;
use uuid::Uuid;

use salonbook_core::{
    ClientId, Coordinate, HairdresserId, HairstyleId, Money, ServiceLocation, Timestamp,
};
use salonbook_state::{
    Actor, Booking, BookingDraft, BookingEvent, BookingStateMachine, BookingStatus, ClientRef,
    ServiceType, TransitionError,
};

/// Who issues a step, relative to the booking under test.
#[derive(Debug, Clone, Copy)]
enum Caller {
    OwnClient,
    OtherClient,
    AssignedHairdresser,
    OtherHairdresser,
    Admin,
    System,
}

struct Parties {
    client: ClientId,
    hairdresser: HairdresserId,
}

impl Caller {
    fn actor(self, parties: &Parties) -> Actor {
        match self {
            Self::OwnClient => Actor::client(parties.client),
            Self::OtherClient => Actor::client(ClientId::new()),
            Self::AssignedHairdresser => Actor::hairdresser(parties.hairdresser),
            Self::OtherHairdresser => Actor::hairdresser(HairdresserId::new()),
            Self::Admin => Actor::admin(Uuid::new_v4()),
            Self::System => Actor::system(),
        }
    }
}

fn caller() -> impl Strategy<Value = Caller> {
    prop_oneof![
        Just(Caller::OwnClient),
        Just(Caller::OtherClient),
        Just(Caller::AssignedHairdresser),
        Just(Caller::OtherHairdresser),
        Just(Caller::Admin),
        Just(Caller::System),
    ]
}

fn event() -> impl Strategy<Value = BookingEvent> {
    prop::sample::select(BookingEvent::ALL.to_vec())
}

/// A pending booking, either assigned up front or offered to one hairdresser.
fn pending(parties: &Parties, offered: bool, created_at: Timestamp) -> Booking {
    let (hairdresser_id, offered_to) = if offered {
        (None, vec![parties.hairdresser])
    } else {
        (Some(parties.hairdresser), vec![])
    };
    Booking::pending(
        BookingDraft {
            client: ClientRef::Registered {
                client_id: parties.client,
            },
            hairdresser_id,
            salon_id: None,
            offered_to,
            hairstyle_id: HairstyleId::new(),
            service_type: ServiceType::Home,
            location: ServiceLocation::new(
                "Avenida da Liberdade 1",
                Coordinate::new(38.72, -9.14).unwrap(),
            )
            .unwrap(),
            scheduled_time: created_at.shifted(Duration::days(1)),
            estimated_duration_minutes: 60,
            client_price: Money::new(5_000).unwrap(),
            service_fee: Money::new(500).unwrap(),
        },
        created_at,
    )
}

proptest! {
    /// Every committed step leaves status, history and timestamps in agreement.
    #[test]
    fn random_walks_keep_the_record_consistent(
        offered in any::<bool>(),
        steps in prop::collection::vec((event(), caller()), 0..24),
    ) {
        let parties = Parties { client: ClientId::new(), hairdresser: HairdresserId::new() };
        let start = Timestamp::now();
        let mut booking = pending(&parties, offered, start);
        let mut applied = 0usize;
        let mut visited_in_progress = false;

        for (i, (event, who)) in steps.into_iter().enumerate() {
            let actor = who.actor(&parties);
            let now = start.shifted(Duration::minutes(i as i64 + 1));
            let before = booking.clone();

            match BookingStateMachine::plan(&booking, &actor, event, Some("changed plans".into()), now) {
                Ok(update) => {
                    prop_assert_eq!(update.from, booking.status);
                    update.apply(&mut booking);
                    applied += 1;
                    prop_assert_eq!(booking.status, update.to);
                    if booking.status == BookingStatus::InProgress {
                        visited_in_progress = true;
                    }
                }
                Err(TransitionError::InvalidTransition { from, event: rejected }) => {
                    prop_assert_eq!(from, booking.status);
                    prop_assert_eq!(rejected, event);
                    prop_assert!(BookingStateMachine::rule(from, event).is_none());
                    prop_assert_eq!(&booking, &before);
                }
                Err(TransitionError::Forbidden { role, .. }) => {
                    prop_assert_eq!(role, actor.role);
                    prop_assert_eq!(&booking, &before);
                }
            }

            prop_assert_eq!(booking.transitions.len(), applied);
            prop_assert!(booking.timestamps_consistent());
            if let Some(last) = booking.transitions.last() {
                prop_assert_eq!(last.to, booking.status);
            }
        }

        prop_assert_eq!(booking.started_at.is_some(), visited_in_progress);
        if matches!(
            booking.status,
            BookingStatus::Confirmed | BookingStatus::InProgress | BookingStatus::Completed
        ) {
            prop_assert_eq!(booking.hairdresser_id, Some(parties.hairdresser));
        }
    }

    /// Nothing leaves a terminal status, whoever asks.
    #[test]
    fn terminal_statuses_reject_every_event(
        terminal in prop::sample::select(vec![
            BookingStatus::Completed,
            BookingStatus::Cancelled,
            BookingStatus::Rejected,
        ]),
        event in event(),
        who in caller(),
    ) {
        let parties = Parties { client: ClientId::new(), hairdresser: HairdresserId::new() };
        let now = Timestamp::now();
        let mut booking = pending(&parties, false, now);
        booking.status = terminal;

        let err = BookingStateMachine::plan(&booking, &who.actor(&parties), event, None, now)
            .unwrap_err();
        prop_assert_eq!(
            err,
            TransitionError::InvalidTransition { from: terminal, event }
        );
    }
}
