//! # Booking Service
//!
//! The externally visible booking operations. Each one reads what it needs,
//! asks [`BookingStateMachine`] for a plan, and writes the plan through
//! [`BookingRepository::update_status`]. Business conditions come back as
//! [`BookingError`] values; nothing here panics on caller input.
//!
//! ## Assignment
//!
//! - Salon bookings go to the salon's owner, at the salon's address.
//! - Home bookings with an explicit hairdresser are assigned at creation.
//! - Other home bookings are offered to every hairdresser the locator
//!   returns. The first offered hairdresser to accept wins the status
//!   compare-and-swap; later accepts get [`BookingError::Conflict`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use salonbook_core::{
    BookingId, HairdresserId, HairstyleId, Money, SalonId, ServiceLocation, Timestamp,
    ValidationError,
};
use salonbook_state::{
    Actor, ActorRole, Booking, BookingDraft, BookingEvent, BookingStateMachine, BookingStatus,
    ClientRef, ServiceType,
};

use crate::config::BookingConfig;
use crate::context::OpContext;
use crate::error::{BookingError, RepositoryError};
use crate::locator::{Candidate, CandidateLocator, CandidateQuery};
use crate::notify::{BookingNotification, Notifier};
use crate::repository::{BookingQuery, BookingRepository, Page, SortOrder};
use crate::telemetry;

/// Longest accepted job, in minutes.
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;
/// Longest accepted cancellation reason, in characters.
pub const MAX_REASON_CHARS: usize = 500;
/// Page size when the caller gives none.
pub const DEFAULT_PAGE_LIMIT: usize = 20;
/// Largest page size.
pub const MAX_PAGE_LIMIT: usize = 100;

/// A hairdresser's answer to a pending booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseDecision {
    /// Take the booking.
    Accept,
    /// Decline it.
    Reject,
}

impl ResponseDecision {
    fn event(self) -> BookingEvent {
        match self {
            Self::Accept => BookingEvent::Accept,
            Self::Reject => BookingEvent::Reject,
        }
    }
}

/// Input to [`BookingService::create_booking`].
#[derive(Debug, Clone, PartialEq)]
pub struct CreateBookingRequest {
    /// Who the booking is for.
    pub client: ClientRef,
    /// Home or salon.
    pub service_type: ServiceType,
    /// Requested hairstyle.
    pub hairstyle_id: HairstyleId,
    /// When the service happens.
    pub scheduled_time: Timestamp,
    /// Expected length in minutes.
    pub estimated_duration_minutes: u32,
    /// Price agreed with the client.
    pub client_price: Money,
    /// Where a home service happens. Ignored for salon bookings.
    pub location: Option<ServiceLocation>,
    /// Target salon. Required for salon bookings.
    pub salon_id: Option<SalonId>,
    /// Explicitly chosen hairdresser.
    pub hairdresser_id: Option<HairdresserId>,
}

/// Input to [`BookingService::list_bookings_for_actor`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListBookingsRequest {
    /// Whose bookings. Defaults to the caller.
    pub actor_id: Option<Uuid>,
    /// In which role. Defaults to the caller's.
    pub role: Option<ActorRole>,
    /// Only this status.
    pub status: Option<BookingStatus>,
    /// Items to skip.
    pub offset: Option<usize>,
    /// Page size.
    pub limit: Option<usize>,
    /// Sort on `scheduled_time`. Defaults to latest first.
    pub order: Option<SortOrder>,
}

/// Booking lifecycle operations.
#[derive(Clone)]
pub struct BookingService {
    repo: Arc<dyn BookingRepository>,
    locator: CandidateLocator,
    notifier: Arc<dyn Notifier>,
    config: Arc<BookingConfig>,
}

impl BookingService {
    /// A service over `repo`, notifying through `notifier`.
    pub fn new(
        repo: Arc<dyn BookingRepository>,
        notifier: Arc<dyn Notifier>,
        config: Arc<BookingConfig>,
    ) -> Self {
        let locator = CandidateLocator::new(Arc::clone(&repo), Arc::clone(&config));
        Self {
            repo,
            locator,
            notifier,
            config,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    /// The underlying repository.
    pub fn repository(&self) -> &Arc<dyn BookingRepository> {
        &self.repo
    }

    /// A fresh context with the configured repository timeout.
    pub fn context(&self) -> OpContext {
        OpContext::new(self.config.repository_timeout)
    }

    /// Proximity search. Read-only.
    pub async fn find_candidates(
        &self,
        ctx: &OpContext,
        query: &CandidateQuery,
    ) -> Result<Vec<Candidate>, BookingError> {
        self.locator.find_candidates(ctx, query).await
    }

    /// Validate `req`, resolve who the booking goes to, and store it as
    /// `pending`.
    pub async fn create_booking(
        &self,
        ctx: &OpContext,
        actor: &Actor,
        req: CreateBookingRequest,
    ) -> Result<Booking, BookingError> {
        authorize_create(actor, &req.client)?;
        req.client.validate()?;
        if req.estimated_duration_minutes == 0 || req.estimated_duration_minutes > MAX_DURATION_MINUTES {
            return Err(ValidationError::OutOfRange {
                field: "estimated_duration_minutes",
                value: i64::from(req.estimated_duration_minutes),
                min: 1,
                max: i64::from(MAX_DURATION_MINUTES),
            }
            .into());
        }
        let now = Timestamp::now();
        let earliest = now.shifted(self.config.min_lead_time);
        if req.scheduled_time <= earliest {
            return Err(BookingError::Validation(format!(
                "scheduled_time must be after {earliest} ({} minutes from now)",
                self.config.min_lead_time.num_minutes()
            )));
        }

        let target = match req.service_type {
            ServiceType::Salon => self.resolve_salon(ctx, &req).await?,
            ServiceType::Home => self.resolve_home(ctx, &req).await?,
        };

        if actor.role == ActorRole::Hairdresser && target.hairdresser_id.map(|h| h.0) != Some(actor.id) {
            return Err(BookingError::Forbidden(
                "hairdressers may only book guests for themselves".into(),
            ));
        }

        let booking = Booking::pending(
            BookingDraft {
                client: req.client,
                hairdresser_id: target.hairdresser_id,
                salon_id: target.salon_id,
                offered_to: target.offered_to,
                hairstyle_id: req.hairstyle_id,
                service_type: req.service_type,
                location: target.location,
                scheduled_time: req.scheduled_time,
                estimated_duration_minutes: req.estimated_duration_minutes,
                client_price: req.client_price,
                service_fee: req.client_price.basis_points(self.config.service_fee_bps),
            },
            now,
        );
        let booking = ctx.run(self.repo.create(booking)).await?;

        tracing::info!(
            booking_id = %booking.id,
            service_type = %booking.service_type,
            assigned = booking.hairdresser_id.is_some(),
            offered = booking.offered_to.len(),
            "booking created"
        );
        telemetry::record_created(booking.service_type);
        self.dispatch(BookingNotification::created(&booking));
        Ok(booking)
    }

    async fn resolve_salon(
        &self,
        ctx: &OpContext,
        req: &CreateBookingRequest,
    ) -> Result<Target, BookingError> {
        let salon_id = req
            .salon_id
            .ok_or_else(|| BookingError::Validation("salon bookings require salon_id".into()))?;
        let salon = ctx.run(self.repo.get_salon(salon_id)).await?;
        if !salon.validated {
            return Err(BookingError::Validation(format!(
                "{salon_id} is not validated"
            )));
        }
        if let Some(h) = req.hairdresser_id {
            if h != salon.owner {
                return Err(BookingError::Validation(format!(
                    "{h} does not work at {salon_id}"
                )));
            }
        }
        Ok(Target {
            hairdresser_id: Some(salon.owner),
            salon_id: Some(salon.id),
            offered_to: Vec::new(),
            location: salon.location,
        })
    }

    async fn resolve_home(
        &self,
        ctx: &OpContext,
        req: &CreateBookingRequest,
    ) -> Result<Target, BookingError> {
        if req.salon_id.is_some() {
            return Err(BookingError::Validation(
                "home bookings must not name a salon".into(),
            ));
        }
        let location = req
            .location
            .clone()
            .ok_or_else(|| BookingError::Validation("home bookings require a location".into()))?;

        if let Some(h) = req.hairdresser_id {
            let hairdresser = ctx.run(self.repo.get_hairdresser(h)).await?;
            if !hairdresser.is_available {
                return Err(BookingError::Validation(format!("{h} is not available")));
            }
            return Ok(Target {
                hairdresser_id: Some(h),
                salon_id: None,
                offered_to: Vec::new(),
                location,
            });
        }

        let query = CandidateQuery {
            origin: location.coordinate(),
            service_type: ServiceType::Home,
            radius_km: None,
            limit: None,
        };
        let candidates = self.locator.find_candidates(ctx, &query).await?;
        if candidates.is_empty() {
            return Err(BookingError::NoCandidatesFound {
                radius_km: self.config.default_radius_km,
            });
        }
        Ok(Target {
            hairdresser_id: None,
            salon_id: None,
            offered_to: candidates.into_iter().map(|c| c.hairdresser_id).collect(),
            location,
        })
    }

    /// Accept or reject a pending booking.
    pub async fn respond_to_booking(
        &self,
        ctx: &OpContext,
        actor: &Actor,
        id: BookingId,
        decision: ResponseDecision,
    ) -> Result<Booking, BookingError> {
        self.transition(ctx, actor, id, decision.event(), None).await
    }

    /// Begin a confirmed booking. Claims the hairdresser's job slot.
    pub async fn start_booking(
        &self,
        ctx: &OpContext,
        actor: &Actor,
        id: BookingId,
    ) -> Result<Booking, BookingError> {
        self.transition(ctx, actor, id, BookingEvent::Start, None).await
    }

    /// Finish an in-progress booking. Frees the job slot.
    pub async fn complete_booking(
        &self,
        ctx: &OpContext,
        actor: &Actor,
        id: BookingId,
    ) -> Result<Booking, BookingError> {
        self.transition(ctx, actor, id, BookingEvent::Complete, None).await
    }

    /// Cancel a booking.
    pub async fn cancel_booking(
        &self,
        ctx: &OpContext,
        actor: &Actor,
        id: BookingId,
        reason: Option<String>,
    ) -> Result<Booking, BookingError> {
        if let Some(r) = &reason {
            let chars = r.chars().count();
            if chars > MAX_REASON_CHARS {
                return Err(ValidationError::OutOfRange {
                    field: "reason length",
                    value: chars as i64,
                    min: 0,
                    max: MAX_REASON_CHARS as i64,
                }
                .into());
            }
        }
        self.transition(ctx, actor, id, BookingEvent::Cancel, reason).await
    }

    /// A booking, if `actor` may see it.
    pub async fn get_booking(
        &self,
        ctx: &OpContext,
        actor: &Actor,
        id: BookingId,
    ) -> Result<Booking, BookingError> {
        let booking = ctx.run(self.repo.get_by_id(id)).await?;
        if !booking.is_visible_to(actor) {
            return Err(BookingError::Forbidden(format!("{actor} may not view {id}")));
        }
        Ok(booking)
    }

    /// Bookings of an actor, latest `scheduled_time` first by default.
    ///
    /// Callers list their own bookings; admins may list anyone's.
    pub async fn list_bookings_for_actor(
        &self,
        ctx: &OpContext,
        caller: &Actor,
        req: ListBookingsRequest,
    ) -> Result<Page<Booking>, BookingError> {
        let target = Actor::new(
            req.actor_id.unwrap_or(caller.id),
            req.role.unwrap_or(caller.role),
        );
        if target != *caller && caller.role != ActorRole::Admin {
            return Err(BookingError::Forbidden(format!(
                "{caller} may not list bookings of {target}"
            )));
        }
        let query = BookingQuery {
            actor: target,
            status: req.status,
            offset: req.offset.unwrap_or(0),
            limit: req.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
            order: req.order.unwrap_or_default(),
        };
        Ok(ctx.run(self.repo.list_by_actor(&query)).await?)
    }

    /// Rate a completed booking, once, as its client.
    pub async fn rate_booking(
        &self,
        ctx: &OpContext,
        actor: &Actor,
        id: BookingId,
        stars: u8,
    ) -> Result<Booking, BookingError> {
        if !(1..=5).contains(&stars) {
            return Err(ValidationError::OutOfRange {
                field: "stars",
                value: i64::from(stars),
                min: 1,
                max: 5,
            }
            .into());
        }
        let booking = ctx.run(self.repo.get_by_id(id)).await?;
        match (actor.client_id(), booking.client.client_id()) {
            (Some(a), Some(b)) if a == b => {}
            _ => {
                return Err(BookingError::Forbidden(
                    "only the booking's client may rate it".into(),
                ))
            }
        }
        if booking.status != BookingStatus::Completed {
            return Err(BookingError::Validation(format!(
                "only completed bookings can be rated, {id} is {}",
                booking.status
            )));
        }
        if booking.rating.is_some() {
            return Err(BookingError::Conflict("booking already rated".into()));
        }
        let rated = ctx.run(self.repo.record_rating(id, stars)).await?;
        tracing::info!(booking_id = %id, stars, "booking rated");
        Ok(rated)
    }

    async fn transition(
        &self,
        ctx: &OpContext,
        actor: &Actor,
        id: BookingId,
        event: BookingEvent,
        reason: Option<String>,
    ) -> Result<Booking, BookingError> {
        let booking = ctx.run(self.repo.get_by_id(id)).await?;
        self.apply_event(ctx, actor, &booking, event, reason).await
    }

    /// Plan `event` against a snapshot and write it under compare-and-swap.
    pub(crate) async fn apply_event(
        &self,
        ctx: &OpContext,
        actor: &Actor,
        snapshot: &Booking,
        event: BookingEvent,
        reason: Option<String>,
    ) -> Result<Booking, BookingError> {
        let update = BookingStateMachine::plan(snapshot, actor, event, reason, Timestamp::now())?;

        match ctx.run(self.repo.update_status(&update)).await {
            Ok(booking) => {
                tracing::info!(
                    booking_id = %booking.id,
                    from = %update.from,
                    to = %booking.status,
                    event = %event,
                    actor = %actor,
                    "booking transition"
                );
                telemetry::record_transition(event, booking.status);
                if let Some(n) = BookingNotification::transitioned(&booking) {
                    self.dispatch(n);
                }
                Ok(booking)
            }
            Err(RepositoryError::Conflict(reason)) => {
                tracing::warn!(
                    booking_id = %snapshot.id,
                    event = %event,
                    actor = %actor,
                    %reason,
                    "booking transition lost a concurrent update"
                );
                telemetry::record_conflict(event);
                let message = match event {
                    BookingEvent::Accept => "this booking was already taken".to_string(),
                    _ => reason,
                };
                Err(BookingError::Conflict(message))
            }
            Err(other) => Err(other.into()),
        }
    }

    fn dispatch(&self, notification: BookingNotification) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(err) = notifier.notify(&notification).await {
                tracing::warn!(
                    booking_id = %notification.booking_id,
                    error = %err,
                    "notification delivery failed"
                );
            }
        });
    }
}

struct Target {
    hairdresser_id: Option<HairdresserId>,
    salon_id: Option<SalonId>,
    offered_to: Vec<HairdresserId>,
    location: ServiceLocation,
}

fn authorize_create(actor: &Actor, client: &ClientRef) -> Result<(), BookingError> {
    match (actor.role, client) {
        (ActorRole::Admin, _) => Ok(()),
        (ActorRole::Client, ClientRef::Registered { client_id }) if client_id.0 == actor.id => Ok(()),
        (ActorRole::Client, _) => Err(BookingError::Forbidden(
            "clients may only book for themselves".into(),
        )),
        (ActorRole::Hairdresser, ClientRef::Guest { .. }) => Ok(()),
        (role, _) => Err(BookingError::Forbidden(format!(
            "{role} may not create this booking"
        ))),
    }
}
