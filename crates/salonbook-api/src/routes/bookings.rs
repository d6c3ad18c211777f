//! # Booking Routes
//!
//! Create, read, list, and drive the lifecycle of bookings. Every handler
//! resolves the caller from [`CallerIdentity`] and delegates to
//! [`salonbook_booking::BookingService`]; authorization and state rules
//! live there.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use salonbook_booking as booking;
use salonbook_booking::{ResponseDecision, SortOrder};
use salonbook_core::{BookingId, HairdresserId, HairstyleId, Money, SalonId, Timestamp};
use salonbook_state::{Actor, ActorRole, BookingStatus, ClientRef, ServiceType};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{
    extract_json, extract_path, extract_query, extract_validated_json, Validate,
};
use crate::state::AppState;
use crate::views::{BookingPageView, BookingView, LocationInput};

/// Guest contact, for bookings made on behalf of someone without an account.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GuestInput {
    pub name: String,
    pub phone: String,
}

/// Create-booking request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    /// Registered client. Defaults to the caller when the caller is a client.
    pub client_id: Option<Uuid>,
    /// Guest contact instead of a registered client.
    pub guest: Option<GuestInput>,
    /// `home` or `salon`.
    #[schema(value_type = String)]
    pub service_type: ServiceType,
    pub hairstyle_id: Uuid,
    /// RFC 3339 with any offset; stored as UTC.
    pub scheduled_time: String,
    pub estimated_duration_minutes: u32,
    /// Minor units.
    pub client_price: i64,
    /// Required for home bookings.
    pub location: Option<LocationInput>,
    /// Required for salon bookings.
    pub salon_id: Option<Uuid>,
    /// Explicitly chosen hairdresser.
    pub hairdresser_id: Option<Uuid>,
}

impl Validate for CreateBookingRequest {
    fn validate(&self) -> Result<(), String> {
        if self.client_id.is_some() && self.guest.is_some() {
            return Err("client_id and guest are mutually exclusive".to_string());
        }
        if self.scheduled_time.trim().is_empty() {
            return Err("scheduled_time must not be empty".to_string());
        }
        Ok(())
    }
}

impl CreateBookingRequest {
    fn into_domain(self, caller: &Actor) -> Result<booking::CreateBookingRequest, AppError> {
        let client = match (self.guest, self.client_id) {
            (Some(g), _) => ClientRef::Guest {
                name: g.name,
                phone: g.phone,
            },
            (None, Some(id)) => ClientRef::Registered {
                client_id: id.into(),
            },
            (None, None) => match caller.client_id() {
                Some(client_id) => ClientRef::Registered { client_id },
                None => return Err(AppError::Validation("client_id or guest is required".into())),
            },
        };
        Ok(booking::CreateBookingRequest {
            client,
            service_type: self.service_type,
            hairstyle_id: HairstyleId::from_uuid(self.hairstyle_id),
            scheduled_time: Timestamp::parse(&self.scheduled_time)?,
            estimated_duration_minutes: self.estimated_duration_minutes,
            client_price: Money::new(self.client_price)?,
            location: self.location.map(LocationInput::into_location).transpose()?,
            salon_id: self.salon_id.map(SalonId::from_uuid),
            hairdresser_id: self.hairdresser_id.map(HairdresserId::from_uuid),
        })
    }
}

/// Accept or reject.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RespondRequest {
    /// `accept` or `reject`.
    #[schema(value_type = String)]
    pub decision: ResponseDecision,
}

/// Cancellation request.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

/// Star rating for a completed booking.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RatingRequest {
    /// 1 to 5.
    pub stars: u8,
}

impl Validate for RatingRequest {
    fn validate(&self) -> Result<(), String> {
        if !(1..=5).contains(&self.stars) {
            return Err(format!("stars must be between 1 and 5, got {}", self.stars));
        }
        Ok(())
    }
}

/// Booking list filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBookingsQuery {
    /// Whose bookings. Defaults to the caller; others need admin.
    pub actor_id: Option<Uuid>,
    /// `client` or `hairdresser`. Defaults to the caller's role.
    pub role: Option<String>,
    /// Only bookings in this status.
    pub status: Option<String>,
    pub offset: Option<usize>,
    /// Page size, at most 100.
    pub limit: Option<usize>,
    /// `asc` or `desc` by `scheduled_time`. Defaults to `desc`.
    pub order: Option<String>,
}

impl ListBookingsQuery {
    fn into_domain(self) -> Result<booking::ListBookingsRequest, AppError> {
        let role = self
            .role
            .map(|r| ActorRole::from_name(&r).ok_or_else(|| AppError::Validation(format!("unknown role: {r}"))))
            .transpose()?;
        let status = self
            .status
            .map(|s| {
                BookingStatus::from_name(&s)
                    .ok_or_else(|| AppError::Validation(format!("unknown status: {s}")))
            })
            .transpose()?;
        let order = match self.order.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None => None,
            Some("asc") => Some(SortOrder::Asc),
            Some("desc") => Some(SortOrder::Desc),
            Some(other) => return Err(AppError::Validation(format!("unknown order: {other}"))),
        };
        Ok(booking::ListBookingsRequest {
            actor_id: self.actor_id,
            role,
            status,
            offset: self.offset,
            limit: self.limit,
            order,
        })
    }
}

/// Build the bookings router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking).get(list_bookings))
        .route("/v1/bookings/{id}", get(get_booking))
        .route("/v1/bookings/{id}/respond", post(respond_to_booking))
        .route("/v1/bookings/{id}/start", post(start_booking))
        .route("/v1/bookings/{id}/complete", post(complete_booking))
        .route("/v1/bookings/{id}/cancel", post(cancel_booking))
        .route("/v1/bookings/{id}/rating", post(rate_booking))
}

/// POST /v1/bookings — Create a booking in `pending`.
#[utoipa::path(
    post,
    path = "/v1/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingView),
        (status = 404, description = "No candidates or unknown target", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "bookings"
)]
pub(crate) async fn create_booking(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingView>), AppError> {
    let req = extract_validated_json(body)?.into_domain(caller.actor())?;
    let created = state
        .bookings
        .create_booking(&state.context(), caller.actor(), req)
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// GET /v1/bookings — List bookings of an actor.
#[utoipa::path(
    get,
    path = "/v1/bookings",
    params(ListBookingsQuery),
    responses(
        (status = 200, description = "One page of bookings", body = BookingPageView),
        (status = 403, description = "Listing another actor needs admin", body = crate::error::ErrorBody),
    ),
    tag = "bookings"
)]
pub(crate) async fn list_bookings(
    State(state): State<AppState>,
    caller: CallerIdentity,
    query: Result<Query<ListBookingsQuery>, QueryRejection>,
) -> Result<Json<BookingPageView>, AppError> {
    let req = extract_query(query)?.into_domain()?;
    let page = state
        .bookings
        .list_bookings_for_actor(&state.context(), caller.actor(), req)
        .await?;
    Ok(Json(page.into()))
}

/// GET /v1/bookings/{id} — Fetch one booking.
#[utoipa::path(
    get,
    path = "/v1/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking found", body = BookingView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "bookings"
)]
pub(crate) async fn get_booking(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<BookingView>, AppError> {
    let id = extract_path(id)?;
    let found = state
        .bookings
        .get_booking(&state.context(), caller.actor(), BookingId::from_uuid(id))
        .await?;
    Ok(Json(found.into()))
}

/// POST /v1/bookings/{id}/respond — Accept or reject a pending booking.
#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/respond",
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = RespondRequest,
    responses(
        (status = 200, description = "Booking updated", body = BookingView),
        (status = 409, description = "Already taken or not pending", body = crate::error::ErrorBody),
    ),
    tag = "bookings"
)]
pub(crate) async fn respond_to_booking(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<RespondRequest>, JsonRejection>,
) -> Result<Json<BookingView>, AppError> {
    let id = extract_path(id)?;
    let req = extract_json(body)?;
    let updated = state
        .bookings
        .respond_to_booking(
            &state.context(),
            caller.actor(),
            BookingId::from_uuid(id),
            req.decision,
        )
        .await?;
    Ok(Json(updated.into()))
}

/// POST /v1/bookings/{id}/start — Begin a confirmed booking.
#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/start",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking in progress", body = BookingView),
        (status = 409, description = "Hairdresser busy or wrong state", body = crate::error::ErrorBody),
    ),
    tag = "bookings"
)]
pub(crate) async fn start_booking(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<BookingView>, AppError> {
    let id = extract_path(id)?;
    let updated = state
        .bookings
        .start_booking(&state.context(), caller.actor(), BookingId::from_uuid(id))
        .await?;
    Ok(Json(updated.into()))
}

/// POST /v1/bookings/{id}/complete — Finish an in-progress booking.
#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/complete",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking completed", body = BookingView),
        (status = 409, description = "Wrong state", body = crate::error::ErrorBody),
    ),
    tag = "bookings"
)]
pub(crate) async fn complete_booking(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<BookingView>, AppError> {
    let id = extract_path(id)?;
    let updated = state
        .bookings
        .complete_booking(&state.context(), caller.actor(), BookingId::from_uuid(id))
        .await?;
    Ok(Json(updated.into()))
}

/// POST /v1/bookings/{id}/cancel — Cancel a booking.
#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/cancel",
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = CancelRequest,
    responses(
        (status = 200, description = "Booking cancelled", body = BookingView),
        (status = 409, description = "Wrong state", body = crate::error::ErrorBody),
    ),
    tag = "bookings"
)]
pub(crate) async fn cancel_booking(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<CancelRequest>, JsonRejection>,
) -> Result<Json<BookingView>, AppError> {
    let id = extract_path(id)?;
    let req = extract_json(body)?;
    let updated = state
        .bookings
        .cancel_booking(
            &state.context(),
            caller.actor(),
            BookingId::from_uuid(id),
            req.reason,
        )
        .await?;
    Ok(Json(updated.into()))
}

/// POST /v1/bookings/{id}/rating — Rate a completed booking.
#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/rating",
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = RatingRequest,
    responses(
        (status = 200, description = "Rating stored", body = BookingView),
        (status = 409, description = "Already rated", body = crate::error::ErrorBody),
    ),
    tag = "bookings"
)]
pub(crate) async fn rate_booking(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<RatingRequest>, JsonRejection>,
) -> Result<Json<BookingView>, AppError> {
    let id = extract_path(id)?;
    let req = extract_validated_json(body)?;
    let rated = state
        .bookings
        .rate_booking(
            &state.context(),
            caller.actor(),
            BookingId::from_uuid(id),
            req.stars,
        )
        .await?;
    Ok(Json(rated.into()))
}
