//! # Hairdresser Routes
//!
//! Registration, profile reads, availability and position updates.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use salonbook_booking::RegisterHairdresserRequest as NewHairdresser;
use salonbook_core::{HairdresserId, Money, UserId};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_path};
use crate::state::AppState;
use crate::views::{CoordinateInput, HairdresserView};

/// Register-hairdresser request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterHairdresserRequest {
    /// Backing user account.
    pub user_id: Uuid,
    /// Minor units.
    pub base_price: i64,
    pub location: Option<CoordinateInput>,
}

/// Availability toggle.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AvailabilityRequest {
    pub is_available: bool,
}

/// Position update. `null` clears the position.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LocationRequest {
    pub location: Option<CoordinateInput>,
}

/// Build the hairdressers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/hairdressers", post(register_hairdresser))
        .route("/v1/hairdressers/{id}", get(get_hairdresser))
        .route("/v1/hairdressers/{id}/availability", put(set_availability))
        .route("/v1/hairdressers/{id}/location", put(update_location))
}

/// POST /v1/hairdressers — Register a hairdresser profile.
#[utoipa::path(
    post,
    path = "/v1/hairdressers",
    request_body = RegisterHairdresserRequest,
    responses(
        (status = 201, description = "Hairdresser registered", body = HairdresserView),
        (status = 403, description = "Clients may not register hairdressers", body = crate::error::ErrorBody),
        (status = 409, description = "Already registered", body = crate::error::ErrorBody),
    ),
    tag = "hairdressers"
)]
pub(crate) async fn register_hairdresser(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<RegisterHairdresserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<HairdresserView>), AppError> {
    let req = extract_json(body)?;
    let req = NewHairdresser {
        user_id: UserId::from_uuid(req.user_id),
        base_price: Money::new(req.base_price)?,
        location: req.location.map(CoordinateInput::into_coordinate).transpose()?,
    };
    let created = state
        .directory
        .register_hairdresser(&state.context(), caller.actor(), req)
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// GET /v1/hairdressers/{id} — Fetch a hairdresser profile.
#[utoipa::path(
    get,
    path = "/v1/hairdressers/{id}",
    params(("id" = Uuid, Path, description = "Hairdresser ID")),
    responses(
        (status = 200, description = "Hairdresser found", body = HairdresserView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "hairdressers"
)]
pub(crate) async fn get_hairdresser(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<HairdresserView>, AppError> {
    let id = extract_path(id)?;
    let found = state
        .directory
        .get_hairdresser(&state.context(), HairdresserId::from_uuid(id))
        .await?;
    Ok(Json(found.into()))
}

/// PUT /v1/hairdressers/{id}/availability — Toggle availability.
#[utoipa::path(
    put,
    path = "/v1/hairdressers/{id}/availability",
    params(("id" = Uuid, Path, description = "Hairdresser ID")),
    request_body = AvailabilityRequest,
    responses(
        (status = 200, description = "Availability updated", body = HairdresserView),
        (status = 403, description = "Not this hairdresser", body = crate::error::ErrorBody),
    ),
    tag = "hairdressers"
)]
pub(crate) async fn set_availability(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<AvailabilityRequest>, JsonRejection>,
) -> Result<Json<HairdresserView>, AppError> {
    let id = extract_path(id)?;
    let req = extract_json(body)?;
    let updated = state
        .directory
        .set_availability(
            &state.context(),
            caller.actor(),
            HairdresserId::from_uuid(id),
            req.is_available,
        )
        .await?;
    Ok(Json(updated.into()))
}

/// PUT /v1/hairdressers/{id}/location — Replace or clear the position.
#[utoipa::path(
    put,
    path = "/v1/hairdressers/{id}/location",
    params(("id" = Uuid, Path, description = "Hairdresser ID")),
    request_body = LocationRequest,
    responses(
        (status = 200, description = "Position updated", body = HairdresserView),
        (status = 422, description = "Coordinate out of range", body = crate::error::ErrorBody),
    ),
    tag = "hairdressers"
)]
pub(crate) async fn update_location(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<LocationRequest>, JsonRejection>,
) -> Result<Json<HairdresserView>, AppError> {
    let id = extract_path(id)?;
    let req = extract_json(body)?;
    let location = req.location.map(CoordinateInput::into_coordinate).transpose()?;
    let updated = state
        .directory
        .update_hairdresser_location(
            &state.context(),
            caller.actor(),
            HairdresserId::from_uuid(id),
            location,
        )
        .await?;
    Ok(Json(updated.into()))
}
