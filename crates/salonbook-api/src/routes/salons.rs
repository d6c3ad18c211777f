//! # Salon Routes
//!
//! Salon registration, edits, and admin validation. A salon only appears
//! in candidate searches once validated.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use salonbook_booking::{RegisterSalonRequest as NewSalon, UpdateSalonRequest as SalonEdit};
use salonbook_core::{HairdresserId, SalonId};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_path, extract_validated_json, Validate};
use crate::state::AppState;
use crate::views::{LocationInput, SalonView};

/// Register-salon request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterSalonRequest {
    /// Owning hairdresser. Defaults to the caller when the caller is a
    /// hairdresser.
    pub owner_id: Option<Uuid>,
    pub name: String,
    pub location: LocationInput,
    #[serde(default)]
    pub photos: Vec<String>,
}

impl Validate for RegisterSalonRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        Ok(())
    }
}

/// Salon edit. Absent fields are left as they are.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSalonRequest {
    pub name: Option<String>,
    pub location: Option<LocationInput>,
    pub photos: Option<Vec<String>>,
}

/// Validation flag.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SalonValidationRequest {
    pub validated: bool,
}

/// Build the salons router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/salons", post(register_salon))
        .route("/v1/salons/{id}", get(get_salon).put(update_salon))
        .route("/v1/salons/{id}/validation", put(set_validation))
}

/// POST /v1/salons — Register a salon, unvalidated.
#[utoipa::path(
    post,
    path = "/v1/salons",
    request_body = RegisterSalonRequest,
    responses(
        (status = 201, description = "Salon registered", body = SalonView),
        (status = 409, description = "Owner already has a salon", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "salons"
)]
pub(crate) async fn register_salon(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<RegisterSalonRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SalonView>), AppError> {
    let req = extract_validated_json(body)?;
    let owner = match req.owner_id {
        Some(id) => HairdresserId::from_uuid(id),
        None => caller
            .actor()
            .hairdresser_id()
            .ok_or_else(|| AppError::Validation("owner_id is required".into()))?,
    };
    let req = NewSalon {
        owner,
        name: req.name,
        location: req.location.into_location()?,
        photos: req.photos,
    };
    let created = state
        .directory
        .register_salon(&state.context(), caller.actor(), req)
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// GET /v1/salons/{id} — Fetch a salon.
#[utoipa::path(
    get,
    path = "/v1/salons/{id}",
    params(("id" = Uuid, Path, description = "Salon ID")),
    responses(
        (status = 200, description = "Salon found", body = SalonView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "salons"
)]
pub(crate) async fn get_salon(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SalonView>, AppError> {
    let id = extract_path(id)?;
    let found = state
        .directory
        .get_salon(&state.context(), SalonId::from_uuid(id))
        .await?;
    Ok(Json(found.into()))
}

/// PUT /v1/salons/{id} — Edit name, location or photos.
#[utoipa::path(
    put,
    path = "/v1/salons/{id}",
    params(("id" = Uuid, Path, description = "Salon ID")),
    request_body = UpdateSalonRequest,
    responses(
        (status = 200, description = "Salon updated", body = SalonView),
        (status = 403, description = "Not the owner", body = crate::error::ErrorBody),
    ),
    tag = "salons"
)]
pub(crate) async fn update_salon(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateSalonRequest>, JsonRejection>,
) -> Result<Json<SalonView>, AppError> {
    let id = extract_path(id)?;
    let req = extract_json(body)?;
    let edit = SalonEdit {
        name: req.name,
        location: req.location.map(LocationInput::into_location).transpose()?,
        photos: req.photos,
    };
    let updated = state
        .directory
        .update_salon(&state.context(), caller.actor(), SalonId::from_uuid(id), edit)
        .await?;
    Ok(Json(updated.into()))
}

/// PUT /v1/salons/{id}/validation — Approve or withdraw. Admin only.
#[utoipa::path(
    put,
    path = "/v1/salons/{id}/validation",
    params(("id" = Uuid, Path, description = "Salon ID")),
    request_body = SalonValidationRequest,
    responses(
        (status = 200, description = "Validation flag set", body = SalonView),
        (status = 403, description = "Admin only", body = crate::error::ErrorBody),
    ),
    tag = "salons"
)]
pub(crate) async fn set_validation(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<SalonValidationRequest>, JsonRejection>,
) -> Result<Json<SalonView>, AppError> {
    let id = extract_path(id)?;
    let req = extract_json(body)?;
    let updated = state
        .directory
        .set_salon_validation(
            &state.context(),
            caller.actor(),
            SalonId::from_uuid(id),
            req.validated,
        )
        .await?;
    Ok(Json(updated.into()))
}
