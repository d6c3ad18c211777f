//! # Candidate Search
//!
//! Read-only proximity search over validated salons (salon bookings) or
//! available hairdressers (home bookings).

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::IntoParams;

use salonbook_booking::CandidateQuery;
use salonbook_core::Coordinate;
use salonbook_state::ServiceType;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::extract_query;
use crate::state::AppState;
use crate::views::CandidateView;

/// Search origin and filters.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CandidateParams {
    /// Origin latitude in degrees.
    pub latitude: f64,
    /// Origin longitude in degrees.
    pub longitude: f64,
    /// `home` or `salon`.
    pub service_type: String,
    /// Search radius in km. Server default when absent.
    pub radius_km: Option<f64>,
    /// Maximum results. Server default when absent.
    pub limit: Option<usize>,
}

impl CandidateParams {
    fn into_query(self) -> Result<CandidateQuery, AppError> {
        let service_type = ServiceType::from_name(&self.service_type).ok_or_else(|| {
            AppError::Validation(format!("unknown service_type: {}", self.service_type))
        })?;
        Ok(CandidateQuery {
            origin: Coordinate::new(self.latitude, self.longitude)?,
            service_type,
            radius_km: self.radius_km,
            limit: self.limit,
        })
    }
}

/// Build the candidates router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/candidates", get(find_candidates))
}

/// GET /v1/candidates — Nearest candidates, closest first.
#[utoipa::path(
    get,
    path = "/v1/candidates",
    params(CandidateParams),
    responses(
        (status = 200, description = "Ranked candidates, possibly empty", body = Vec<CandidateView>),
        (status = 422, description = "Bad origin, radius or limit", body = crate::error::ErrorBody),
    ),
    tag = "candidates"
)]
pub(crate) async fn find_candidates(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    params: Result<Query<CandidateParams>, QueryRejection>,
) -> Result<Json<Vec<CandidateView>>, AppError> {
    let query = extract_query(params)?.into_query()?;
    let found = state
        .bookings
        .find_candidates(&state.context(), &query)
        .await?;
    Ok(Json(found.into_iter().map(CandidateView::from).collect()))
}
