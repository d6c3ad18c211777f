//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI 3.1 spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "`{role}:{actor_id}:{secret}`. The secret is set via AUTH_TOKEN.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "salonbook API",
        version = "0.1.0",
        description = "Booking lifecycle and proximity matching for a hairdresser marketplace.\n\nAll `/v1/*` endpoints require `Authorization: Bearer {role}:{actor_id}:{secret}`. Health probes and `/metrics` are unauthenticated."
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    paths(
        // ── Bookings ────────────────────────────────────────────────────
        crate::routes::bookings::create_booking,
        crate::routes::bookings::list_bookings,
        crate::routes::bookings::get_booking,
        crate::routes::bookings::respond_to_booking,
        crate::routes::bookings::start_booking,
        crate::routes::bookings::complete_booking,
        crate::routes::bookings::cancel_booking,
        crate::routes::bookings::rate_booking,
        // ── Candidates ──────────────────────────────────────────────────
        crate::routes::candidates::find_candidates,
        // ── Hairdressers ────────────────────────────────────────────────
        crate::routes::hairdressers::register_hairdresser,
        crate::routes::hairdressers::get_hairdresser,
        crate::routes::hairdressers::set_availability,
        crate::routes::hairdressers::update_location,
        // ── Salons ──────────────────────────────────────────────────────
        crate::routes::salons::register_salon,
        crate::routes::salons::get_salon,
        crate::routes::salons::update_salon,
        crate::routes::salons::set_validation,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
            crate::views::BookingView,
            crate::views::BookingPageView,
            crate::views::CandidateView,
            crate::views::HairdresserView,
            crate::views::SalonView,
            crate::views::LocationInput,
            crate::views::CoordinateInput,
            crate::routes::bookings::CreateBookingRequest,
            crate::routes::bookings::GuestInput,
            crate::routes::bookings::RespondRequest,
            crate::routes::bookings::CancelRequest,
            crate::routes::bookings::RatingRequest,
            crate::routes::hairdressers::RegisterHairdresserRequest,
            crate::routes::hairdressers::AvailabilityRequest,
            crate::routes::hairdressers::LocationRequest,
            crate::routes::salons::RegisterSalonRequest,
            crate::routes::salons::UpdateSalonRequest,
            crate::routes::salons::SalonValidationRequest,
        ),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "bookings", description = "Booking creation and lifecycle"),
        (name = "candidates", description = "Proximity search"),
        (name = "hairdressers", description = "Hairdresser profiles"),
        (name = "salons", description = "Salons and their validation"),
    )
)]
pub struct ApiDoc;

/// Router serving the generated document.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
