//! # salonbook-api — HTTP Surface
//!
//! Axum application exposing the booking lifecycle, candidate search, and
//! the salon/hairdresser directory.
//!
//! ## Routers
//!
//! - `/v1/bookings/*`: create, list, read, respond, start, complete,
//!   cancel, rate
//! - `/v1/candidates`: proximity search
//! - `/v1/hairdressers/*`: profiles, availability, position
//! - `/v1/salons/*`: registration, edits, admin validation
//! - `/openapi.json`: generated OpenAPI document
//! - `/health/*`, `/metrics`: unauthenticated probes and scrape endpoint
//!
//! ## Middleware Stack (outermost first)
//!
//! TraceLayer → Metrics → Auth → RateLimit → Handler
//!
//! Auth runs before rate limiting so buckets are keyed by the resolved
//! caller and unauthenticated requests never consume quota.
//!
//! ## Crate Policy
//!
//! - No business rules in handlers; they delegate to `salonbook-booking`.
//! - All errors map to structured JSON responses via [`AppError`].

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod views;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};

use crate::auth::AuthConfig;
use crate::middleware::rate_limit::RateLimiter;

pub use error::AppError;
pub use state::{AppConfig, AppState};

/// Assemble the full application router.
///
/// Health probes and `/metrics` are mounted outside the auth middleware.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };
    let limiter = RateLimiter::new(state.config.rate_limit.clone());

    let api = Router::new()
        .merge(routes::bookings::router())
        .merge(routes::candidates::router())
        .merge(routes::hairdressers::router())
        .merge(routes::salons::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(middleware::tracing_layer::layer())
        .layer(Extension(auth_config))
        .layer(Extension(limiter))
        .with_state(state.clone());

    let unauthenticated = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(prometheus_metrics))
        .with_state(state);

    Router::new().merge(unauthenticated).merge(api)
}

/// Liveness probe.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. 503 when the database does not answer.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("Database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }
    (StatusCode::OK, "ready").into_response()
}

/// GET /metrics — Prometheus text exposition.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}
