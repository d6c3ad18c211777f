//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps [`BookingError`] and lower-layer errors to HTTP status codes with a
//! JSON body of error code, message, and optional details. Internal error
//! details are never returned to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use salonbook_booking::BookingError;

/// Structured JSON error response body.
///
/// All error responses use this format across the API surface.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "CONFLICT").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for some client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body or query could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller may not act on this resource (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// State-machine rule violation (409).
    #[error("cannot {event} a booking in state {from}")]
    InvalidTransition { from: String, event: String },

    /// Lost a concurrent update or violated a uniqueness rule (409).
    #[error("{0}")]
    Conflict(String),

    /// Candidate search found nobody (404).
    #[error("no hairdresser available nearby")]
    NoCandidatesFound { radius_km: f64 },

    /// Storage unreachable or timed out (503). Retry with backoff.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code and machine-readable error code.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::NoCandidatesFound { .. } => (StatusCode::NOT_FOUND, "NO_CANDIDATES_FOUND"),
            Self::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::InvalidTransition { from, event } => {
                Some(serde_json::json!({ "from": from, "event": event }))
            }
            Self::NoCandidatesFound { radius_km } => {
                Some(serde_json::json!({ "radius_km": radius_km }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Unavailable(_) => tracing::warn!(error = %self, "storage unavailable"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(msg) => Self::Validation(msg),
            BookingError::NotFound { entity, id } => Self::NotFound(format!("{entity} {id}")),
            BookingError::Forbidden(msg) => Self::Forbidden(msg),
            BookingError::InvalidTransition { from, event } => Self::InvalidTransition {
                from: from.to_string(),
                event: event.to_string(),
            },
            BookingError::Conflict(msg) => Self::Conflict(msg),
            BookingError::NoCandidatesFound { radius_km } => Self::NoCandidatesFound { radius_km },
            BookingError::Unavailable(msg) => Self::Unavailable(msg),
        }
    }
}

impl From<salonbook_core::ValidationError> for AppError {
    fn from(err: salonbook_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}
