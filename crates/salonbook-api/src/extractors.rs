//! # Custom Extractors & Validation
//!
//! Provides the [`Validate`] trait for request DTOs and helpers to extract
//! and validate JSON bodies, path segments and query strings in handlers.
//! Every rejection leaves as a JSON [`AppError`] body.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::Json;

use crate::error::AppError;

/// Request types that check business rules beyond what serde enforces.
pub trait Validate {
    /// Validate business rules. Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body.
///
/// Well-formed JSON that does not fit the schema (unknown enum variant,
/// missing field, wrong type) is [`AppError::Validation`]. Unparseable
/// bodies and a missing content type are [`AppError::BadRequest`].
///
/// ```ignore
/// async fn handler(body: Result<Json<T>, JsonRejection>) -> Result<..., AppError> {
///     let req = extract_json(body)?;
/// }
/// ```
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match result {
        Ok(Json(v)) => Ok(v),
        Err(JsonRejection::JsonDataError(err)) => Err(AppError::Validation(err.body_text())),
        Err(err) => Err(AppError::BadRequest(err.body_text())),
    }
}

/// Extract path parameters, mapping parse errors to [`AppError::BadRequest`].
pub fn extract_path<T>(result: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    result
        .map(|Path(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Extract a query string, mapping parse errors to [`AppError::BadRequest`].
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}
