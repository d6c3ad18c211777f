//! # Error Types
//!
//! Input validation failures for the core value types. Each variant names
//! the offending field and value so the message can be returned to a caller
//! unchanged.

use thiserror::Error;

/// A value failed validation at construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Latitude outside [-90, 90].
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    /// Longitude outside [-180, 180].
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    /// NaN or infinity where a finite number is required.
    #[error("{field} must be a finite number")]
    NonFinite {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A required text field is empty or whitespace.
    #[error("{field} must not be empty")]
    Empty {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A monetary amount is negative.
    #[error("{field} must not be negative, got {value}")]
    Negative {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: i64,
    },

    /// An integer outside its permitted range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: i64,
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },

    /// A URL that is not absolute http(s).
    #[error("{url:?} is not an http(s) URL")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },

    /// A timestamp string could not be parsed.
    #[error("invalid timestamp {input:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        input: String,
        /// Parser diagnostic.
        reason: String,
    },
}
