//! # Booking Configuration
//!
//! Environment-level settings, parsed once at startup. A malformed value is
//! a [`ConfigError`]; it is never silently replaced by the default.

use std::time::Duration;

use thiserror::Error;

/// Invalid configuration value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {var}={value:?}: {reason}")]
pub struct ConfigError {
    /// Environment variable name.
    pub var: &'static str,
    /// The rejected value.
    pub value: String,
    /// What was wrong with it.
    pub reason: String,
}

/// Tunables for booking creation, candidate search and the expiry sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingConfig {
    /// Search radius when the caller gives none, in km.
    pub default_radius_km: f64,
    /// Candidate count when the caller gives none.
    pub default_candidate_limit: usize,
    /// Largest accepted candidate limit.
    pub max_candidate_limit: usize,
    /// How far ahead of now `scheduled_time` must be.
    pub min_lead_time: chrono::Duration,
    /// Per-call repository deadline.
    pub repository_timeout: Duration,
    /// Platform fee in basis points of the client price.
    pub service_fee_bps: u32,
    /// Expiry sweep period. Zero disables the sweeper.
    pub sweep_interval: Duration,
    /// How long past `scheduled_time` an unstarted booking survives.
    pub sweep_grace: chrono::Duration,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            default_radius_km: 10.0,
            default_candidate_limit: 20,
            max_candidate_limit: 100,
            min_lead_time: chrono::Duration::minutes(15),
            repository_timeout: Duration::from_millis(5_000),
            service_fee_bps: 1_000,
            sweep_interval: Duration::from_secs(60),
            sweep_grace: chrono::Duration::zero(),
        }
    }
}

impl BookingConfig {
    /// Read `SALONBOOK_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Missing keys take the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            default_radius_km: parse(&lookup, "SALONBOOK_DEFAULT_RADIUS_KM")?
                .unwrap_or(defaults.default_radius_km),
            default_candidate_limit: parse(&lookup, "SALONBOOK_DEFAULT_CANDIDATE_LIMIT")?
                .unwrap_or(defaults.default_candidate_limit),
            max_candidate_limit: parse(&lookup, "SALONBOOK_MAX_CANDIDATE_LIMIT")?
                .unwrap_or(defaults.max_candidate_limit),
            min_lead_time: parse::<u32>(&lookup, "SALONBOOK_MIN_LEAD_MINUTES")?
                .map(|m| chrono::Duration::minutes(i64::from(m)))
                .unwrap_or(defaults.min_lead_time),
            repository_timeout: parse(&lookup, "SALONBOOK_REPOSITORY_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.repository_timeout),
            service_fee_bps: parse(&lookup, "SALONBOOK_SERVICE_FEE_BPS")?
                .unwrap_or(defaults.service_fee_bps),
            sweep_interval: parse(&lookup, "SALONBOOK_SWEEP_INTERVAL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            sweep_grace: parse::<u32>(&lookup, "SALONBOOK_SWEEP_GRACE_MINUTES")?
                .map(|m| chrono::Duration::minutes(i64::from(m)))
                .unwrap_or(defaults.sweep_grace),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.default_radius_km.is_finite() || self.default_radius_km <= 0.0 {
            return Err(invalid(
                "SALONBOOK_DEFAULT_RADIUS_KM",
                self.default_radius_km,
                "must be a positive number",
            ));
        }
        if self.max_candidate_limit == 0 {
            return Err(invalid(
                "SALONBOOK_MAX_CANDIDATE_LIMIT",
                self.max_candidate_limit,
                "must be positive",
            ));
        }
        if self.default_candidate_limit == 0
            || self.default_candidate_limit > self.max_candidate_limit
        {
            return Err(invalid(
                "SALONBOOK_DEFAULT_CANDIDATE_LIMIT",
                self.default_candidate_limit,
                "must be between 1 and SALONBOOK_MAX_CANDIDATE_LIMIT",
            ));
        }
        if self.min_lead_time <= chrono::Duration::zero() {
            return Err(invalid(
                "SALONBOOK_MIN_LEAD_MINUTES",
                self.min_lead_time.num_minutes(),
                "must be positive",
            ));
        }
        if self.repository_timeout.is_zero() {
            return Err(invalid(
                "SALONBOOK_REPOSITORY_TIMEOUT_MS",
                0,
                "must be positive",
            ));
        }
        if self.service_fee_bps > 10_000 {
            return Err(invalid(
                "SALONBOOK_SERVICE_FEE_BPS",
                self.service_fee_bps,
                "must not exceed 10000",
            ));
        }
        Ok(())
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError {
                var,
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}

fn invalid(var: &'static str, value: impl std::fmt::Display, reason: &str) -> ConfigError {
    ConfigError {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
