//! # Money
//!
//! Amounts are integer minor units (cents). No floats: a booking price
//! computed on one device must compare equal on every other.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A non-negative amount in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Money(i64);

impl Money {
    /// Zero.
    pub const ZERO: Money = Money(0);

    /// Build an amount, rejecting negative values.
    pub fn new(minor_units: i64) -> Result<Self, ValidationError> {
        if minor_units < 0 {
            return Err(ValidationError::Negative {
                field: "amount",
                value: minor_units,
            });
        }
        Ok(Self(minor_units))
    }

    /// The amount in minor units.
    pub fn minor_units(&self) -> i64 {
        self.0
    }

    /// A fraction of this amount in basis points, rounded down.
    pub fn basis_points(&self, bps: u32) -> Money {
        let scaled = i128::from(self.0) * i128::from(bps) / 10_000;
        Money(i64::try_from(scaled).unwrap_or(i64::MAX))
    }
}

impl TryFrom<i64> for Money {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Money::new(value)
    }
}

impl From<Money> for i64 {
    fn from(m: Money) -> Self {
        m.0
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}
