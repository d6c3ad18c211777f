//! # salonbook-core — Foundational Types
//!
//! The leaf of the salonbook dependency graph. Defines the value types every
//! other crate speaks in: identifiers, timestamps, coordinates, money.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `BookingId`, `ClientId`,
//!    `HairdresserId`, `SalonId`, `HairstyleId`, `UserId`. You cannot pass a
//!    salon id where a hairdresser id is expected.
//!
//! 2. **Validated constructors.** `Coordinate::new()` rejects out-of-range and
//!    non-finite values, `Money::new()` rejects negative amounts. Deserialization
//!    goes through the same constructors, so an invalid value never exists.
//!
//! 3. **One distance function.** [`geo::distance_km`] is the only place the
//!    Haversine formula lives.
//!
//! 4. **UTC-only timestamps** truncated to seconds.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `salonbook-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod geo;
pub mod identity;
pub mod money;
pub mod temporal;

pub use error::ValidationError;
pub use geo::{distance_km, Coordinate, ServiceLocation, EARTH_RADIUS_KM};
pub use identity::{BookingId, ClientId, HairdresserId, HairstyleId, SalonId, UserId};
pub use money::Money;
pub use temporal::Timestamp;
