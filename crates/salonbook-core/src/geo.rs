//! # Geographic Primitives
//!
//! `Coordinate` and `ServiceLocation` value types, and [`distance_km`], the
//! great-circle distance between two coordinates.
//!
//! ## Invariants
//!
//! - A `Coordinate` always has latitude in [-90, 90] and longitude in
//!   [-180, 180], both finite. There is no "unknown location" sentinel:
//!   a missing location is `Option<Coordinate>::None` and callers decide
//!   what that means.
//! - `distance_km(a, b) == distance_km(b, a)` and `distance_km(a, a) == 0`.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Mean Earth radius used by the Haversine formula, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the Earth's surface in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = ValidationError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !latitude.is_finite() {
            return Err(ValidationError::NonFinite { field: "latitude" });
        }
        if !longitude.is_finite() {
            return Err(ValidationError::NonFinite { field: "longitude" });
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in decimal degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to `other` in kilometres.
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        distance_km(self, other)
    }
}

/// Great-circle distance between two coordinates in kilometres (Haversine).
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let half_chord = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push the chord marginally past 1.0 for antipodal points.
    let half_chord = half_chord.clamp(0.0, 1.0);
    let central_angle = 2.0 * half_chord.sqrt().atan2((1.0 - half_chord).sqrt());

    EARTH_RADIUS_KM * central_angle
}

/// An address together with its resolved coordinate.
///
/// Attached to salons and to bookings. Geocoding happens outside this
/// system, so a `ServiceLocation` is only constructible once a coordinate
/// is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawServiceLocation")]
pub struct ServiceLocation {
    address: String,
    coordinate: Coordinate,
}

#[derive(Deserialize)]
struct RawServiceLocation {
    address: String,
    coordinate: Coordinate,
}

impl TryFrom<RawServiceLocation> for ServiceLocation {
    type Error = ValidationError;

    fn try_from(raw: RawServiceLocation) -> Result<Self, Self::Error> {
        ServiceLocation::new(raw.address, raw.coordinate)
    }
}

impl ServiceLocation {
    /// Build a location. The address is trimmed and must not be empty.
    pub fn new(address: impl Into<String>, coordinate: Coordinate) -> Result<Self, ValidationError> {
        let address = address.into().trim().to_string();
        if address.is_empty() {
            return Err(ValidationError::Empty { field: "address" });
        }
        Ok(Self {
            address,
            coordinate,
        })
    }

    /// Human-readable address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Resolved coordinate.
    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        assert_eq!(
            Coordinate::new(90.5, 0.0),
            Err(ValidationError::LatitudeOutOfRange(90.5))
        );
        assert!(Coordinate::new(-91.0, 0.0).is_err());
    }

    #[test]
    fn rejects_out_of_range_longitude() {
        assert_eq!(
            Coordinate::new(0.0, 180.01),
            Err(ValidationError::LongitudeOutOfRange(180.01))
        );
    }

    #[test]
    fn rejects_non_finite() {
        assert!(matches!(
            Coordinate::new(f64::NAN, 0.0),
            Err(ValidationError::NonFinite { field: "latitude" })
        ));
        assert!(matches!(
            Coordinate::new(0.0, f64::INFINITY),
            Err(ValidationError::NonFinite { field: "longitude" })
        ));
    }

    #[test]
    fn accepts_boundaries() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn distance_to_self_is_zero() {
        let p = coord(52.5200, 13.4050);
        assert_eq!(distance_km(&p, &p), 0.0);
    }

    #[test]
    fn known_city_pair() {
        // Paris to London, roughly 343.5 km great-circle.
        let paris = coord(48.8566, 2.3522);
        let london = coord(51.5074, -0.1278);
        let d = distance_km(&paris, &london);
        assert!((d - 343.5).abs() < 1.0, "got {d}");
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = distance_km(&coord(0.0, 0.0), &coord(1.0, 0.0));
        assert!((d - 111.195).abs() < 0.01, "got {d}");
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let d = distance_km(&coord(0.0, 0.0), &coord(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn deserialization_validates() {
        let ok: Coordinate =
            serde_json::from_str(r#"{"latitude": 10.0, "longitude": 20.0}"#).unwrap();
        assert_eq!(ok.latitude(), 10.0);
        let bad = serde_json::from_str::<Coordinate>(r#"{"latitude": 100.0, "longitude": 20.0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn service_location_requires_address() {
        let c = coord(1.0, 1.0);
        assert!(ServiceLocation::new("   ", c).is_err());
        let loc = ServiceLocation::new("  12 Rue de Rivoli ", c).unwrap();
        assert_eq!(loc.address(), "12 Rue de Rivoli");
        assert_eq!(loc.coordinate(), c);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn any_coordinate() -> impl Strategy<Value = Coordinate> {
            (-90.0f64..=90.0, -180.0f64..=180.0)
                .prop_map(|(lat, lon)| Coordinate::new(lat, lon).unwrap())
        }

        proptest! {
            #[test]
            fn distance_is_symmetric(a in any_coordinate(), b in any_coordinate()) {
                let ab = distance_km(&a, &b);
                let ba = distance_km(&b, &a);
                prop_assert!((ab - ba).abs() < 1e-9, "{} vs {}", ab, ba);
            }

            #[test]
            fn distance_to_self_is_zero(a in any_coordinate()) {
                prop_assert!(distance_km(&a, &a).abs() < 1e-9);
            }

            #[test]
            fn distance_is_bounded(a in any_coordinate(), b in any_coordinate()) {
                let d = distance_km(&a, &b);
                prop_assert!(d >= 0.0);
                prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_KM + 1e-6);
            }
        }
    }
}
