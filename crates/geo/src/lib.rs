//! Geospatial primitives for the freshcart marketplace.
//!
//! [`Coordinate`] with range validation, [`haversine_distance`] between two of
//! them, and (with the `geocode` feature) a cached, rate-gated front for
//! address lookups.
//!
//! # Example
//!
//! ```
//! use freshcart_geo::{haversine_distance, Coordinate};
//!
//! let manila = Coordinate::new(14.5995, 120.9842);
//! let quezon_city = Coordinate::new(14.6760, 121.0437);
//!
//! let distance_km = haversine_distance(&manila, &quezon_city);
//! assert!((distance_km - 10.5).abs() < 1.0);
//! ```

mod error;
#[cfg(feature = "geocode")]
pub mod geocode;
mod haversine;

pub use error::{GeoError, GeoErrorCode, Result};
#[cfg(feature = "geocode")]
pub use geocode::{CachedGeocoder, GeocodeCache, Geocoder, RateGate};
pub use haversine::{haversine_distance, EARTH_RADIUS_KM};

/// A point on Earth in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

impl Coordinate {
    /// Unchecked; see [`validate`](Self::validate).
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Returns true if both components are finite and inside their ranges.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Checks the coordinate, naming the offending component on failure.
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(GeoError::InvalidCoordinate(format!(
                "latitude {} outside [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(GeoError::InvalidCoordinate(format!(
                "longitude {} outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }

    /// (lat, lng) in radians
    #[inline]
    pub(crate) fn to_radians(self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(0.0, 0.0).is_valid());
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 181.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_validate_names_component() {
        let err = Coordinate::new(14.0, 200.0).validate().unwrap_err();
        assert!(err.to_string().contains("longitude"));
        assert_eq!(err.code(), GeoErrorCode::InvalidCoordinate);

        let err = Coordinate::new(f64::INFINITY, 0.0).validate().unwrap_err();
        assert!(err.to_string().contains("latitude"));
    }

    #[test]
    fn test_coordinate_from_tuple() {
        let coord: Coordinate = (14.5995, 120.9842).into();
        assert_eq!(coord.latitude, 14.5995);
        assert_eq!(coord.longitude, 120.9842);
    }
}
