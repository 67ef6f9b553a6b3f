//! Error types for the geo crate.

use thiserror::Error;

/// Result type alias for geo operations.
pub type Result<T> = std::result::Result<T, GeoError>;

/// Errors that can occur during geo operations.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Invalid coordinate values
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// Address could not be used as a lookup key
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The upstream geocoding provider failed
    #[error("Geocoding provider error: {0}")]
    Provider(String),
}

/// Error code for integration with service-level error reporting.
/// Range: 10xxx for geo errors.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoErrorCode {
    /// Invalid coordinate values
    InvalidCoordinate = 10002,
    /// Unusable address
    InvalidAddress = 10004,
    /// Geocoding provider failure
    Provider = 10005,
}

impl GeoError {
    /// Returns the error code for this error.
    pub fn code(&self) -> GeoErrorCode {
        match self {
            GeoError::InvalidCoordinate(_) => GeoErrorCode::InvalidCoordinate,
            GeoError::InvalidAddress(_) => GeoErrorCode::InvalidAddress,
            GeoError::Provider(_) => GeoErrorCode::Provider,
        }
    }
}
