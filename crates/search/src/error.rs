//! Error types for the search crate.

use thiserror::Error;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Malformed buyer or product list; the whole call fails.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Raised only by the strict config constructor.
    #[error("Invalid config field `{field}`: {reason}")]
    ConfigValidation {
        /// Offending field, wire spelling
        field: String,
        /// Violated constraint
        reason: String,
    },

    /// Shelf-life constant that would make freshness undefined.
    #[error("Product {id}: total shelf life {days} {reason}")]
    InvalidShelfLife {
        /// Product ID
        id: i64,
        /// Offending value
        days: i64,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Negative days-in-storage.
    #[error("Product {id}: days already used must be non-negative, got {days}")]
    InvalidDaysUsed {
        /// Product ID
        id: i64,
        /// Offending value
        days: i64,
    },

    /// Candidate source failure
    #[error("Candidate source error: {0}")]
    Source(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error code for integration with service-level error reporting.
/// Range: 20xxx for search errors.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchErrorCode {
    /// Malformed input
    InvalidInput = 20001,
    /// Config rejected by the strict validator
    ConfigValidation = 20002,
    /// Non-positive shelf life
    InvalidShelfLife = 20003,
    /// Negative days used
    InvalidDaysUsed = 20004,
    /// Candidate source failure
    Source = 20005,
    /// JSON error
    Json = 20006,
}

impl SearchError {
    /// Returns the error code for this error.
    pub fn code(&self) -> SearchErrorCode {
        match self {
            SearchError::InvalidInput(_) => SearchErrorCode::InvalidInput,
            SearchError::ConfigValidation { .. } => SearchErrorCode::ConfigValidation,
            SearchError::InvalidShelfLife { .. } => SearchErrorCode::InvalidShelfLife,
            SearchError::InvalidDaysUsed { .. } => SearchErrorCode::InvalidDaysUsed,
            SearchError::Source(_) => SearchErrorCode::Source,
            SearchError::Json(_) => SearchErrorCode::Json,
        }
    }

    /// True when a transport layer should answer with a 400-class status.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SearchError::InvalidInput(_)
                | SearchError::ConfigValidation { .. }
                | SearchError::Json(_)
        )
    }

    pub(crate) fn config(field: &str, reason: impl Into<String>) -> Self {
        SearchError::ConfigValidation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<freshcart_geo::GeoError> for SearchError {
    fn from(err: freshcart_geo::GeoError) -> Self {
        SearchError::InvalidInput(err.to_string())
    }
}
