//! Unified error handling for the ward-mapper library.
//!
//! Recoverable data-quality problems (malformed rows, lookup misses,
//! unsupported geometry) never surface here: those paths skip or return
//! `None` by design. This type covers programmer-error and
//! upstream-failure classes only.

use std::fmt;

/// Unified error type for ward-mapper operations.
#[derive(Debug, Clone)]
pub enum WardMapError {
    /// Coordinate outside the valid lat/lng ranges, or non-finite
    InvalidCoordinates {
        latitude: f64,
        longitude: f64,
    },
    /// An operation needs a dataset that has not been loaded yet
    DatasetNotLoaded {
        dataset: String,
    },
    /// Boundary dataset text is not a FeatureCollection or NDJSON stream
    DatasetUnreadable {
        message: String,
    },
    /// Routing provider returned no usable route
    RouteNotFound {
        message: String,
    },
    /// HTTP/upstream error (routing, geocoding)
    HttpError {
        message: String,
        status_code: Option<u16>,
    },
    /// Generic internal error
    Internal {
        message: String,
    },
}

impl fmt::Display for WardMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WardMapError::InvalidCoordinates {
                latitude,
                longitude,
            } => {
                write!(f, "Invalid coordinates ({}, {})", latitude, longitude)
            }
            WardMapError::DatasetNotLoaded { dataset } => {
                write!(f, "Dataset '{}' is not loaded", dataset)
            }
            WardMapError::DatasetUnreadable { message } => {
                write!(f, "Dataset unreadable: {}", message)
            }
            WardMapError::RouteNotFound { message } => {
                write!(f, "No route found: {}", message)
            }
            WardMapError::HttpError {
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "HTTP error ({}): {}", code, message)
                } else {
                    write!(f, "HTTP error: {}", message)
                }
            }
            WardMapError::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for WardMapError {}

/// Result type alias for ward-mapper operations.
pub type Result<T> = std::result::Result<T, WardMapError>;

/// Extension trait for converting Option to WardMapError.
pub trait OptionExt<T> {
    /// Convert Option to Result with a dataset-not-loaded error.
    fn ok_or_not_loaded(self, dataset: &str) -> Result<T>;

    /// Convert Option to Result with generic internal error.
    fn ok_or_internal(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_loaded(self, dataset: &str) -> Result<T> {
        self.ok_or_else(|| WardMapError::DatasetNotLoaded {
            dataset: dataset.to_string(),
        })
    }

    fn ok_or_internal(self, message: &str) -> Result<T> {
        self.ok_or_else(|| WardMapError::Internal {
            message: message.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WardMapError::DatasetNotLoaded {
            dataset: "elections".to_string(),
        };
        assert!(err.to_string().contains("elections"));

        let err = WardMapError::HttpError {
            message: "bad gateway".to_string(),
            status_code: Some(502),
        };
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_option_ext() {
        let none: Option<i32> = None;
        let result = none.ok_or_not_loaded("boundaries");
        assert!(matches!(
            result,
            Err(WardMapError::DatasetNotLoaded { .. })
        ));
    }
}
