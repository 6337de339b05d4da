//! Geolocation types used by the location-aware advisory forms

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A resolved position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Why a position could not be obtained.
///
/// The display strings are the messages shown to the user.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationError {
    #[error("You denied the request for Geolocation.")]
    PermissionDenied,

    #[error("Location information is unavailable.")]
    PositionUnavailable,

    #[error("The request to get user location timed out.")]
    Timeout,

    #[error("An unknown error occurred.")]
    Unknown,

    #[error("Geolocation is not supported by your browser.")]
    Unsupported,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            LocationError::PermissionDenied.to_string(),
            "You denied the request for Geolocation."
        );
        assert_eq!(
            LocationError::PositionUnavailable.to_string(),
            "Location information is unavailable."
        );
    }
}
