//! One-shot position request for the location-aware advisory forms

use kisan_chat_core::{Coordinates, LocationError, LocationProvider};

use crate::AgentError;

/// Ask `provider` for the current position.
///
/// A host without geolocation yields [`LocationError::Unsupported`]; every
/// error's display string is the message to show the user.
pub async fn request_location(provider: &dyn LocationProvider) -> Result<Coordinates, AgentError> {
    if !provider.is_supported() {
        tracing::warn!("Geolocation not supported");
        return Err(LocationError::Unsupported.into());
    }

    match provider.current_position().await {
        Ok(coordinates) => {
            tracing::info!(
                latitude = coordinates.latitude,
                longitude = coordinates.longitude,
                "Location resolved"
            );
            Ok(coordinates)
        }
        Err(e) => {
            tracing::warn!(error = ?e, "Location request failed");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedProvider {
        supported: bool,
        result: Result<Coordinates, LocationError>,
    }

    #[async_trait]
    impl LocationProvider for FixedProvider {
        fn is_supported(&self) -> bool {
            self.supported
        }

        async fn current_position(&self) -> Result<Coordinates, LocationError> {
            self.result
        }
    }

    #[tokio::test]
    async fn test_resolved_position() {
        let provider = FixedProvider {
            supported: true,
            result: Ok(Coordinates {
                latitude: 21.19,
                longitude: 81.28,
            }),
        };
        let coordinates = request_location(&provider).await.unwrap();
        assert_eq!(coordinates.latitude, 21.19);
    }

    #[tokio::test]
    async fn test_unsupported() {
        let provider = FixedProvider {
            supported: false,
            result: Err(LocationError::Unknown),
        };
        let err = request_location(&provider).await.unwrap_err();
        assert!(matches!(err, AgentError::Location(LocationError::Unsupported)));
        assert_eq!(err.to_string(), "Geolocation is not supported by your browser.");
    }

    #[tokio::test]
    async fn test_permission_denied_message() {
        let provider = FixedProvider {
            supported: true,
            result: Err(LocationError::PermissionDenied),
        };
        let err = request_location(&provider).await.unwrap_err();
        assert_eq!(err.to_string(), "You denied the request for Geolocation.");
    }
}
