//! Location capability trait

use async_trait::async_trait;

use crate::location::{Coordinates, LocationError};

/// Device geolocation
#[async_trait]
pub trait LocationProvider: Send + Sync + 'static {
    /// Whether the host offers geolocation at all
    fn is_supported(&self) -> bool;

    /// Resolve the current position
    async fn current_position(&self) -> std::result::Result<Coordinates, LocationError>;
}
