//! GeocodingService port - Interface for address lookup.
//!
//! Used by the address-entry layer; the flow controller only needs it for
//! the optional set-from-address operations.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::Coordinate;
use crate::domain::ride::LocationPoint;

/// Port for forward geocoding.
#[async_trait]
pub trait GeocodingService: Send + Sync {
    /// Resolves a free-form address to a coordinate and display name.
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, GeocodingError>;
}

/// A resolved address.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    pub coordinate: Coordinate,
    pub display_name: String,
}

impl GeocodedAddress {
    pub fn new(coordinate: Coordinate, display_name: impl Into<String>) -> Self {
        Self {
            coordinate,
            display_name: display_name.into(),
        }
    }

    /// Converts into the location value used by ride states.
    pub fn into_location(self) -> LocationPoint {
        LocationPoint::named(self.coordinate, self.display_name)
    }
}

/// Errors from geocoding providers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodingError {
    #[error("address cannot be empty")]
    EmptyAddress,

    #[error("no results for address: {0}")]
    NotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("parse error: {0}")]
    Parse(String),
}
