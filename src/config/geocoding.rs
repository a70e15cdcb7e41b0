//! Geocoding configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::routing::is_http_url;
use crate::adapters::NominatimConfig;

/// Geocoding configuration (Nominatim)
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Enables the set-from-address operations
    pub enabled: bool,

    pub base_url: String,

    /// Identifying User-Agent, required by Nominatim's usage policy
    pub user_agent: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl GeocodingConfig {
    pub fn nominatim_config(&self) -> NominatimConfig {
        NominatimConfig::new(self.base_url.clone(), self.user_agent.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }
        if !is_http_url(&self.base_url) {
            return Err(ValidationError::InvalidUrl("geocoding"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ValidationError::MissingRequired(
                "RIDE_FLOW__GEOCODING__USER_AGENT",
            ));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout("geocoding"));
        }
        Ok(())
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("ride-flow/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 10,
        }
    }
}
