//! Routing provider configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::{OsrmConfig, DEFAULT_SPEED_MPS};

/// Which routing implementation to use
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoutingProvider {
    /// Offline great-circle estimate
    #[default]
    StraightLine,
    /// OSRM HTTP API
    Osrm,
}

/// Routing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub provider: RoutingProvider,

    /// OSRM server base URL
    pub base_url: String,

    /// OSRM routing profile
    pub profile: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Access token for hosted OSRM-compatible services
    pub api_key: Option<Secret<String>>,

    /// Average speed used by straight-line routing, in metres per second
    pub average_speed_mps: f64,
}

impl RoutingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn osrm_config(&self) -> OsrmConfig {
        let config = OsrmConfig::new(self.base_url.clone())
            .with_profile(self.profile.clone())
            .with_timeout(self.timeout());
        match &self.api_key {
            Some(key) => config.with_api_key(key.clone()),
            None => config,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.provider {
            RoutingProvider::Osrm => {
                if !is_http_url(&self.base_url) {
                    return Err(ValidationError::InvalidUrl("routing"));
                }
                if self.profile.trim().is_empty() {
                    return Err(ValidationError::MissingRequired("RIDE_FLOW__ROUTING__PROFILE"));
                }
                if self.timeout_secs == 0 || self.timeout_secs > 120 {
                    return Err(ValidationError::InvalidTimeout("routing"));
                }
            }
            RoutingProvider::StraightLine => {
                if !self.average_speed_mps.is_finite() || self.average_speed_mps <= 0.0 {
                    return Err(ValidationError::InvalidSpeed);
                }
            }
        }
        Ok(())
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            provider: RoutingProvider::default(),
            base_url: "https://router.project-osrm.org".to_string(),
            profile: "driving".to_string(),
            timeout_secs: 10,
            api_key: None,
            average_speed_mps: DEFAULT_SPEED_MPS,
        }
    }
}

pub(super) fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
