//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `RIDE_FLOW` prefix and
//! `__` between nested keys. Every section has defaults, so an empty
//! environment yields a working offline setup.
//!
//! # Example
//!
//! ```no_run
//! use ride_flow::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod backend;
mod error;
mod flow;
mod geocoding;
mod routing;
mod telemetry;

pub use backend::BackendConfig;
pub use error::{ConfigError, ValidationError};
pub use flow::FlowConfig;
pub use geocoding::GeocodingConfig;
pub use routing::{RoutingConfig, RoutingProvider};
pub use telemetry::{LogFormat, TelemetryConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Ride flow timings
    #[serde(default)]
    pub flow: FlowConfig,

    /// Routing provider (straight-line or OSRM)
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Address lookup (Nominatim)
    #[serde(default)]
    pub geocoding: GeocodingConfig,

    /// Simulated ride backend
    #[serde(default)]
    pub backend: BackendConfig,

    /// Logging
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `RIDE_FLOW` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `RIDE_FLOW__FLOW__SETTLE_DELAY_MS=500` -> `flow.settle_delay_ms = 500`
    /// - `RIDE_FLOW__ROUTING__PROVIDER=osrm` -> `routing.provider = osrm`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("RIDE_FLOW")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.flow.validate()?;
        self.routing.validate()?;
        self.geocoding.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }
}
