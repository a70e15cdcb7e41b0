//! Ride flow timing configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::FlowTimings;

/// Ride flow timings and channel sizes
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FlowConfig {
    /// Pause between driver assignment and en route, in milliseconds
    pub settle_delay_ms: u64,

    /// Interval between status polls while searching, in milliseconds
    pub status_poll_interval_ms: u64,

    /// Upper bound on the driver search, in seconds
    pub driver_search_timeout_secs: u64,

    /// Time in progress before approaching the destination, in seconds
    pub approach_delay_secs: u64,

    /// Time approaching before the ride completes, in seconds
    pub arrival_delay_secs: u64,

    /// Driver ETA used when the backend reports none, in seconds
    pub default_driver_eta_secs: u64,

    /// Capacity of driver signal channels
    pub signal_buffer: usize,
}

impl FlowConfig {
    pub fn to_timings(&self) -> FlowTimings {
        FlowTimings {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            status_poll_interval: Duration::from_millis(self.status_poll_interval_ms),
            driver_search_timeout: Duration::from_secs(self.driver_search_timeout_secs),
            approach_delay: Duration::from_secs(self.approach_delay_secs),
            arrival_delay: Duration::from_secs(self.arrival_delay_secs),
            default_driver_eta: Duration::from_secs(self.default_driver_eta_secs),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.status_poll_interval_ms == 0 {
            return Err(ValidationError::InvalidPollInterval);
        }
        if self.driver_search_timeout_secs.saturating_mul(1000) < self.status_poll_interval_ms {
            return Err(ValidationError::SearchTimeoutTooShort);
        }
        if self.signal_buffer == 0 {
            return Err(ValidationError::InvalidSignalBuffer);
        }
        Ok(())
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 2000,
            status_poll_interval_ms: 2000,
            driver_search_timeout_secs: 30,
            approach_delay_secs: 8,
            arrival_delay_secs: 4,
            default_driver_eta_secs: 300,
            signal_buffer: 16,
        }
    }
}
