//! Simulated ride backend configuration

use serde::Deserialize;
use std::time::Duration;

use crate::adapters::SimulatedRideBackend;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BackendConfig {
    /// Time before the simulated backend assigns a driver, in milliseconds
    pub assignment_delay_ms: u64,

    /// Driver ETA reported on assignment, in seconds
    pub driver_eta_secs: u64,
}

impl BackendConfig {
    pub fn simulated(&self) -> SimulatedRideBackend {
        SimulatedRideBackend::new(
            Duration::from_millis(self.assignment_delay_ms),
            Duration::from_secs(self.driver_eta_secs),
        )
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            assignment_delay_ms: 3000,
            driver_eta_secs: 240,
        }
    }
}
