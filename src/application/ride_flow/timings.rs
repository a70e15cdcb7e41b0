//! Fixed durations used by the ride sequence.

use std::time::Duration;

/// Durations for the simulated parts of a ride and the bounded driver search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowTimings {
    /// Pause between driver assignment and the driver setting off.
    pub settle_delay: Duration,

    /// Interval between ride status polls while searching for a driver.
    pub status_poll_interval: Duration,

    /// Upper bound on the whole driver search.
    pub driver_search_timeout: Duration,

    /// Time in progress before approaching the destination.
    pub approach_delay: Duration,

    /// Time approaching the destination before the ride completes.
    pub arrival_delay: Duration,

    /// Driver ETA used when neither the backend nor the driver reports one.
    pub default_driver_eta: Duration,
}

impl Default for FlowTimings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(2),
            status_poll_interval: Duration::from_secs(2),
            driver_search_timeout: Duration::from_secs(30),
            approach_delay: Duration::from_secs(8),
            arrival_delay: Duration::from_secs(4),
            default_driver_eta: Duration::from_secs(300),
        }
    }
}

impl FlowTimings {
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_status_poll_interval(mut self, interval: Duration) -> Self {
        self.status_poll_interval = interval;
        self
    }

    pub fn with_driver_search_timeout(mut self, timeout: Duration) -> Self {
        self.driver_search_timeout = timeout;
        self
    }

    pub fn with_approach_delay(mut self, delay: Duration) -> Self {
        self.approach_delay = delay;
        self
    }

    pub fn with_arrival_delay(mut self, delay: Duration) -> Self {
        self.arrival_delay = delay;
        self
    }

    pub fn with_default_driver_eta(mut self, eta: Duration) -> Self {
        self.default_driver_eta = eta;
        self
    }

    /// Simulated duration of the pickup-to-destination leg.
    pub fn simulated_trip(&self) -> Duration {
        self.approach_delay + self.arrival_delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_seconds_scale() {
        let timings = FlowTimings::default();
        assert_eq!(timings.settle_delay, Duration::from_secs(2));
        assert_eq!(timings.driver_search_timeout, Duration::from_secs(30));
        assert_eq!(timings.simulated_trip(), Duration::from_secs(12));
    }

    #[test]
    fn builder_methods_override_fields() {
        let timings = FlowTimings::default()
            .with_settle_delay(Duration::from_millis(10))
            .with_arrival_delay(Duration::from_secs(1));
        assert_eq!(timings.settle_delay, Duration::from_millis(10));
        assert_eq!(timings.arrival_delay, Duration::from_secs(1));
        assert_eq!(timings.approach_delay, Duration::from_secs(8));
    }
}
