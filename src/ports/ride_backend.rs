//! RideBackendService port - Interface for the ride/driver-matching backend.
//!
//! The backend owns driver matching. A production implementation is
//! expected to enforce its own search timeout and report `Failed` rather
//! than hanging; the core additionally bounds its own wait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::domain::foundation::RideId;
use crate::domain::ride::{DriverInfo, LocationPoint};

/// Port for ride lifecycle calls against the backend.
#[async_trait]
pub trait RideBackendService: Send + Sync {
    /// Creates a ride request.
    async fn request_ride(
        &self,
        pickup: &LocationPoint,
        destination: &LocationPoint,
    ) -> Result<RideRequestReceipt, BackendError>;

    /// Fetches the current status of a ride, including the assigned driver.
    async fn get_ride_status(&self, ride_id: &RideId) -> Result<RideStatusReport, BackendError>;

    /// Cancels a ride. Best-effort from the caller's perspective.
    async fn cancel_ride(&self, ride_id: &RideId) -> Result<(), BackendError>;
}

/// Backend-side status of a ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    Searching,
    DriverAssigned,
    Cancelled,
    Failed,
}

/// Response to a ride creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct RideRequestReceipt {
    pub ride_id: RideId,
    pub status: RideStatus,
}

impl RideRequestReceipt {
    pub fn new(ride_id: RideId, status: RideStatus) -> Self {
        Self { ride_id, status }
    }
}

/// Response to a status poll.
#[derive(Debug, Clone, PartialEq)]
pub struct RideStatusReport {
    pub status: RideStatus,
    pub driver: Option<DriverInfo>,
    pub estimated_arrival: Option<Duration>,
}

impl RideStatusReport {
    /// A report for a ride still waiting for a driver.
    pub fn searching() -> Self {
        Self {
            status: RideStatus::Searching,
            driver: None,
            estimated_arrival: None,
        }
    }

    /// A report for a ride with an assigned driver.
    pub fn assigned(driver: DriverInfo, estimated_arrival: Option<Duration>) -> Self {
        Self {
            status: RideStatus::DriverAssigned,
            driver: Some(driver),
            estimated_arrival,
        }
    }

    /// A report for a ride in a terminal backend status.
    pub fn terminal(status: RideStatus) -> Self {
        Self {
            status,
            driver: None,
            estimated_arrival: None,
        }
    }
}

/// Errors from the ride backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("ride not found: {0}")]
    RideNotFound(RideId),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn RideBackendService) {}

    #[test]
    fn searching_report_has_no_driver() {
        let report = RideStatusReport::searching();
        assert_eq!(report.status, RideStatus::Searching);
        assert!(report.driver.is_none());
    }

    #[test]
    fn status_serializes_to_snake_case() {
        assert_eq!(
            serde_json::to_string(&RideStatus::DriverAssigned).unwrap(),
            "\"driver_assigned\""
        );
    }

    #[test]
    fn errors_display_correctly() {
        let err = BackendError::RideNotFound(RideId::new("r9").unwrap());
        assert_eq!(err.to_string(), "ride not found: r9");
    }
}
