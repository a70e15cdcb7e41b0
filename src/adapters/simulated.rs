//! In-memory simulated ride backend.
//!
//! Accepts every ride request and assigns a driver from a fixed roster once
//! the configured assignment delay has elapsed. Useful for:
//! - The demo binary
//! - Development without a dispatch service
//!
//! Does not persist rides across restarts.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::foundation::{Coordinate, DriverId, RideId};
use crate::domain::ride::{DriverInfo, LocationPoint, Vehicle};
use crate::ports::{
    BackendError, RideBackendService, RideRequestReceipt, RideStatus, RideStatusReport,
};

#[derive(Debug, Clone)]
struct SimulatedRide {
    requested_at: Instant,
    pickup: Coordinate,
    status: RideStatus,
    driver: Option<DriverInfo>,
}

/// Simulated implementation of the RideBackendService port.
pub struct SimulatedRideBackend {
    rides: Mutex<HashMap<RideId, SimulatedRide>>,
    roster: Vec<DriverInfo>,
    next_driver: AtomicUsize,
    assignment_delay: Duration,
    driver_eta: Duration,
}

impl Default for SimulatedRideBackend {
    fn default() -> Self {
        Self::new(Duration::from_secs(3), Duration::from_secs(240))
    }
}

impl SimulatedRideBackend {
    /// Creates a backend with the built-in roster.
    pub fn new(assignment_delay: Duration, driver_eta: Duration) -> Self {
        Self {
            rides: Mutex::new(HashMap::new()),
            roster: default_roster(),
            next_driver: AtomicUsize::new(0),
            assignment_delay,
            driver_eta,
        }
    }

    /// Replaces the roster. With an empty roster no driver is ever assigned.
    pub fn with_roster(mut self, roster: Vec<DriverInfo>) -> Self {
        self.roster = roster;
        self
    }

    /// Number of rides known to the backend.
    pub fn ride_count(&self) -> usize {
        self.rides().len()
    }

    fn rides(&self) -> MutexGuard<'_, HashMap<RideId, SimulatedRide>> {
        self.rides.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pick_driver(&self, near: Coordinate) -> Option<DriverInfo> {
        if self.roster.is_empty() {
            return None;
        }
        let index = self.next_driver.fetch_add(1, Ordering::Relaxed) % self.roster.len();
        Some(
            self.roster[index]
                .clone()
                .with_location(near)
                .with_eta(self.driver_eta),
        )
    }
}

#[async_trait]
impl RideBackendService for SimulatedRideBackend {
    async fn request_ride(
        &self,
        pickup: &LocationPoint,
        _destination: &LocationPoint,
    ) -> Result<RideRequestReceipt, BackendError> {
        let ride_id = RideId::generate();
        self.rides().insert(
            ride_id.clone(),
            SimulatedRide {
                requested_at: Instant::now(),
                pickup: *pickup.coordinate(),
                status: RideStatus::Searching,
                driver: None,
            },
        );
        debug!(ride_id = %ride_id, "simulated ride created");
        Ok(RideRequestReceipt::new(ride_id, RideStatus::Searching))
    }

    async fn get_ride_status(&self, ride_id: &RideId) -> Result<RideStatusReport, BackendError> {
        let mut rides = self.rides();
        let ride = rides
            .get_mut(ride_id)
            .ok_or_else(|| BackendError::RideNotFound(ride_id.clone()))?;

        if ride.status == RideStatus::Searching
            && ride.requested_at.elapsed() >= self.assignment_delay
        {
            if let Some(driver) = self.pick_driver(ride.pickup) {
                debug!(ride_id = %ride_id, driver_id = %driver.id(), "simulated driver assigned");
                ride.status = RideStatus::DriverAssigned;
                ride.driver = Some(driver);
            }
        }

        Ok(match (ride.status, &ride.driver) {
            (RideStatus::DriverAssigned, Some(driver)) => {
                RideStatusReport::assigned(driver.clone(), Some(self.driver_eta))
            }
            (RideStatus::Searching, _) => RideStatusReport::searching(),
            (status, _) => RideStatusReport::terminal(status),
        })
    }

    async fn cancel_ride(&self, ride_id: &RideId) -> Result<(), BackendError> {
        let mut rides = self.rides();
        let ride = rides
            .get_mut(ride_id)
            .ok_or_else(|| BackendError::RideNotFound(ride_id.clone()))?;
        ride.status = RideStatus::Cancelled;
        debug!(ride_id = %ride_id, "simulated ride cancelled");
        Ok(())
    }
}

fn default_roster() -> Vec<DriverInfo> {
    [
        ("drv-001", "Alex Morgan", 4.9, ("Toyota", "Prius", "Silver", "7ABC123")),
        ("drv-002", "Priya Shah", 4.8, ("Honda", "Civic", "Blue", "8XYZ789")),
        ("drv-003", "Diego Alvarez", 4.7, ("Tesla", "Model 3", "White", "5EV4321")),
    ]
    .into_iter()
    .filter_map(|(id, name, rating, (make, model, color, plate))| {
        let id = DriverId::new(id).ok()?;
        DriverInfo::new(id, name, rating, Vehicle::new(make, model, color, plate)).ok()
    })
    .collect()
}
