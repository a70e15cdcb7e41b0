//! Mock collaborators for testing.
//!
//! Configurable implementations of the routing, ride backend and geocoding
//! ports, so flows can run without calling real services.
//!
//! # Features
//!
//! - Scripted responses, consumed in order
//! - Per-response delays for racing and timeout tests
//! - Error injection
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let routing = MockRoutingService::new()
//!     .with_route_after(slow_route, Duration::from_secs(5))
//!     .with_route(fast_route);
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::foundation::RideId;
use crate::domain::ride::{LocationPoint, RouteInfo};
use crate::ports::{
    BackendError, GeocodedAddress, GeocodingError, GeocodingService, RideBackendService,
    RideRequestReceipt, RideStatus, RideStatusReport, RoutingError, RoutingService,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A queued response and how long to wait before returning it.
#[derive(Debug, Clone)]
struct Scripted<T> {
    value: T,
    delay: Duration,
}

impl<T> Scripted<T> {
    fn now(value: T) -> Self {
        Self {
            value,
            delay: Duration::ZERO,
        }
    }

    fn after(value: T, delay: Duration) -> Self {
        Self { value, delay }
    }

    async fn deliver(self) -> T {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        self.value
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Routing
// ════════════════════════════════════════════════════════════════════════════

/// Mock routing service.
///
/// Without scripted responses every call returns a 1 km, 2 minute route.
#[derive(Debug, Clone, Default)]
pub struct MockRoutingService {
    responses: Arc<Mutex<VecDeque<Scripted<Result<RouteInfo, RoutingError>>>>>,
    calls: Arc<Mutex<Vec<(LocationPoint, LocationPoint)>>>,
}

impl MockRoutingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an immediate successful route.
    pub fn with_route(self, route: RouteInfo) -> Self {
        lock(&self.responses).push_back(Scripted::now(Ok(route)));
        self
    }

    /// Queues a successful route delivered after `delay`.
    pub fn with_route_after(self, route: RouteInfo, delay: Duration) -> Self {
        lock(&self.responses).push_back(Scripted::after(Ok(route), delay));
        self
    }

    /// Queues an immediate error.
    pub fn with_error(self, error: RoutingError) -> Self {
        lock(&self.responses).push_back(Scripted::now(Err(error)));
        self
    }

    /// Queues an error delivered after `delay`.
    pub fn with_error_after(self, error: RoutingError, delay: Duration) -> Self {
        lock(&self.responses).push_back(Scripted::after(Err(error), delay));
        self
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns the `(from, to)` pairs of every call so far.
    pub fn calls(&self) -> Vec<(LocationPoint, LocationPoint)> {
        lock(&self.calls).clone()
    }

    fn default_route() -> Result<RouteInfo, RoutingError> {
        RouteInfo::new(1000.0, 120.0).map_err(|e| RoutingError::Parse(e.to_string()))
    }
}

#[async_trait]
impl RoutingService for MockRoutingService {
    async fn calculate_route(
        &self,
        from: &LocationPoint,
        to: &LocationPoint,
    ) -> Result<RouteInfo, RoutingError> {
        lock(&self.calls).push((from.clone(), to.clone()));
        let next = lock(&self.responses).pop_front();
        match next {
            Some(scripted) => scripted.deliver().await,
            None => Self::default_route(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Ride backend
// ════════════════════════════════════════════════════════════════════════════

/// Mock ride backend.
///
/// Requests succeed with a generated ride id unless configured otherwise.
/// Status polls return scripted reports in order, then keep reporting
/// `Searching` with no driver.
#[derive(Debug, Clone, Default)]
pub struct MockRideBackend {
    ride_ids: Arc<Mutex<VecDeque<RideId>>>,
    request_responses: Arc<Mutex<VecDeque<Scripted<Result<RideStatus, BackendError>>>>>,
    statuses: Arc<Mutex<VecDeque<Scripted<Result<RideStatusReport, BackendError>>>>>,
    cancel_error: Arc<Mutex<Option<BackendError>>>,
    requests: Arc<Mutex<Vec<(LocationPoint, LocationPoint)>>>,
    polls: Arc<Mutex<Vec<RideId>>>,
    cancelled: Arc<Mutex<Vec<RideId>>>,
}

impl MockRideBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `ride_id` for the next accepted request.
    pub fn with_ride_id(self, ride_id: RideId) -> Self {
        lock(&self.ride_ids).push_back(ride_id);
        self
    }

    /// Makes the next request fail.
    pub fn with_request_error(self, error: BackendError) -> Self {
        lock(&self.request_responses).push_back(Scripted::now(Err(error)));
        self
    }

    /// Makes the next request succeed only after `delay`.
    pub fn with_request_delay(self, delay: Duration) -> Self {
        lock(&self.request_responses).push_back(Scripted::after(Ok(RideStatus::Searching), delay));
        self
    }

    /// Makes the next request succeed with the given initial status.
    pub fn with_request_status(self, status: RideStatus) -> Self {
        lock(&self.request_responses).push_back(Scripted::now(Ok(status)));
        self
    }

    /// Queues a status report for the next poll.
    pub fn with_status(self, report: RideStatusReport) -> Self {
        lock(&self.statuses).push_back(Scripted::now(Ok(report)));
        self
    }

    /// Queues a status report delivered after `delay`.
    pub fn with_status_after(self, report: RideStatusReport, delay: Duration) -> Self {
        lock(&self.statuses).push_back(Scripted::after(Ok(report), delay));
        self
    }

    /// Queues a failing status poll.
    pub fn with_status_error(self, error: BackendError) -> Self {
        lock(&self.statuses).push_back(Scripted::now(Err(error)));
        self
    }

    /// Makes every cancellation fail with `error`.
    pub fn failing_cancel(self, error: BackendError) -> Self {
        *lock(&self.cancel_error) = Some(error);
        self
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn status_polls(&self) -> usize {
        lock(&self.polls).len()
    }

    /// Ride ids for which a cancellation was attempted, failed or not.
    pub fn cancelled_rides(&self) -> Vec<RideId> {
        lock(&self.cancelled).clone()
    }
}

#[async_trait]
impl RideBackendService for MockRideBackend {
    async fn request_ride(
        &self,
        pickup: &LocationPoint,
        destination: &LocationPoint,
    ) -> Result<RideRequestReceipt, BackendError> {
        lock(&self.requests).push((pickup.clone(), destination.clone()));
        let next = lock(&self.request_responses).pop_front();
        let status = match next {
            Some(scripted) => scripted.deliver().await?,
            None => RideStatus::Searching,
        };
        let ride_id = lock(&self.ride_ids)
            .pop_front()
            .unwrap_or_else(RideId::generate);
        Ok(RideRequestReceipt::new(ride_id, status))
    }

    async fn get_ride_status(&self, ride_id: &RideId) -> Result<RideStatusReport, BackendError> {
        lock(&self.polls).push(ride_id.clone());
        let next = lock(&self.statuses).pop_front();
        match next {
            Some(scripted) => scripted.deliver().await,
            None => Ok(RideStatusReport::searching()),
        }
    }

    async fn cancel_ride(&self, ride_id: &RideId) -> Result<(), BackendError> {
        lock(&self.cancelled).push(ride_id.clone());
        match lock(&self.cancel_error).clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Geocoding
// ════════════════════════════════════════════════════════════════════════════

/// Mock geocoder keyed by exact address text. Unknown addresses are
/// reported as not found.
#[derive(Debug, Clone, Default)]
pub struct MockGeocoder {
    answers: Arc<Mutex<HashMap<String, Result<GeocodedAddress, GeocodingError>>>>,
    lookups: Arc<Mutex<Vec<String>>>,
    delay: Duration,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(self, address: impl Into<String>, result: GeocodedAddress) -> Self {
        lock(&self.answers).insert(address.into(), Ok(result));
        self
    }

    pub fn with_error(self, address: impl Into<String>, error: GeocodingError) -> Self {
        lock(&self.answers).insert(address.into(), Err(error));
        self
    }

    /// Delays every lookup by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        lock(&self.lookups).clone()
    }
}

#[async_trait]
impl GeocodingService for MockGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, GeocodingError> {
        lock(&self.lookups).push(address.to_string());
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        if address.trim().is_empty() {
            return Err(GeocodingError::EmptyAddress);
        }
        lock(&self.answers)
            .get(address)
            .cloned()
            .unwrap_or_else(|| Err(GeocodingError::NotFound(address.to_string())))
    }
}
