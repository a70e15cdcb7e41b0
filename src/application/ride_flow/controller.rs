//! RideFlowController - owns the current ride state and drives the ride.
//!
//! Rider intents and collaborator responses are turned into target states,
//! validated by `RideStateMachine`, and published to observers.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};

use crate::domain::foundation::RideId;
use crate::domain::ride::{
    DriverInfo, LocationPoint, RideErrorKind, RideState, RideStateKind, RideStateMachine,
    RouteInfo,
};
use crate::ports::{GeocodingService, RideBackendService, RideStatus, RoutingService};

use super::{DriverSignal, FlowError, FlowTimings};

/// Default capacity of the driver signal channel.
pub const DEFAULT_SIGNAL_BUFFER: usize = 16;

const TRANSITION_CHANNEL_CAPACITY: usize = 64;

/// A transition applied by the controller, as seen by observers.
#[derive(Debug, Clone, PartialEq)]
pub struct RideTransition {
    pub from: RideStateKind,
    pub to: RideState,
}

/// Whether an asynchronous operation's result was applied to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// The result (success or error state) became the current state.
    Applied,
    /// The result arrived after the flow moved on and was dropped.
    Discarded,
}

impl FlowOutcome {
    fn from_applied(applied: bool) -> Self {
        if applied {
            FlowOutcome::Applied
        } else {
            FlowOutcome::Discarded
        }
    }
}

#[derive(Debug, Default)]
struct FlowCore {
    state: RideState,
    /// Bumped whenever the flow is abandoned or restarted; continuations
    /// captured under an older generation are stale.
    generation: u64,
    /// Bumped on every location edit; only the latest route request applies.
    route_token: u64,
    /// Token of the route calculation still awaiting its result.
    pending_route: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
struct RouteTicket {
    token: u64,
    generation: u64,
}

impl FlowCore {
    fn issue_route_ticket(&mut self) -> RouteTicket {
        self.route_token += 1;
        RouteTicket {
            token: self.route_token,
            generation: self.generation,
        }
    }

    fn holds_ticket(&self, ticket: RouteTicket) -> bool {
        self.route_token == ticket.token && self.generation == ticket.generation
    }

    fn route_in_flight(&self) -> bool {
        self.state.kind() == RideStateKind::SelectingLocations
            && self.pending_route == Some(self.route_token)
    }
}

/// Counts an address lookup as in flight until dropped.
struct LookupGuard<'a>(&'a AtomicUsize);

impl<'a> LookupGuard<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LookupGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Payload shared by every state that has an assigned driver.
struct RideContext {
    ride_id: RideId,
    driver: DriverInfo,
    pickup: LocationPoint,
    destination: LocationPoint,
}

impl RideContext {
    fn of(state: &RideState) -> Option<Self> {
        Some(Self {
            ride_id: state.ride_id()?.clone(),
            driver: state.driver()?.clone(),
            pickup: state.pickup()?.clone(),
            destination: state.destination()?.clone(),
        })
    }

    fn en_route(self, eta: Duration) -> RideState {
        RideState::DriverEnRoute {
            ride_id: self.ride_id,
            driver: self.driver,
            eta,
            pickup: self.pickup,
            destination: self.destination,
        }
    }

    fn arriving(self) -> RideState {
        RideState::DriverArriving {
            ride_id: self.ride_id,
            driver: self.driver,
            pickup: self.pickup,
            destination: self.destination,
        }
    }

    fn in_progress(self, eta: Duration) -> RideState {
        RideState::RideInProgress {
            ride_id: self.ride_id,
            driver: self.driver,
            eta,
            pickup: self.pickup,
            destination: self.destination,
        }
    }

    fn approaching(self) -> RideState {
        RideState::ApproachingDestination {
            ride_id: self.ride_id,
            driver: self.driver,
            pickup: self.pickup,
            destination: self.destination,
        }
    }

    fn completed(self) -> RideState {
        RideState::RideCompleted {
            ride_id: self.ride_id,
            driver: self.driver,
            pickup: self.pickup,
            destination: self.destination,
        }
    }
}

enum DriverSearch {
    Assigned {
        driver: DriverInfo,
        estimated_arrival: Option<Duration>,
    },
    Failed(String),
    TimedOut,
    Stale,
}

struct Shared {
    core: Mutex<FlowCore>,
    publisher: watch::Sender<RideState>,
    transitions: broadcast::Sender<RideTransition>,
    routing: Arc<dyn RoutingService>,
    backend: Arc<dyn RideBackendService>,
    geocoder: Option<Arc<dyn GeocodingService>>,
    lookups_in_flight: AtomicUsize,
    timings: FlowTimings,
    signal_buffer: usize,
}

/// Builder for [`RideFlowController`].
pub struct RideFlowBuilder {
    routing: Arc<dyn RoutingService>,
    backend: Arc<dyn RideBackendService>,
    geocoder: Option<Arc<dyn GeocodingService>>,
    timings: FlowTimings,
    signal_buffer: usize,
}

impl RideFlowBuilder {
    /// Sets the durations used by the ride sequence.
    pub fn timings(mut self, timings: FlowTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Enables the set-from-address operations.
    pub fn geocoder(mut self, geocoder: Arc<dyn GeocodingService>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Sets the capacity of channels returned by `signal_channel`.
    pub fn signal_buffer(mut self, capacity: usize) -> Self {
        self.signal_buffer = capacity.max(1);
        self
    }

    pub fn build(self) -> RideFlowController {
        let (publisher, _) = watch::channel(RideState::Idle);
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);
        RideFlowController {
            shared: Arc::new(Shared {
                core: Mutex::new(FlowCore::default()),
                publisher,
                transitions,
                routing: self.routing,
                backend: self.backend,
                geocoder: self.geocoder,
                lookups_in_flight: AtomicUsize::new(0),
                timings: self.timings,
                signal_buffer: self.signal_buffer,
            }),
        }
    }
}

/// Orchestrates a single rider's ride.
///
/// Cheap to clone; clones share the same state. Operations that start
/// background work (`update_pickup`, `update_destination`,
/// `transition_to_ride_in_progress`, `signal_channel`) return
/// `FlowError::NoRuntime` when called outside a Tokio runtime.
#[derive(Clone)]
pub struct RideFlowController {
    shared: Arc<Shared>,
}

impl fmt::Debug for RideFlowController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core();
        f.debug_struct("RideFlowController")
            .field("state", &core.state.kind())
            .field("generation", &core.generation)
            .finish()
    }
}

impl RideFlowController {
    /// Creates a controller with default timings and no geocoder.
    pub fn new(routing: Arc<dyn RoutingService>, backend: Arc<dyn RideBackendService>) -> Self {
        Self::builder(routing, backend).build()
    }

    pub fn builder(
        routing: Arc<dyn RoutingService>,
        backend: Arc<dyn RideBackendService>,
    ) -> RideFlowBuilder {
        RideFlowBuilder {
            routing,
            backend,
            geocoder: None,
            timings: FlowTimings::default(),
            signal_buffer: DEFAULT_SIGNAL_BUFFER,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Observation
    // ─────────────────────────────────────────────────────────────────────────

    pub fn current_state(&self) -> RideState {
        self.core().state.clone()
    }

    /// Receiver that always holds the latest published state.
    pub fn subscribe(&self) -> watch::Receiver<RideState> {
        self.shared.publisher.subscribe()
    }

    /// Receiver for every transition applied from now on, in order.
    pub fn transitions(&self) -> broadcast::Receiver<RideTransition> {
        self.shared.transitions.subscribe()
    }

    pub fn current_driver(&self) -> Option<DriverInfo> {
        self.read(|state| state.driver().cloned())
    }

    pub fn eta(&self) -> Option<Duration> {
        self.read(RideState::eta)
    }

    pub fn pickup(&self) -> Option<LocationPoint> {
        self.read(|state| state.pickup().cloned())
    }

    pub fn destination(&self) -> Option<LocationPoint> {
        self.read(|state| state.destination().cloned())
    }

    pub fn route(&self) -> Option<RouteInfo> {
        self.read(|state| state.route().cloned())
    }

    pub fn ride_id(&self) -> Option<RideId> {
        self.read(|state| state.ride_id().cloned())
    }

    /// True while a calculated route awaits the rider's confirmation.
    pub fn should_show_confirmation(&self) -> bool {
        self.read(|state| state.kind() == RideStateKind::RouteReady)
    }

    /// True while a network call is in flight: an address lookup, the
    /// current route calculation, the ride request, or the driver search.
    pub fn is_loading(&self) -> bool {
        if self.shared.lookups_in_flight.load(Ordering::SeqCst) > 0 {
            return true;
        }
        let core = self.core();
        core.route_in_flight()
            || matches!(
                core.state.kind(),
                RideStateKind::SubmittingRequest | RideStateKind::SearchingForDriver
            )
    }

    pub fn flow_generation(&self) -> u64 {
        self.core().generation
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Location selection
    // ─────────────────────────────────────────────────────────────────────────

    /// Sets or clears the pickup. Starts route calculation in the background
    /// once both points are known.
    ///
    /// # Errors
    ///
    /// - `NotAllowed` unless idle or selecting locations
    /// - `NoRuntime` when a route calculation is due outside a runtime
    pub fn update_pickup(&self, location: Option<LocationPoint>) -> Result<(), FlowError> {
        self.update_locations("update_pickup", |pickup, _| *pickup = location)
    }

    /// Sets or clears the destination. Starts route calculation in the
    /// background once both points are known.
    ///
    /// # Errors
    ///
    /// - `NotAllowed` unless idle or selecting locations
    /// - `NoRuntime` when a route calculation is due outside a runtime
    pub fn update_destination(&self, location: Option<LocationPoint>) -> Result<(), FlowError> {
        self.update_locations("update_destination", |_, destination| {
            *destination = location
        })
    }

    /// Geocodes `address` and uses the result as pickup.
    pub async fn set_pickup_from_address(&self, address: &str) -> Result<FlowOutcome, FlowError> {
        self.set_location_from_address("set_pickup_from_address", address, Self::update_pickup)
            .await
    }

    /// Geocodes `address` and uses the result as destination.
    pub async fn set_destination_from_address(
        &self,
        address: &str,
    ) -> Result<FlowOutcome, FlowError> {
        self.set_location_from_address(
            "set_destination_from_address",
            address,
            Self::update_destination,
        )
        .await
    }

    /// Goes back from a ready route to editing locations.
    pub fn return_to_location_selection(&self) -> Result<(), FlowError> {
        let mut core = self.core();
        let target = match &core.state {
            RideState::RouteReady {
                pickup,
                destination,
                ..
            } => RideState::SelectingLocations {
                pickup: Some(pickup.clone()),
                destination: Some(destination.clone()),
            },
            other => {
                return Err(FlowError::not_allowed(
                    "return_to_location_selection",
                    other.kind(),
                ))
            }
        };
        self.commit(&mut core, target)?;
        core.issue_route_ticket();
        Ok(())
    }

    /// Calculates the route between two points and applies the result.
    ///
    /// The points become the current selection. If another calculation is
    /// started before this one finishes, this result is discarded.
    ///
    /// # Errors
    ///
    /// - `NotAllowed` unless selecting locations
    pub async fn calculate_route(
        &self,
        pickup: LocationPoint,
        destination: LocationPoint,
    ) -> Result<FlowOutcome, FlowError> {
        let ticket = {
            let mut core = self.core();
            let kind = core.state.kind();
            if kind != RideStateKind::SelectingLocations {
                return Err(FlowError::not_allowed("calculate_route", kind));
            }
            let selection = RideState::SelectingLocations {
                pickup: Some(pickup.clone()),
                destination: Some(destination.clone()),
            };
            if core.state != selection {
                self.commit(&mut core, selection)?;
            }
            let ticket = core.issue_route_ticket();
            core.pending_route = Some(ticket.token);
            ticket
        };
        Ok(self.run_route_calculation(ticket, pickup, destination).await)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ride lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Requests a ride for the ready route and follows it until the driver
    /// is en route.
    ///
    /// Backend failures, a backend-reported cancellation, or no driver within
    /// the search timeout end in `Error(RideRequestFailed)` whose previous
    /// state is the route the ride was requested from.
    ///
    /// # Errors
    ///
    /// - `NotAllowed` unless a route is ready
    pub async fn request_ride(&self) -> Result<FlowOutcome, FlowError> {
        let (generation, origin, pickup, destination) = {
            let mut core = self.core();
            let (pickup, destination) = match &core.state {
                RideState::RouteReady {
                    pickup,
                    destination,
                    ..
                } => (pickup.clone(), destination.clone()),
                other => return Err(FlowError::not_allowed("request_ride", other.kind())),
            };
            let origin = core.state.clone();
            self.commit(
                &mut core,
                RideState::SubmittingRequest {
                    pickup: pickup.clone(),
                    destination: destination.clone(),
                },
            )?;
            core.generation += 1;
            (core.generation, origin, pickup, destination)
        };

        let receipt = match self
            .shared
            .backend
            .request_ride(&pickup, &destination)
            .await
        {
            Ok(receipt) => receipt,
            Err(err) => {
                return Ok(self.fail_ride(generation, RideStateKind::SubmittingRequest, origin, err))
            }
        };
        let ride_id = receipt.ride_id;
        info!(ride_id = %ride_id, "ride request accepted");

        let searching = RideState::SearchingForDriver {
            ride_id: ride_id.clone(),
            pickup: pickup.clone(),
            destination: destination.clone(),
        };
        if !self.advance(generation, RideStateKind::SubmittingRequest, |_| Some(searching)) {
            // Abandoned while submitting; nothing tracks this ride any more.
            self.cancel_on_backend(&ride_id).await;
            return Ok(FlowOutcome::Discarded);
        }
        if matches!(receipt.status, RideStatus::Cancelled | RideStatus::Failed) {
            let reason = format!("backend reported ride {:?}", receipt.status);
            return Ok(self.fail_ride(generation, RideStateKind::SearchingForDriver, origin, reason));
        }

        let (driver, estimated_arrival) = match self.wait_for_driver(generation, &ride_id).await {
            DriverSearch::Assigned {
                driver,
                estimated_arrival,
            } => (driver, estimated_arrival),
            DriverSearch::Failed(reason) => {
                let outcome =
                    self.fail_ride(generation, RideStateKind::SearchingForDriver, origin, reason);
                self.cancel_on_backend(&ride_id).await;
                return Ok(outcome);
            }
            DriverSearch::TimedOut => {
                let outcome = self.fail_ride(
                    generation,
                    RideStateKind::SearchingForDriver,
                    origin,
                    "no driver assigned before the search timeout",
                );
                self.cancel_on_backend(&ride_id).await;
                return Ok(outcome);
            }
            DriverSearch::Stale => return Ok(FlowOutcome::Discarded),
        };
        info!(ride_id = %ride_id, driver_id = %driver.id(), "driver assigned");

        let eta = estimated_arrival
            .or_else(|| driver.eta())
            .unwrap_or(self.shared.timings.default_driver_eta);
        let assigned = RideState::DriverAssigned {
            ride_id,
            driver,
            pickup,
            destination,
        };
        if !self.advance(generation, RideStateKind::SearchingForDriver, |_| {
            Some(assigned)
        }) {
            return Ok(FlowOutcome::Discarded);
        }

        time::sleep(self.shared.timings.settle_delay).await;
        let en_route = self.advance(generation, RideStateKind::DriverAssigned, |state| {
            RideContext::of(state).map(|ride| ride.en_route(eta))
        });
        Ok(FlowOutcome::from_applied(en_route))
    }

    /// Guarded `DriverEnRoute -> DriverArriving`, fired when the driver
    /// crosses the approach threshold.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` from any other state; the state is unchanged
    pub fn transition_to_driver_arriving(&self) -> Result<(), FlowError> {
        let mut core = self.core();
        let target = guarded_target(&core.state, RideStateKind::DriverArriving, |ride| {
            ride.arriving()
        })?;
        self.commit(&mut core, target)
    }

    /// Guarded `DriverArriving -> RideInProgress`, fired when the driver
    /// reaches the pickup. Starts the timed trip towards completion; the
    /// published ETA is the length of that trip.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` from any other state; the state is unchanged
    /// - `NoRuntime` outside a runtime; the state is unchanged
    pub fn transition_to_ride_in_progress(&self) -> Result<(), FlowError> {
        let (runtime, generation) = {
            let mut core = self.core();
            let eta = self.shared.timings.simulated_trip();
            let target = guarded_target(&core.state, RideStateKind::RideInProgress, |ride| {
                ride.in_progress(eta)
            })?;
            let runtime = current_runtime("transition_to_ride_in_progress")?;
            self.commit(&mut core, target)?;
            (runtime, core.generation)
        };
        let controller = self.clone();
        runtime.spawn(async move { controller.run_trip(generation).await });
        Ok(())
    }

    /// Cancels the active ride. The local reset always happens; the backend
    /// cancellation is best-effort and its failure is only logged.
    ///
    /// # Errors
    ///
    /// - `NotAllowed` when no ride is active
    pub async fn cancel_ride(&self) -> Result<(), FlowError> {
        let ride_id = {
            let mut core = self.core();
            let kind = core.state.kind();
            if !kind.is_active_ride() {
                return Err(FlowError::not_allowed("cancel_ride", kind));
            }
            let ride_id = core.state.ride_id().cloned();
            self.force_idle(&mut core);
            ride_id
        };
        info!(ride_id = ?ride_id.as_ref().map(RideId::as_str), "ride cancelled by rider");
        if let Some(ride_id) = ride_id {
            self.cancel_on_backend(&ride_id).await;
        }
        Ok(())
    }

    /// Dismisses the current error, returning to the state it interrupted,
    /// or to idle if there is none.
    ///
    /// # Errors
    ///
    /// - `NotAllowed` when not in an error state; the state is unchanged
    pub fn clear_error(&self) -> Result<(), FlowError> {
        let mut core = self.core();
        let restored = match &core.state {
            RideState::Error(failure) => failure.clone().into_previous().unwrap_or_default(),
            other => return Err(FlowError::not_allowed("clear_error", other.kind())),
        };
        core.generation += 1;
        core.route_token += 1;
        self.publish(&mut core, restored);
        Ok(())
    }

    /// Unconditionally returns to idle, abandoning any flow in progress.
    ///
    /// An abandoned active ride is cancelled on the backend in the
    /// background, best-effort.
    pub fn reset(&self) {
        let abandoned = {
            let mut core = self.core();
            let abandoned = core
                .state
                .kind()
                .is_active_ride()
                .then(|| core.state.ride_id().cloned())
                .flatten();
            self.force_idle(&mut core);
            abandoned
        };
        let Some(ride_id) = abandoned else {
            return;
        };
        info!(ride_id = %ride_id, "ride abandoned by reset");
        match current_runtime("reset") {
            Ok(runtime) => {
                let controller = self.clone();
                runtime.spawn(async move { controller.cancel_on_backend(&ride_id).await });
            }
            Err(err) => warn!(ride_id = %ride_id, error = %err, "backend cancellation skipped"),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Driver signals
    // ─────────────────────────────────────────────────────────────────────────

    pub fn handle_signal(&self, signal: DriverSignal) -> Result<(), FlowError> {
        match signal {
            DriverSignal::ReachedApproachThreshold => self.transition_to_driver_arriving(),
            DriverSignal::ReachedPickup => self.transition_to_ride_in_progress(),
        }
    }

    /// Returns a sender for the map/animation layer. Signals are applied in
    /// order by a listener task that lives until every sender is dropped.
    ///
    /// # Errors
    ///
    /// - `NoRuntime` outside a runtime
    pub fn signal_channel(&self) -> Result<mpsc::Sender<DriverSignal>, FlowError> {
        let runtime = current_runtime("signal_channel")?;
        let (sender, receiver) = mpsc::channel(self.shared.signal_buffer);
        runtime.spawn(self.clone().listen_for_signals(receiver));
        Ok(sender)
    }

    async fn listen_for_signals(self, mut receiver: mpsc::Receiver<DriverSignal>) {
        while let Some(signal) = receiver.recv().await {
            if let Err(err) = self.handle_signal(signal) {
                debug!(?signal, error = %err, "driver signal ignored");
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn core(&self) -> MutexGuard<'_, FlowCore> {
        self.shared
            .core
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T>(&self, project: impl FnOnce(&RideState) -> T) -> T {
        project(&self.core().state)
    }

    /// Validates `target` against the machine and publishes it. Invalid
    /// transitions leave the state unchanged.
    fn commit(&self, core: &mut FlowCore, target: RideState) -> Result<(), FlowError> {
        let next = RideStateMachine::transition(&core.state, target);
        if let Some(RideErrorKind::InvalidTransition { from, to }) =
            next.failure().map(|failure| failure.kind())
        {
            return Err(invalid_transition(*from, *to));
        }
        self.publish(core, next);
        Ok(())
    }

    fn publish(&self, core: &mut FlowCore, next: RideState) {
        let from = core.state.kind();
        info!(from = %from, to = %next, generation = core.generation, "ride state changed");
        core.state = next.clone();
        self.shared.publisher.send_replace(next.clone());
        // No subscribers is fine.
        let _ = self.shared.transitions.send(RideTransition { from, to: next });
    }

    fn force_idle(&self, core: &mut FlowCore) {
        core.generation += 1;
        core.route_token += 1;
        core.pending_route = None;
        if core.state != RideState::Idle {
            self.publish(core, RideState::Idle);
        }
    }

    fn is_current(&self, generation: u64, expected: RideStateKind) -> bool {
        let core = self.core();
        core.generation == generation && core.state.kind() == expected
    }

    /// Applies the continuation of an asynchronous step, unless the flow
    /// generation or the expected state shape changed while it was suspended.
    fn advance<F>(&self, generation: u64, expected: RideStateKind, next: F) -> bool
    where
        F: FnOnce(&RideState) -> Option<RideState>,
    {
        let mut core = self.core();
        if core.generation != generation || core.state.kind() != expected {
            debug!(
                generation,
                current_generation = core.generation,
                expected = %expected,
                actual = %core.state.kind(),
                "discarding stale continuation"
            );
            return false;
        }
        match next(&core.state) {
            Some(target) => self.commit(&mut core, target).is_ok(),
            None => false,
        }
    }

    fn fail_ride(
        &self,
        generation: u64,
        expected: RideStateKind,
        origin: RideState,
        reason: impl fmt::Display,
    ) -> FlowOutcome {
        warn!(reason = %reason, "ride request failed");
        let applied = self.advance(generation, expected, |_| {
            Some(RideState::error(RideErrorKind::RideRequestFailed, Some(origin)))
        });
        FlowOutcome::from_applied(applied)
    }

    async fn cancel_on_backend(&self, ride_id: &RideId) {
        if let Err(err) = self.shared.backend.cancel_ride(ride_id).await {
            warn!(ride_id = %ride_id, error = %err, "backend cancellation failed; ride already reset locally");
        }
    }

    fn update_locations<F>(&self, operation: &'static str, edit: F) -> Result<(), FlowError>
    where
        F: FnOnce(&mut Option<LocationPoint>, &mut Option<LocationPoint>),
    {
        let (ticket, runtime, pickup, destination) = {
            let mut core = self.core();
            let (mut pickup, mut destination) = match &core.state {
                RideState::Idle => (None, None),
                RideState::SelectingLocations {
                    pickup,
                    destination,
                } => (pickup.clone(), destination.clone()),
                other => return Err(FlowError::not_allowed(operation, other.kind())),
            };
            edit(&mut pickup, &mut destination);
            let runtime = match (&pickup, &destination) {
                (Some(_), Some(_)) => Some(current_runtime(operation)?),
                _ => None,
            };
            self.commit(
                &mut core,
                RideState::SelectingLocations {
                    pickup: pickup.clone(),
                    destination: destination.clone(),
                },
            )?;
            let ticket = core.issue_route_ticket();
            if runtime.is_some() {
                core.pending_route = Some(ticket.token);
            }
            (ticket, runtime, pickup, destination)
        };

        if let (Some(runtime), Some(pickup), Some(destination)) = (runtime, pickup, destination) {
            let controller = self.clone();
            runtime.spawn(async move {
                controller
                    .run_route_calculation(ticket, pickup, destination)
                    .await
            });
        }
        Ok(())
    }

    async fn set_location_from_address(
        &self,
        operation: &'static str,
        address: &str,
        apply: fn(&Self, Option<LocationPoint>) -> Result<(), FlowError>,
    ) -> Result<FlowOutcome, FlowError> {
        let geocoder = self
            .shared
            .geocoder
            .clone()
            .ok_or(FlowError::GeocoderUnavailable)?;
        let generation = {
            let core = self.core();
            let kind = core.state.kind();
            if !is_editable(kind) {
                return Err(FlowError::not_allowed(operation, kind));
            }
            core.generation
        };

        let lookup = LookupGuard::start(&self.shared.lookups_in_flight);
        let result = geocoder.geocode(address).await;
        drop(lookup);
        match result {
            Ok(found) => {
                if self.flow_generation() != generation {
                    return Ok(FlowOutcome::Discarded);
                }
                apply(self, Some(found.into_location()))?;
                Ok(FlowOutcome::Applied)
            }
            Err(err) => {
                warn!(error = %err, "geocoding failed");
                let mut core = self.core();
                if core.generation != generation || !is_editable(core.state.kind()) {
                    return Ok(FlowOutcome::Discarded);
                }
                let target =
                    RideState::error(RideErrorKind::GeocodingFailed, Some(core.state.clone()));
                self.commit(&mut core, target)?;
                Ok(FlowOutcome::Applied)
            }
        }
    }

    async fn run_route_calculation(
        &self,
        ticket: RouteTicket,
        pickup: LocationPoint,
        destination: LocationPoint,
    ) -> FlowOutcome {
        let result = if pickup.same_place_as(&destination) {
            Err(RideErrorKind::InvalidDestinationLocation)
        } else {
            self.shared
                .routing
                .calculate_route(&pickup, &destination)
                .await
                .map_err(|err| {
                    warn!(error = %err, "route calculation failed");
                    err.to_ride_error()
                })
        };

        let mut core = self.core();
        if core.holds_ticket(ticket) {
            core.pending_route = None;
        }
        if !core.holds_ticket(ticket) || core.state.kind() != RideStateKind::SelectingLocations {
            debug!(token = ticket.token, "discarding superseded route result");
            return FlowOutcome::Discarded;
        }
        let target = match result {
            Ok(route) => RideState::RouteReady {
                pickup,
                destination,
                route,
            },
            Err(kind) => RideState::error(kind, Some(core.state.clone())),
        };
        FlowOutcome::from_applied(self.commit(&mut core, target).is_ok())
    }

    async fn wait_for_driver(&self, generation: u64, ride_id: &RideId) -> DriverSearch {
        let timings = &self.shared.timings;
        let deadline = Instant::now() + timings.driver_search_timeout;
        loop {
            let poll =
                time::timeout_at(deadline, self.shared.backend.get_ride_status(ride_id)).await;
            if !self.is_current(generation, RideStateKind::SearchingForDriver) {
                debug!(ride_id = %ride_id, "discarding status for abandoned ride");
                return DriverSearch::Stale;
            }
            match poll {
                Err(_) => return DriverSearch::TimedOut,
                Ok(Err(err)) => return DriverSearch::Failed(err.to_string()),
                Ok(Ok(report)) => match (report.status, report.driver) {
                    (RideStatus::Cancelled | RideStatus::Failed, _) => {
                        return DriverSearch::Failed(format!(
                            "backend reported ride {:?}",
                            report.status
                        ))
                    }
                    (_, Some(driver)) => {
                        return DriverSearch::Assigned {
                            driver,
                            estimated_arrival: report.estimated_arrival,
                        }
                    }
                    (status, None) => {
                        debug!(ride_id = %ride_id, ?status, "no driver assigned yet")
                    }
                },
            }

            if Instant::now() + timings.status_poll_interval >= deadline {
                return DriverSearch::TimedOut;
            }
            time::sleep(timings.status_poll_interval).await;
            if !self.is_current(generation, RideStateKind::SearchingForDriver) {
                return DriverSearch::Stale;
            }
        }
    }

    async fn run_trip(self, generation: u64) {
        time::sleep(self.shared.timings.approach_delay).await;
        if !self.advance(generation, RideStateKind::RideInProgress, |state| {
            RideContext::of(state).map(RideContext::approaching)
        }) {
            return;
        }
        time::sleep(self.shared.timings.arrival_delay).await;
        if self.advance(generation, RideStateKind::ApproachingDestination, |state| {
            RideContext::of(state).map(RideContext::completed)
        }) {
            info!("ride completed");
        }
    }
}

fn current_runtime(operation: &'static str) -> Result<Handle, FlowError> {
    Handle::try_current().map_err(|_| FlowError::no_runtime(operation))
}

fn is_editable(kind: RideStateKind) -> bool {
    matches!(kind, RideStateKind::Idle | RideStateKind::SelectingLocations)
}

/// Logs an invalid transition under its own target, so programming errors
/// are distinguishable from collaborator failures.
fn invalid_transition(from: RideStateKind, to: RideStateKind) -> FlowError {
    error!(
        target: "ride_flow::invalid_transition",
        from = %from,
        to = %to,
        "rejected invalid ride state transition"
    );
    FlowError::InvalidTransition { from, to }
}

fn guarded_target(
    state: &RideState,
    to: RideStateKind,
    build: impl FnOnce(RideContext) -> RideState,
) -> Result<RideState, FlowError> {
    RideContext::of(state)
        .map(build)
        .ok_or_else(|| invalid_transition(state.kind(), to))
}
