//! End-to-end ride flows against scripted collaborators.
//!
//! All tests run on a paused clock, so settle delays, poll intervals and the
//! simulated trip complete instantly while keeping their relative order.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use ride_flow::adapters::{MockRideBackend, MockRoutingService};
use ride_flow::application::{
    DriverSignal, FlowError, FlowOutcome, FlowTimings, RideFlowController, RideTransition,
};
use ride_flow::domain::foundation::{DriverId, RideId, StateMachine};
use ride_flow::domain::ride::{
    DriverInfo, LocationPoint, RideErrorKind, RideState, RideStateKind, RouteInfo, Vehicle,
};
use ride_flow::ports::{BackendError, RideStatus, RideStatusReport, RoutingError};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn point(lat: f64, lon: f64) -> LocationPoint {
    LocationPoint::from_lat_lon(lat, lon).unwrap()
}

fn p1() -> LocationPoint {
    point(37.7749, -122.4194)
}

fn d1() -> LocationPoint {
    point(37.8044, -122.2712)
}

fn route_5km() -> RouteInfo {
    RouteInfo::new(5000.0, 600.0).unwrap()
}

fn driver() -> DriverInfo {
    DriverInfo::new(
        DriverId::new("drv-1").unwrap(),
        "Jordan",
        4.9,
        Vehicle::new("Toyota", "Camry", "Black", "7XYZ123"),
    )
    .unwrap()
}

struct Harness {
    controller: RideFlowController,
    routing: Arc<MockRoutingService>,
    backend: Arc<MockRideBackend>,
}

impl Harness {
    fn new(routing: MockRoutingService, backend: MockRideBackend) -> Self {
        let routing = Arc::new(routing);
        let backend = Arc::new(backend);
        let controller = RideFlowController::new(routing.clone(), backend.clone());
        Self {
            controller,
            routing,
            backend,
        }
    }

    /// Drives the controller to `RouteReady(P1, D1, 5 km)`.
    async fn route_ready(&self) {
        self.controller.update_pickup(Some(p1())).unwrap();
        self.controller.update_destination(Some(d1())).unwrap();
        wait_for(&self.controller, RideStateKind::RouteReady).await;
    }
}

fn assigning_backend(ride_id: &str) -> MockRideBackend {
    MockRideBackend::new()
        .with_ride_id(RideId::new(ride_id).unwrap())
        .with_status(RideStatusReport::assigned(
            driver(),
            Some(Duration::from_secs(180)),
        ))
}

async fn wait_for(controller: &RideFlowController, kind: RideStateKind) -> RideState {
    let mut rx = controller.subscribe();
    let state = time::timeout(Duration::from_secs(300), rx.wait_for(|s| s.kind() == kind))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {}", kind))
        .expect("controller dropped");
    state.clone()
}

fn drain(rx: &mut broadcast::Receiver<RideTransition>) -> Vec<RideTransition> {
    let mut seen = Vec::new();
    while let Ok(transition) = rx.try_recv() {
        seen.push(transition);
    }
    seen
}

fn kinds(transitions: &[RideTransition]) -> Vec<RideStateKind> {
    transitions.iter().map(|t| t.to.kind()).collect()
}

/// Log lines written by a test-local tracing subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// Location selection and routing
// =============================================================================

#[tokio::test(start_paused = true)]
async fn update_pickup_from_idle_selects_locations() {
    let harness = Harness::new(MockRoutingService::new(), MockRideBackend::new());

    harness.controller.update_pickup(Some(p1())).unwrap();

    assert_eq!(
        harness.controller.current_state(),
        RideState::SelectingLocations {
            pickup: Some(p1()),
            destination: None,
        }
    );
    assert_eq!(harness.routing.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn both_locations_produce_route_ready() {
    let harness = Harness::new(
        MockRoutingService::new().with_route(route_5km()),
        MockRideBackend::new(),
    );

    harness.controller.update_pickup(Some(p1())).unwrap();
    harness.controller.update_destination(Some(d1())).unwrap();
    let state = wait_for(&harness.controller, RideStateKind::RouteReady).await;

    assert_eq!(
        state,
        RideState::RouteReady {
            pickup: p1(),
            destination: d1(),
            route: route_5km(),
        }
    );
    assert_eq!(harness.routing.calls(), vec![(p1(), d1())]);
}

#[tokio::test(start_paused = true)]
async fn later_route_request_wins_over_slower_earlier_one() {
    let far = point(38.0, -122.0);
    let slow = RouteInfo::new(9000.0, 900.0).unwrap();
    let fast = RouteInfo::new(3000.0, 300.0).unwrap();
    let harness = Harness::new(
        MockRoutingService::new()
            .with_route_after(slow, Duration::from_secs(5))
            .with_route(fast.clone()),
        MockRideBackend::new(),
    );

    harness.controller.update_pickup(Some(p1())).unwrap();
    harness.controller.update_destination(Some(d1())).unwrap();
    harness.controller.update_destination(Some(far.clone())).unwrap();
    wait_for(&harness.controller, RideStateKind::RouteReady).await;

    // Let the slow, earlier request complete.
    time::sleep(Duration::from_secs(10)).await;

    assert_eq!(harness.routing.call_count(), 2);
    assert_eq!(
        harness.controller.current_state(),
        RideState::RouteReady {
            pickup: p1(),
            destination: far,
            route: fast,
        }
    );
}

#[tokio::test(start_paused = true)]
async fn route_result_after_reset_is_discarded() {
    let harness = Harness::new(
        MockRoutingService::new().with_route_after(route_5km(), Duration::from_secs(5)),
        MockRideBackend::new(),
    );
    harness.controller.update_pickup(Some(p1())).unwrap();
    harness.controller.update_destination(Some(d1())).unwrap();

    harness.controller.reset();
    time::sleep(Duration::from_secs(10)).await;

    assert_eq!(harness.controller.current_state(), RideState::Idle);
}

#[tokio::test(start_paused = true)]
async fn routing_failures_map_to_location_errors() {
    let cases = [
        (
            RoutingError::InvalidOrigin("in the bay".into()),
            RideErrorKind::InvalidPickupLocation,
        ),
        (
            RoutingError::InvalidDestination("in the bay".into()),
            RideErrorKind::InvalidDestinationLocation,
        ),
        (RoutingError::Network("offline".into()), RideErrorKind::RouteCalculationFailed),
    ];

    for (error, expected) in cases {
        let harness = Harness::new(
            MockRoutingService::new().with_error(error),
            MockRideBackend::new(),
        );
        harness.controller.update_pickup(Some(p1())).unwrap();
        harness.controller.update_destination(Some(d1())).unwrap();
        let state = wait_for(&harness.controller, RideStateKind::Error).await;

        let failure = state.failure().unwrap();
        assert_eq!(failure.kind(), &expected);
        assert_eq!(
            failure.previous(),
            Some(&RideState::SelectingLocations {
                pickup: Some(p1()),
                destination: Some(d1()),
            })
        );
    }
}

// =============================================================================
// Ride request and driver search
// =============================================================================

#[tokio::test(start_paused = true)]
async fn request_ride_runs_through_to_driver_en_route() {
    let harness = Harness::new(
        MockRoutingService::new().with_route(route_5km()),
        assigning_backend("r1"),
    );
    harness.route_ready().await;
    let mut transitions = harness.controller.transitions();

    let outcome = harness.controller.request_ride().await.unwrap();

    assert_eq!(outcome, FlowOutcome::Applied);
    let seen = drain(&mut transitions);
    assert_eq!(
        kinds(&seen),
        vec![
            RideStateKind::SubmittingRequest,
            RideStateKind::SearchingForDriver,
            RideStateKind::DriverAssigned,
            RideStateKind::DriverEnRoute,
        ]
    );
    assert_eq!(seen[1].to.ride_id(), Some(&RideId::new("r1").unwrap()));
    assert_eq!(harness.controller.current_driver(), Some(driver()));
    assert_eq!(harness.controller.eta(), Some(Duration::from_secs(180)));
    assert!(!harness.controller.is_loading());
}

#[tokio::test(start_paused = true)]
async fn driver_en_route_waits_for_settle_delay() {
    let harness = Harness::new(MockRoutingService::new(), assigning_backend("r1"));
    harness.route_ready().await;

    let controller = harness.controller.clone();
    let request = tokio::spawn(async move { controller.request_ride().await });
    wait_for(&harness.controller, RideStateKind::DriverAssigned).await;
    let assigned_at = time::Instant::now();
    wait_for(&harness.controller, RideStateKind::DriverEnRoute).await;

    assert!(assigned_at.elapsed() >= Duration::from_secs(2));
    assert_eq!(request.await.unwrap(), Ok(FlowOutcome::Applied));
}

#[tokio::test(start_paused = true)]
async fn driver_search_keeps_polling_until_assigned() {
    let backend = MockRideBackend::new()
        .with_status(RideStatusReport::searching())
        .with_status(RideStatusReport::searching())
        .with_status(RideStatusReport::assigned(driver(), None));
    let harness = Harness::new(MockRoutingService::new(), backend);
    harness.route_ready().await;

    harness.controller.request_ride().await.unwrap();

    assert_eq!(harness.backend.status_polls(), 3);
    assert_eq!(
        harness.controller.current_state().kind(),
        RideStateKind::DriverEnRoute
    );
    // Neither backend nor driver reported an ETA.
    assert_eq!(harness.controller.eta(), Some(Duration::from_secs(300)));
}

#[tokio::test(start_paused = true)]
async fn request_failure_returns_error_with_route_ready_as_previous() {
    let harness = Harness::new(
        MockRoutingService::new().with_route(route_5km()),
        MockRideBackend::new().with_request_error(BackendError::Network("timeout".into())),
    );
    harness.route_ready().await;
    let ready = harness.controller.current_state();

    let outcome = harness.controller.request_ride().await.unwrap();

    assert_eq!(outcome, FlowOutcome::Applied);
    let state = harness.controller.current_state();
    let failure = state.failure().unwrap();
    assert_eq!(failure.kind(), &RideErrorKind::RideRequestFailed);
    assert_eq!(failure.previous(), Some(&ready));
}

#[tokio::test(start_paused = true)]
async fn clearing_request_failure_allows_retry() {
    let harness = Harness::new(
        MockRoutingService::new(),
        MockRideBackend::new()
            .with_request_error(BackendError::Unavailable("503".into()))
            .with_status(RideStatusReport::assigned(driver(), None)),
    );
    harness.route_ready().await;
    harness.controller.request_ride().await.unwrap();
    assert_eq!(harness.controller.current_state().kind(), RideStateKind::Error);

    harness.controller.clear_error().unwrap();
    assert!(harness.controller.should_show_confirmation());
    harness.controller.request_ride().await.unwrap();

    assert_eq!(harness.backend.request_count(), 2);
    assert_eq!(
        harness.controller.current_state().kind(),
        RideStateKind::DriverEnRoute
    );
}

#[tokio::test(start_paused = true)]
async fn driver_search_times_out_and_cancels_on_backend() {
    let harness = Harness::new(
        MockRoutingService::new(),
        MockRideBackend::new().with_ride_id(RideId::new("r-timeout").unwrap()),
    );
    harness.route_ready().await;
    let ready = harness.controller.current_state();
    let started = time::Instant::now();

    harness.controller.request_ride().await.unwrap();

    assert!(started.elapsed() <= Duration::from_secs(30));
    assert_eq!(harness.backend.status_polls(), 15);
    let state = harness.controller.current_state();
    let failure = state.failure().unwrap();
    assert_eq!(failure.kind(), &RideErrorKind::RideRequestFailed);
    assert_eq!(failure.previous(), Some(&ready));
    assert_eq!(
        harness.backend.cancelled_rides(),
        vec![RideId::new("r-timeout").unwrap()]
    );
}

#[tokio::test(start_paused = true)]
async fn backend_cancelled_status_fails_the_request() {
    let harness = Harness::new(
        MockRoutingService::new(),
        MockRideBackend::new().with_status(RideStatusReport::terminal(RideStatus::Cancelled)),
    );
    harness.route_ready().await;

    harness.controller.request_ride().await.unwrap();

    let state = harness.controller.current_state();
    assert_eq!(
        state.failure().map(|f| f.kind().clone()),
        Some(RideErrorKind::RideRequestFailed)
    );
}

#[tokio::test(start_paused = true)]
async fn status_poll_error_fails_the_request() {
    let harness = Harness::new(
        MockRoutingService::new(),
        MockRideBackend::new().with_status_error(BackendError::Network("reset".into())),
    );
    harness.route_ready().await;

    harness.controller.request_ride().await.unwrap();

    assert_eq!(harness.controller.current_state().kind(), RideStateKind::Error);
}

#[tokio::test(start_paused = true)]
async fn status_poll_error_cancels_the_ride_before_retry() {
    let harness = Harness::new(
        MockRoutingService::new(),
        MockRideBackend::new()
            .with_ride_id(RideId::new("r1").unwrap())
            .with_status_error(BackendError::Network("reset".into())),
    );
    harness.route_ready().await;

    harness.controller.request_ride().await.unwrap();

    assert_eq!(harness.controller.current_state().kind(), RideStateKind::Error);
    assert_eq!(
        harness.backend.cancelled_rides(),
        vec![RideId::new("r1").unwrap()]
    );

    harness.controller.clear_error().unwrap();
    assert!(harness.controller.should_show_confirmation());
}

#[tokio::test(start_paused = true)]
async fn request_ride_requires_route_ready() {
    let harness = Harness::new(MockRoutingService::new(), MockRideBackend::new());
    harness.controller.update_pickup(Some(p1())).unwrap();

    let result = harness.controller.request_ride().await;

    assert!(matches!(result, Err(FlowError::NotAllowed { .. })));
    assert_eq!(harness.backend.request_count(), 0);
}

// =============================================================================
// Driver signals and the trip
// =============================================================================

#[tokio::test(start_paused = true)]
async fn skipping_driver_arriving_is_rejected_and_state_kept() {
    let harness = Harness::new(MockRoutingService::new(), assigning_backend("r1"));
    harness.route_ready().await;
    harness.controller.request_ride().await.unwrap();
    let en_route = harness.controller.current_state();
    let mut transitions = harness.controller.transitions();

    let logs = CapturedLogs::default();
    let _guard = logs.install();

    let result = harness.controller.transition_to_ride_in_progress();

    assert_eq!(
        result,
        Err(FlowError::InvalidTransition {
            from: RideStateKind::DriverEnRoute,
            to: RideStateKind::RideInProgress,
        })
    );
    assert_eq!(harness.controller.current_state(), en_route);
    assert!(drain(&mut transitions).is_empty());

    let rejected: Vec<String> = logs
        .lines()
        .into_iter()
        .filter(|line| line.contains("ride_flow::invalid_transition"))
        .collect();
    assert_eq!(rejected.len(), 1, "captured: {:?}", logs.lines());
    assert!(rejected[0].starts_with("ERROR"));
    assert!(rejected[0].contains("from=driver_en_route to=ride_in_progress"));
}

#[tokio::test(start_paused = true)]
async fn collaborator_failures_are_not_logged_as_invalid_transitions() {
    let harness = Harness::new(
        MockRoutingService::new(),
        MockRideBackend::new().with_request_error(BackendError::Network("timeout".into())),
    );
    harness.route_ready().await;
    let logs = CapturedLogs::default();
    let _guard = logs.install();

    harness.controller.request_ride().await.unwrap();

    let lines = logs.lines();
    assert!(lines.iter().any(|line| line.contains("ride request failed")));
    assert!(!lines
        .iter()
        .any(|line| line.contains("ride_flow::invalid_transition")));
}

#[tokio::test(start_paused = true)]
async fn signals_drive_the_ride_to_completion() {
    let harness = Harness::new(
        MockRoutingService::new().with_route(route_5km()),
        assigning_backend("r1"),
    );
    harness.route_ready().await;
    harness.controller.request_ride().await.unwrap();
    let mut transitions = harness.controller.transitions();

    let signals = harness.controller.signal_channel().unwrap();
    signals
        .send(DriverSignal::ReachedApproachThreshold)
        .await
        .unwrap();
    signals.send(DriverSignal::ReachedPickup).await.unwrap();
    let in_progress = wait_for(&harness.controller, RideStateKind::RideInProgress).await;
    // The trip is simulated, so its ETA is the simulated trip length.
    assert_eq!(
        in_progress.eta(),
        Some(FlowTimings::default().simulated_trip())
    );
    let completed = wait_for(&harness.controller, RideStateKind::RideCompleted).await;

    assert_eq!(completed.ride_id(), Some(&RideId::new("r1").unwrap()));
    assert_eq!(completed.driver(), Some(&driver()));
    assert_eq!(
        kinds(&drain(&mut transitions)),
        vec![
            RideStateKind::DriverArriving,
            RideStateKind::RideInProgress,
            RideStateKind::ApproachingDestination,
            RideStateKind::RideCompleted,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn every_observed_transition_is_in_the_table() {
    let harness = Harness::new(MockRoutingService::new(), assigning_backend("r1"));
    let mut transitions = harness.controller.transitions();

    harness.route_ready().await;
    harness.controller.request_ride().await.unwrap();
    harness.controller.transition_to_driver_arriving().unwrap();
    harness.controller.transition_to_ride_in_progress().unwrap();
    wait_for(&harness.controller, RideStateKind::RideCompleted).await;

    let seen = drain(&mut transitions);
    assert!(!seen.is_empty());
    for transition in seen {
        assert!(
            transition.from.can_transition_to(&transition.to.kind()),
            "{} -> {} is not in the table",
            transition.from,
            transition.to.kind()
        );
    }
}

#[tokio::test(start_paused = true)]
async fn completed_ride_can_start_over() {
    let harness = Harness::new(MockRoutingService::new(), assigning_backend("r1"));
    harness.route_ready().await;
    harness.controller.request_ride().await.unwrap();
    harness.controller.transition_to_driver_arriving().unwrap();
    harness.controller.transition_to_ride_in_progress().unwrap();
    wait_for(&harness.controller, RideStateKind::RideCompleted).await;

    assert!(harness.controller.cancel_ride().await.is_err());
    harness.controller.reset();

    assert_eq!(harness.controller.current_state(), RideState::Idle);
    harness.controller.update_pickup(Some(p1())).unwrap();
    assert_eq!(
        harness.controller.current_state().kind(),
        RideStateKind::SelectingLocations
    );
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn cancel_while_searching_discards_late_assignment() {
    let backend = MockRideBackend::new()
        .with_ride_id(RideId::new("r1").unwrap())
        .with_status_after(
            RideStatusReport::assigned(driver(), None),
            Duration::from_secs(5),
        );
    let harness = Harness::new(MockRoutingService::new(), backend);
    harness.route_ready().await;

    let controller = harness.controller.clone();
    let request = tokio::spawn(async move { controller.request_ride().await });
    wait_for(&harness.controller, RideStateKind::SearchingForDriver).await;

    harness.controller.cancel_ride().await.unwrap();
    assert_eq!(harness.controller.current_state(), RideState::Idle);
    let mut transitions = harness.controller.transitions();

    // The assignment arrives after the cancellation.
    assert_eq!(request.await.unwrap(), Ok(FlowOutcome::Discarded));
    time::sleep(Duration::from_secs(10)).await;

    assert_eq!(harness.controller.current_state(), RideState::Idle);
    assert!(drain(&mut transitions).is_empty());
    assert_eq!(
        harness.backend.cancelled_rides(),
        vec![RideId::new("r1").unwrap()]
    );
}

#[tokio::test(start_paused = true)]
async fn cancel_while_submitting_cancels_orphaned_ride() {
    let backend = MockRideBackend::new()
        .with_ride_id(RideId::new("r-orphan").unwrap())
        .with_request_delay(Duration::from_secs(3));
    let harness = Harness::new(MockRoutingService::new(), backend);
    harness.route_ready().await;

    let controller = harness.controller.clone();
    let request = tokio::spawn(async move { controller.request_ride().await });
    wait_for(&harness.controller, RideStateKind::SubmittingRequest).await;
    assert!(harness.controller.is_loading());

    harness.controller.cancel_ride().await.unwrap();
    assert_eq!(request.await.unwrap(), Ok(FlowOutcome::Discarded));

    assert_eq!(harness.controller.current_state(), RideState::Idle);
    assert_eq!(harness.backend.status_polls(), 0);
    assert_eq!(
        harness.backend.cancelled_rides(),
        vec![RideId::new("r-orphan").unwrap()]
    );
}

#[tokio::test(start_paused = true)]
async fn reset_while_searching_cancels_ride_on_backend() {
    let backend = MockRideBackend::new()
        .with_ride_id(RideId::new("r1").unwrap())
        .with_status_after(
            RideStatusReport::assigned(driver(), None),
            Duration::from_secs(5),
        );
    let harness = Harness::new(MockRoutingService::new(), backend);
    harness.route_ready().await;

    let controller = harness.controller.clone();
    let request = tokio::spawn(async move { controller.request_ride().await });
    wait_for(&harness.controller, RideStateKind::SearchingForDriver).await;

    harness.controller.reset();
    assert_eq!(request.await.unwrap(), Ok(FlowOutcome::Discarded));
    time::sleep(Duration::from_secs(1)).await;

    assert_eq!(harness.controller.current_state(), RideState::Idle);
    assert_eq!(
        harness.backend.cancelled_rides(),
        vec![RideId::new("r1").unwrap()]
    );
}

#[tokio::test(start_paused = true)]
async fn reset_after_completion_cancels_nothing() {
    let harness = Harness::new(MockRoutingService::new(), assigning_backend("r1"));
    harness.route_ready().await;
    harness.controller.request_ride().await.unwrap();
    harness.controller.transition_to_driver_arriving().unwrap();
    harness.controller.transition_to_ride_in_progress().unwrap();
    wait_for(&harness.controller, RideStateKind::RideCompleted).await;

    harness.controller.reset();
    time::sleep(Duration::from_secs(1)).await;

    assert!(harness.backend.cancelled_rides().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancel_succeeds_locally_when_backend_cancel_fails() {
    let backend = assigning_backend("r1").failing_cancel(BackendError::Network("down".into()));
    let harness = Harness::new(MockRoutingService::new(), backend);
    harness.route_ready().await;
    harness.controller.request_ride().await.unwrap();

    harness.controller.cancel_ride().await.unwrap();

    assert_eq!(harness.controller.current_state(), RideState::Idle);
    assert_eq!(harness.backend.cancelled_rides().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_trip_stops_the_simulation() {
    let harness = Harness::new(MockRoutingService::new(), assigning_backend("r1"));
    harness.route_ready().await;
    harness.controller.request_ride().await.unwrap();
    harness.controller.transition_to_driver_arriving().unwrap();
    harness.controller.transition_to_ride_in_progress().unwrap();

    harness.controller.cancel_ride().await.unwrap();
    time::sleep(Duration::from_secs(30)).await;

    assert_eq!(harness.controller.current_state(), RideState::Idle);
}

// =============================================================================
// Error recovery
// =============================================================================

#[tokio::test(start_paused = true)]
async fn clear_error_outside_error_changes_nothing() {
    let harness = Harness::new(MockRoutingService::new(), MockRideBackend::new());
    harness.route_ready().await;
    let before = harness.controller.current_state();
    let mut transitions = harness.controller.transitions();

    for _ in 0..3 {
        assert!(harness.controller.clear_error().is_err());
    }

    assert_eq!(harness.controller.current_state(), before);
    assert!(drain(&mut transitions).is_empty());
}
