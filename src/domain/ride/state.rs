//! RideState - the closed set of ride lifecycle stages.
//!
//! Each stage carries exactly the data valid for it, so a state with a
//! missing required field cannot be constructed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::domain::foundation::RideId;

use super::{DriverInfo, LocationPoint, RideErrorKind, RouteInfo};

/// Lifecycle stage of the rider's journey, with its payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RideState {
    #[default]
    Idle,
    SelectingLocations {
        pickup: Option<LocationPoint>,
        destination: Option<LocationPoint>,
    },
    RouteReady {
        pickup: LocationPoint,
        destination: LocationPoint,
        route: RouteInfo,
    },
    SubmittingRequest {
        pickup: LocationPoint,
        destination: LocationPoint,
    },
    SearchingForDriver {
        ride_id: RideId,
        pickup: LocationPoint,
        destination: LocationPoint,
    },
    DriverAssigned {
        ride_id: RideId,
        driver: DriverInfo,
        pickup: LocationPoint,
        destination: LocationPoint,
    },
    DriverEnRoute {
        ride_id: RideId,
        driver: DriverInfo,
        eta: Duration,
        pickup: LocationPoint,
        destination: LocationPoint,
    },
    DriverArriving {
        ride_id: RideId,
        driver: DriverInfo,
        pickup: LocationPoint,
        destination: LocationPoint,
    },
    RideInProgress {
        ride_id: RideId,
        driver: DriverInfo,
        eta: Duration,
        pickup: LocationPoint,
        destination: LocationPoint,
    },
    ApproachingDestination {
        ride_id: RideId,
        driver: DriverInfo,
        pickup: LocationPoint,
        destination: LocationPoint,
    },
    RideCompleted {
        ride_id: RideId,
        driver: DriverInfo,
        pickup: LocationPoint,
        destination: LocationPoint,
    },
    Error(RideFailure),
}

/// Payload of `RideState::Error`.
///
/// # Invariants
///
/// - `previous` is never itself an `Error` (construction flattens it)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRideFailure")]
pub struct RideFailure {
    kind: RideErrorKind,
    previous: Option<Box<RideState>>,
}

impl RideFailure {
    /// Creates a failure. If `previous` is an error state, its own previous
    /// state is kept instead, so errors never nest.
    pub fn new(kind: RideErrorKind, previous: Option<RideState>) -> Self {
        let previous = previous.and_then(|state| match state {
            RideState::Error(inner) => inner.previous,
            other => Some(Box::new(other)),
        });
        Self { kind, previous }
    }

    pub fn kind(&self) -> &RideErrorKind {
        &self.kind
    }

    /// The state the rider was in when the error occurred.
    pub fn previous(&self) -> Option<&RideState> {
        self.previous.as_deref()
    }

    /// Consumes the failure, returning the state to restore on dismissal.
    pub fn into_previous(self) -> Option<RideState> {
        self.previous.map(|state| *state)
    }
}

#[derive(Deserialize)]
struct RawRideFailure {
    kind: RideErrorKind,
    previous: Option<Box<RideState>>,
}

impl From<RawRideFailure> for RideFailure {
    fn from(raw: RawRideFailure) -> Self {
        RideFailure::new(raw.kind, raw.previous.map(|state| *state))
    }
}

impl RideState {
    /// Builds an error state, flattening a nested error in `previous`.
    pub fn error(kind: RideErrorKind, previous: Option<RideState>) -> Self {
        RideState::Error(RideFailure::new(kind, previous))
    }

    /// Returns the shape of this state, ignoring its payload.
    pub fn kind(&self) -> RideStateKind {
        match self {
            RideState::Idle => RideStateKind::Idle,
            RideState::SelectingLocations { .. } => RideStateKind::SelectingLocations,
            RideState::RouteReady { .. } => RideStateKind::RouteReady,
            RideState::SubmittingRequest { .. } => RideStateKind::SubmittingRequest,
            RideState::SearchingForDriver { .. } => RideStateKind::SearchingForDriver,
            RideState::DriverAssigned { .. } => RideStateKind::DriverAssigned,
            RideState::DriverEnRoute { .. } => RideStateKind::DriverEnRoute,
            RideState::DriverArriving { .. } => RideStateKind::DriverArriving,
            RideState::RideInProgress { .. } => RideStateKind::RideInProgress,
            RideState::ApproachingDestination { .. } => RideStateKind::ApproachingDestination,
            RideState::RideCompleted { .. } => RideStateKind::RideCompleted,
            RideState::Error(_) => RideStateKind::Error,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Projections
    // ─────────────────────────────────────────────────────────────────────────

    pub fn pickup(&self) -> Option<&LocationPoint> {
        match self {
            RideState::Idle | RideState::Error(_) => None,
            RideState::SelectingLocations { pickup, .. } => pickup.as_ref(),
            RideState::RouteReady { pickup, .. }
            | RideState::SubmittingRequest { pickup, .. }
            | RideState::SearchingForDriver { pickup, .. }
            | RideState::DriverAssigned { pickup, .. }
            | RideState::DriverEnRoute { pickup, .. }
            | RideState::DriverArriving { pickup, .. }
            | RideState::RideInProgress { pickup, .. }
            | RideState::ApproachingDestination { pickup, .. }
            | RideState::RideCompleted { pickup, .. } => Some(pickup),
        }
    }

    pub fn destination(&self) -> Option<&LocationPoint> {
        match self {
            RideState::Idle | RideState::Error(_) => None,
            RideState::SelectingLocations { destination, .. } => destination.as_ref(),
            RideState::RouteReady { destination, .. }
            | RideState::SubmittingRequest { destination, .. }
            | RideState::SearchingForDriver { destination, .. }
            | RideState::DriverAssigned { destination, .. }
            | RideState::DriverEnRoute { destination, .. }
            | RideState::DriverArriving { destination, .. }
            | RideState::RideInProgress { destination, .. }
            | RideState::ApproachingDestination { destination, .. }
            | RideState::RideCompleted { destination, .. } => Some(destination),
        }
    }

    pub fn route(&self) -> Option<&RouteInfo> {
        match self {
            RideState::RouteReady { route, .. } => Some(route),
            _ => None,
        }
    }

    pub fn ride_id(&self) -> Option<&RideId> {
        match self {
            RideState::SearchingForDriver { ride_id, .. }
            | RideState::DriverAssigned { ride_id, .. }
            | RideState::DriverEnRoute { ride_id, .. }
            | RideState::DriverArriving { ride_id, .. }
            | RideState::RideInProgress { ride_id, .. }
            | RideState::ApproachingDestination { ride_id, .. }
            | RideState::RideCompleted { ride_id, .. } => Some(ride_id),
            _ => None,
        }
    }

    pub fn driver(&self) -> Option<&DriverInfo> {
        match self {
            RideState::DriverAssigned { driver, .. }
            | RideState::DriverEnRoute { driver, .. }
            | RideState::DriverArriving { driver, .. }
            | RideState::RideInProgress { driver, .. }
            | RideState::ApproachingDestination { driver, .. }
            | RideState::RideCompleted { driver, .. } => Some(driver),
            _ => None,
        }
    }

    /// ETA of the current leg: driver to pickup, or pickup to destination.
    pub fn eta(&self) -> Option<Duration> {
        match self {
            RideState::DriverEnRoute { eta, .. } | RideState::RideInProgress { eta, .. } => {
                Some(*eta)
            }
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&RideFailure> {
        match self {
            RideState::Error(failure) => Some(failure),
            _ => None,
        }
    }

    /// Returns true while a ride has been submitted and not yet finished.
    pub fn is_active_ride(&self) -> bool {
        self.kind().is_active_ride()
    }
}

impl fmt::Display for RideState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RideState::Error(failure) => write!(f, "error({})", failure.kind()),
            other => write!(f, "{}", other.kind()),
        }
    }
}

/// Shape of a `RideState`: its case identity without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStateKind {
    Idle,
    SelectingLocations,
    RouteReady,
    SubmittingRequest,
    SearchingForDriver,
    DriverAssigned,
    DriverEnRoute,
    DriverArriving,
    RideInProgress,
    ApproachingDestination,
    RideCompleted,
    Error,
}

impl RideStateKind {
    /// Every shape, in lifecycle order.
    pub const ALL: [RideStateKind; 12] = [
        RideStateKind::Idle,
        RideStateKind::SelectingLocations,
        RideStateKind::RouteReady,
        RideStateKind::SubmittingRequest,
        RideStateKind::SearchingForDriver,
        RideStateKind::DriverAssigned,
        RideStateKind::DriverEnRoute,
        RideStateKind::DriverArriving,
        RideStateKind::RideInProgress,
        RideStateKind::ApproachingDestination,
        RideStateKind::RideCompleted,
        RideStateKind::Error,
    ];

    /// Shapes during which a ride request exists and can be cancelled.
    pub fn is_active_ride(&self) -> bool {
        matches!(
            self,
            RideStateKind::SubmittingRequest
                | RideStateKind::SearchingForDriver
                | RideStateKind::DriverAssigned
                | RideStateKind::DriverEnRoute
                | RideStateKind::DriverArriving
                | RideStateKind::RideInProgress
                | RideStateKind::ApproachingDestination
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RideStateKind::Idle => "idle",
            RideStateKind::SelectingLocations => "selecting_locations",
            RideStateKind::RouteReady => "route_ready",
            RideStateKind::SubmittingRequest => "submitting_request",
            RideStateKind::SearchingForDriver => "searching_for_driver",
            RideStateKind::DriverAssigned => "driver_assigned",
            RideStateKind::DriverEnRoute => "driver_en_route",
            RideStateKind::DriverArriving => "driver_arriving",
            RideStateKind::RideInProgress => "ride_in_progress",
            RideStateKind::ApproachingDestination => "approaching_destination",
            RideStateKind::RideCompleted => "ride_completed",
            RideStateKind::Error => "error",
        }
    }
}

impl fmt::Display for RideStateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::DriverId;
    use crate::domain::ride::Vehicle;

    fn point(lat: f64, lon: f64) -> LocationPoint {
        LocationPoint::from_lat_lon(lat, lon).unwrap()
    }

    fn driver() -> DriverInfo {
        DriverInfo::new(
            DriverId::new("d1").unwrap(),
            "Sam",
            4.9,
            Vehicle::new("Honda", "Civic", "Blue", "XYZ-1"),
        )
        .unwrap()
    }

    fn en_route() -> RideState {
        RideState::DriverEnRoute {
            ride_id: RideId::new("r1").unwrap(),
            driver: driver(),
            eta: Duration::from_secs(180),
            pickup: point(1.0, 1.0),
            destination: point(2.0, 2.0),
        }
    }

    #[test]
    fn default_is_idle() {
        assert_eq!(RideState::default(), RideState::Idle);
    }

    #[test]
    fn error_constructor_flattens_nested_errors() {
        let route_ready = RideState::RouteReady {
            pickup: point(1.0, 1.0),
            destination: point(2.0, 2.0),
            route: RouteInfo::new(10.0, 10.0).unwrap(),
        };
        let first = RideState::error(RideErrorKind::NetworkUnavailable, Some(route_ready.clone()));
        let second = RideState::error(RideErrorKind::RideRequestFailed, Some(first));

        let failure = second.failure().unwrap();
        assert_eq!(failure.kind(), &RideErrorKind::RideRequestFailed);
        assert_eq!(failure.previous(), Some(&route_ready));
    }

    #[test]
    fn error_wrapping_error_without_previous_has_none() {
        let first = RideState::error(RideErrorKind::NetworkUnavailable, None);
        let second = RideState::error(RideErrorKind::RideRequestFailed, Some(first));
        assert_eq!(second.failure().unwrap().previous(), None);
    }

    #[test]
    fn projections_follow_payload() {
        let state = en_route();
        assert_eq!(state.kind(), RideStateKind::DriverEnRoute);
        assert_eq!(state.ride_id().map(|id| id.as_str()), Some("r1"));
        assert_eq!(state.driver(), Some(&driver()));
        assert_eq!(state.eta(), Some(Duration::from_secs(180)));
        assert_eq!(state.pickup(), Some(&point(1.0, 1.0)));
        assert_eq!(state.destination(), Some(&point(2.0, 2.0)));
        assert!(state.route().is_none());
        assert!(state.is_active_ride());
    }

    #[test]
    fn selecting_locations_projects_optional_points() {
        let state = RideState::SelectingLocations {
            pickup: Some(point(1.0, 1.0)),
            destination: None,
        };
        assert_eq!(state.pickup(), Some(&point(1.0, 1.0)));
        assert_eq!(state.destination(), None);
        assert!(state.ride_id().is_none());
        assert!(!state.is_active_ride());
    }

    #[test]
    fn idle_and_error_project_nothing() {
        for state in [
            RideState::Idle,
            RideState::error(RideErrorKind::NetworkUnavailable, Some(en_route())),
        ] {
            assert!(state.pickup().is_none());
            assert!(state.driver().is_none());
            assert!(state.eta().is_none());
        }
    }

    #[test]
    fn kind_display_is_snake_case() {
        assert_eq!(RideStateKind::SearchingForDriver.to_string(), "searching_for_driver");
        assert_eq!(en_route().to_string(), "driver_en_route");
        assert_eq!(
            RideState::error(RideErrorKind::RideRequestFailed, None).to_string(),
            "error(ride request failed)"
        );
    }

    #[test]
    fn serializes_with_state_tag() {
        let json = serde_json::to_value(RideState::SelectingLocations {
            pickup: None,
            destination: None,
        })
        .unwrap();
        assert_eq!(json["state"], "selecting_locations");
    }

    #[test]
    fn deserialization_flattens_nested_errors() {
        let json = r#"{
            "state": "error",
            "kind": "ride_request_failed",
            "previous": {
                "state": "error",
                "kind": "network_unavailable",
                "previous": { "state": "idle" }
            }
        }"#;
        let state: RideState = serde_json::from_str(json).unwrap();
        assert_eq!(state.failure().unwrap().previous(), Some(&RideState::Idle));
    }

    #[test]
    fn all_contains_every_kind_once() {
        let kinds: std::collections::HashSet<_> = RideStateKind::ALL.iter().collect();
        assert_eq!(kinds.len(), RideStateKind::ALL.len());
    }
}
