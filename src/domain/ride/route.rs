//! RouteInfo value object.
//!
//! The route geometry itself belongs to the map layer; the core only keeps
//! an opaque reference to it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::domain::foundation::ValidationError;

/// Opaque reference to a route shape owned by the map-display layer
/// (for example an encoded polyline or a provider route id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteShapeRef(String);

impl RouteShapeRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteShapeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Distance and duration of a calculated route.
///
/// # Invariants
///
/// - `distance_meters` is finite and non-negative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInfo {
    distance_meters: f64,
    expected_travel_time: Duration,
    shape: Option<RouteShapeRef>,
}

impl RouteInfo {
    /// Creates route info from a distance in meters and a travel time in seconds.
    pub fn new(distance_meters: f64, travel_time_secs: f64) -> Result<Self, ValidationError> {
        if !distance_meters.is_finite() || distance_meters < 0.0 {
            return Err(ValidationError::out_of_range(
                "distance_meters",
                0.0,
                f64::MAX,
                distance_meters,
            ));
        }
        let expected_travel_time = Duration::try_from_secs_f64(travel_time_secs).map_err(|_| {
            ValidationError::out_of_range("travel_time_secs", 0.0, u64::MAX as f64, travel_time_secs)
        })?;
        Ok(Self {
            distance_meters,
            expected_travel_time,
            shape: None,
        })
    }

    /// Attaches the shape reference returned by the routing provider.
    pub fn with_shape(mut self, shape: RouteShapeRef) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn distance_meters(&self) -> f64 {
        self.distance_meters
    }

    pub fn expected_travel_time(&self) -> Duration {
        self.expected_travel_time
    }

    pub fn shape(&self) -> Option<&RouteShapeRef> {
        self.shape.as_ref()
    }
}
