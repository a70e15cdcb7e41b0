//! Offline routing: great-circle distance at a constant average speed.
//!
//! Used by the demo binary and when no routing server is configured.

use async_trait::async_trait;

use crate::domain::foundation::Coordinate;
use crate::domain::ride::{LocationPoint, RouteInfo};
use crate::ports::{RoutingError, RoutingService};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Default average speed, roughly 30 km/h in city traffic.
pub const DEFAULT_SPEED_MPS: f64 = 8.33;

#[derive(Debug, Clone)]
pub struct StraightLineRouting {
    speed_mps: f64,
}

impl Default for StraightLineRouting {
    fn default() -> Self {
        Self {
            speed_mps: DEFAULT_SPEED_MPS,
        }
    }
}

impl StraightLineRouting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the average speed. Non-positive or non-finite speeds are ignored.
    pub fn with_speed_mps(mut self, speed_mps: f64) -> Self {
        if speed_mps.is_finite() && speed_mps > 0.0 {
            self.speed_mps = speed_mps;
        }
        self
    }
}

#[async_trait]
impl RoutingService for StraightLineRouting {
    async fn calculate_route(
        &self,
        from: &LocationPoint,
        to: &LocationPoint,
    ) -> Result<RouteInfo, RoutingError> {
        let distance = haversine_meters(from.coordinate(), to.coordinate());
        RouteInfo::new(distance, distance / self.speed_mps)
            .map_err(|e| RoutingError::Parse(e.to_string()))
    }
}

/// Great-circle distance between two coordinates.
pub fn haversine_meters(a: &Coordinate, b: &Coordinate) -> f64 {
    let (lat1, lat2) = (a.latitude().to_radians(), b.latitude().to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (b.longitude() - a.longitude()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}
