//! RoutingService port - Interface for route calculation providers.
//!
//! The core performs a single attempt per call; retries, if any, belong to
//! the adapter.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ride::{LocationPoint, RideErrorKind, RouteInfo};

/// Port for route calculation.
#[async_trait]
pub trait RoutingService: Send + Sync {
    /// Calculates a route between two points.
    async fn calculate_route(
        &self,
        from: &LocationPoint,
        to: &LocationPoint,
    ) -> Result<RouteInfo, RoutingError>;
}

/// Errors from routing providers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoutingError {
    /// The origin cannot be routed from (e.g. not on the road network).
    #[error("invalid origin: {0}")]
    InvalidOrigin(String),

    /// The destination cannot be routed to.
    #[error("invalid destination: {0}")]
    InvalidDestination(String),

    /// No route exists between the points.
    #[error("no route found")]
    NoRoute,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Provider returned an error status.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),
}

impl RoutingError {
    /// Maps this error to the ride error kind shown to the rider.
    pub fn to_ride_error(&self) -> RideErrorKind {
        match self {
            RoutingError::InvalidOrigin(_) => RideErrorKind::InvalidPickupLocation,
            RoutingError::InvalidDestination(_) => RideErrorKind::InvalidDestinationLocation,
            _ => RideErrorKind::RouteCalculationFailed,
        }
    }
}
