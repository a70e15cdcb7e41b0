//! Ports - Interfaces for external collaborators.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the ride flow core and the outside world. Adapters implement these ports.
//!
//! - `RoutingService` - route distance/time between two points
//! - `RideBackendService` - ride creation, status polling, cancellation
//! - `GeocodingService` - address to coordinate lookup (address-entry layer)

mod geocoding;
mod ride_backend;
mod routing;

pub use geocoding::{GeocodedAddress, GeocodingError, GeocodingService};
pub use ride_backend::{
    BackendError, RideBackendService, RideRequestReceipt, RideStatus, RideStatusReport,
};
pub use routing::{RoutingError, RoutingService};
