//! Adapters - Implementations of port interfaces.
//!
//! - `osrm` - routing over the OSRM HTTP API
//! - `straight_line` - offline great-circle routing
//! - `nominatim` - geocoding over OpenStreetMap's Nominatim
//! - `simulated` - in-memory ride backend with a fixed driver roster
//! - `mock` - scripted collaborators for tests

pub mod mock;
pub mod nominatim;
pub mod osrm;
pub mod simulated;
pub mod straight_line;

pub use mock::{MockGeocoder, MockRideBackend, MockRoutingService};
pub use nominatim::{NominatimConfig, NominatimGeocoder};
pub use osrm::{OsrmConfig, OsrmRoutingService};
pub use simulated::SimulatedRideBackend;
pub use straight_line::{haversine_meters, StraightLineRouting, DEFAULT_SPEED_MPS};
