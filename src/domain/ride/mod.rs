//! Ride domain module.
//!
//! Models a single rider's journey from choosing locations to ride
//! completion:
//!
//! - `RideState` - closed set of lifecycle stages, each with its own payload
//! - `RideStateMachine` - pure validator of stage-to-stage transitions
//! - `LocationPoint`, `RouteInfo`, `DriverInfo` - immutable payload values
//! - `RideErrorKind` - taxonomy of failures carried by the error stage

mod driver;
mod error_kind;
mod location;
mod machine;
mod route;
mod state;

pub use driver::{DriverInfo, Vehicle, MAX_RATING};
pub use error_kind::{RecoveryAction, RideErrorKind};
pub use location::LocationPoint;
pub use machine::RideStateMachine;
pub use route::{RouteInfo, RouteShapeRef};
pub use state::{RideFailure, RideState, RideStateKind};
