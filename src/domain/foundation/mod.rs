//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, the state machine trait and the
//! validation error type that form the vocabulary of the ride domain.

mod coordinate;
mod errors;
mod ids;
mod state_machine;

pub use coordinate::Coordinate;
pub use errors::ValidationError;
pub use ids::{DriverId, RideId};
pub use state_machine::{InvalidTransition, StateMachine};
