//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (identifiers, coordinates, errors, state machine trait)
//! - `ride` - Ride lifecycle states, payload values and the transition machine

pub mod foundation;
pub mod ride;
