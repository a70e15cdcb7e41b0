//! Application layer - orchestration of the ride domain over its ports.
//!
//! `ride_flow` owns the single current ride state, converts rider intents
//! and collaborator responses into validated transitions, and drives the
//! asynchronous sequence of a ride.

pub mod ride_flow;

pub use ride_flow::{
    DriverSignal, FlowError, FlowOutcome, FlowTimings, RideFlowBuilder, RideFlowController,
    RideTransition,
};
