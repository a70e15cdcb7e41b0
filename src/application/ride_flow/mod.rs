//! Ride flow controller.
//!
//! # Concurrency
//!
//! All state reads and writes go through one short critical section that is
//! never held across an await point, so observers never see a partial state
//! and no two transitions interleave. Asynchronous continuations (collaborator
//! responses, fixed-delay waits) re-enter that section and are discarded if
//! the flow generation or the expected state shape changed while they were
//! suspended.
//!
//! # Observers
//!
//! - `subscribe()` - watch channel holding the latest state
//! - `transitions()` - broadcast of every applied transition, in order

mod controller;
mod error;
mod signal;
mod timings;

pub use controller::{
    FlowOutcome, RideFlowBuilder, RideFlowController, RideTransition, DEFAULT_SIGNAL_BUFFER,
};
pub use error::FlowError;
pub use signal::DriverSignal;
pub use timings::FlowTimings;
