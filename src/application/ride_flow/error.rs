//! Errors returned by flow controller operations.
//!
//! Collaborator failures are never returned here; they become
//! `RideState::Error`. A `FlowError` means the operation was refused and
//! the state is unchanged.

use thiserror::Error;

use crate::domain::ride::RideStateKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FlowError {
    /// The operation's precondition does not hold in the current state.
    #[error("{operation} is not allowed while {state}")]
    NotAllowed {
        operation: &'static str,
        state: RideStateKind,
    },

    /// The state machine rejected the transition.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: RideStateKind,
        to: RideStateKind,
    },

    /// An address operation was requested without a geocoding service.
    #[error("no geocoding service configured")]
    GeocoderUnavailable,

    /// The operation starts background work and no Tokio runtime is running.
    #[error("{operation} needs a running Tokio runtime")]
    NoRuntime { operation: &'static str },
}

impl FlowError {
    pub(crate) fn not_allowed(operation: &'static str, state: RideStateKind) -> Self {
        FlowError::NotAllowed { operation, state }
    }

    pub(crate) fn no_runtime(operation: &'static str) -> Self {
        FlowError::NoRuntime { operation }
    }
}
