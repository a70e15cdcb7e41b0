//! RideStateMachine - pure transition validator over ride states.
//!
//! The machine validates shape-level legality only. Payload correctness is
//! the flow controller's responsibility. Illegal transitions never panic;
//! they degrade to a recoverable `Error` state.

use crate::domain::foundation::StateMachine;

use super::{RideErrorKind, RideState, RideStateKind};

impl StateMachine for RideStateKind {
    fn valid_transitions(&self) -> Vec<Self> {
        use RideStateKind::*;
        match self {
            Idle => vec![SelectingLocations, Error],
            SelectingLocations => vec![SelectingLocations, RouteReady, Idle, Error],
            RouteReady => vec![SubmittingRequest, SelectingLocations, Error],
            SubmittingRequest => vec![SearchingForDriver, Error],
            SearchingForDriver => vec![DriverAssigned, Idle, Error],
            DriverAssigned => vec![DriverEnRoute, Idle, Error],
            DriverEnRoute => vec![DriverArriving, Idle, Error],
            DriverArriving => vec![RideInProgress, Idle, Error],
            // Completion may skip ApproachingDestination.
            RideInProgress => vec![ApproachingDestination, RideCompleted, Idle, Error],
            ApproachingDestination => vec![RideCompleted, Idle, Error],
            RideCompleted => vec![Idle, Error],
            Error => vec![Idle, SelectingLocations],
        }
    }
}

/// Pure, side-effect-free transition function over `RideState` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct RideStateMachine;

impl RideStateMachine {
    /// Shapes reachable from the shape of `from`. Static, not data-dependent.
    pub fn valid_next_states(from: &RideState) -> Vec<RideStateKind> {
        from.kind().valid_transitions()
    }

    /// Returns `to` unchanged if its shape is reachable from `from`, otherwise
    /// an `Error(InvalidTransition)` state whose previous state is `from`.
    pub fn transition(from: &RideState, to: RideState) -> RideState {
        match from.kind().transition_to(to.kind()) {
            Ok(_) => to,
            Err(rejected) => RideState::error(
                RideErrorKind::InvalidTransition {
                    from: rejected.from,
                    to: rejected.to,
                },
                Some(from.clone()),
            ),
        }
    }
}
