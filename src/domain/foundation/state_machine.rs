//! State machine trait for state-shape enums.
//!
//! Provides a consistent interface for validating transitions between the
//! shapes of a lifecycle, independent of any payload the states carry.

use std::fmt;

/// A rejected transition between two state shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition<S> {
    pub from: S,
    pub to: S,
}

impl<S: fmt::Debug> fmt::Display for InvalidTransition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot transition from {:?} to {:?}", self.from, self.to)
    }
}

impl<S: fmt::Debug> std::error::Error for InvalidTransition<S> {}

/// Trait for shape enums that represent state machines.
///
/// Implementors define the adjacency table in `valid_transitions` and get
/// validated transition methods for free.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for RideStateKind {
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Idle => vec![SelectingLocations, Error],
///             // ... etc
///         }
///     }
/// }
///
/// let next = RideStateKind::Idle.transition_to(RideStateKind::SelectingLocations)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + fmt::Debug {
    /// Returns all valid target shapes from this shape.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, InvalidTransition<Self>> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(InvalidTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// Checks if this shape is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
