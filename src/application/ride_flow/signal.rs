//! Signals from the map/animation layer.
//!
//! The animation layer moves the driver marker along the route and fires
//! each signal at most once per leg. Duplicates are harmless: the
//! transitions they trigger are guarded.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverSignal {
    /// The driver crossed the "arriving" threshold near the pickup.
    ReachedApproachThreshold,
    /// The driver reached the pickup point and the rider boarded.
    ReachedPickup,
}
