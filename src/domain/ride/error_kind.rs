//! Ride error taxonomy.
//!
//! These are error *kinds* carried by `RideState::Error`, not exception
//! types. Human-readable copy is owned by the presentation layer and keyed
//! off `code()`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::RideStateKind;

/// What the presentation layer should offer the rider to recover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    /// Send the rider to system settings.
    OpenSettings,
    /// Offer to repeat the failed operation.
    Retry,
    /// Only offer to dismiss the error.
    Dismiss,
}

/// Kinds of failure a ride flow can end up in.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideErrorKind {
    #[error("location permission denied")]
    LocationPermissionDenied,

    #[error("location services disabled")]
    LocationServicesDisabled,

    #[error("current location unavailable")]
    LocationUnavailable,

    #[error("address could not be geocoded")]
    GeocodingFailed,

    #[error("route calculation failed")]
    RouteCalculationFailed,

    #[error("invalid pickup location")]
    InvalidPickupLocation,

    #[error("invalid destination location")]
    InvalidDestinationLocation,

    #[error("network unavailable")]
    NetworkUnavailable,

    #[error("ride request failed")]
    RideRequestFailed,

    /// A structurally illegal transition was requested. This is a
    /// programming error in the flow controller, not a user-facing failure.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: RideStateKind,
        to: RideStateKind,
    },

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl RideErrorKind {
    /// Creates an unknown error wrapping the underlying cause.
    pub fn unknown(underlying: impl std::fmt::Display) -> Self {
        RideErrorKind::Unknown(underlying.to_string())
    }

    /// Stable key for presentation-layer message lookup.
    pub fn code(&self) -> &'static str {
        match self {
            RideErrorKind::LocationPermissionDenied => "location_permission_denied",
            RideErrorKind::LocationServicesDisabled => "location_services_disabled",
            RideErrorKind::LocationUnavailable => "location_unavailable",
            RideErrorKind::GeocodingFailed => "geocoding_failed",
            RideErrorKind::RouteCalculationFailed => "route_calculation_failed",
            RideErrorKind::InvalidPickupLocation => "invalid_pickup_location",
            RideErrorKind::InvalidDestinationLocation => "invalid_destination_location",
            RideErrorKind::NetworkUnavailable => "network_unavailable",
            RideErrorKind::RideRequestFailed => "ride_request_failed",
            RideErrorKind::InvalidTransition { .. } => "invalid_transition",
            RideErrorKind::Unknown(_) => "unknown",
        }
    }

    /// The recovery the presentation layer should pair with this error.
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            RideErrorKind::LocationPermissionDenied | RideErrorKind::LocationServicesDisabled => {
                RecoveryAction::OpenSettings
            }
            RideErrorKind::LocationUnavailable
            | RideErrorKind::GeocodingFailed
            | RideErrorKind::RouteCalculationFailed
            | RideErrorKind::NetworkUnavailable
            | RideErrorKind::RideRequestFailed => RecoveryAction::Retry,
            RideErrorKind::InvalidPickupLocation
            | RideErrorKind::InvalidDestinationLocation
            | RideErrorKind::InvalidTransition { .. }
            | RideErrorKind::Unknown(_) => RecoveryAction::Dismiss,
        }
    }

    /// Returns true for errors that indicate a bug rather than a runtime failure.
    pub fn is_programming_error(&self) -> bool {
        matches!(self, RideErrorKind::InvalidTransition { .. })
    }
}
