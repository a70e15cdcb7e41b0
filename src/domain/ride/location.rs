//! LocationPoint value object.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{Coordinate, ValidationError};

/// A point chosen by the rider: a coordinate plus an optional display name.
///
/// Two points are equal iff coordinate and name match exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPoint {
    coordinate: Coordinate,
    name: Option<String>,
}

impl LocationPoint {
    /// Creates an unnamed point.
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            name: None,
        }
    }

    /// Creates a point with a display name.
    pub fn named(coordinate: Coordinate, name: impl Into<String>) -> Self {
        Self {
            coordinate,
            name: Some(name.into()),
        }
    }

    /// Creates an unnamed point from raw latitude/longitude.
    pub fn from_lat_lon(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        Ok(Self::new(Coordinate::new(latitude, longitude)?))
    }

    pub fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns true if both points share a coordinate, whatever their names.
    pub fn same_place_as(&self, other: &LocationPoint) -> bool {
        self.coordinate == other.coordinate
    }
}

impl fmt::Display for LocationPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", name, self.coordinate),
            None => write!(f, "{}", self.coordinate),
        }
    }
}
