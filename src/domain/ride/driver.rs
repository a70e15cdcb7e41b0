//! DriverInfo value object.
//!
//! Driver data is display data for the UI layer. It is never mutated in
//! place; updated data arrives as a new value inside a new state.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::time::Duration;

use crate::domain::foundation::{Coordinate, DriverId, ValidationError};

/// Maximum driver rating.
pub const MAX_RATING: f32 = 5.0;

/// Vehicle descriptors shown to the rider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub make: String,
    pub model: String,
    pub color: String,
    pub license_plate: String,
}

impl Vehicle {
    pub fn new(
        make: impl Into<String>,
        model: impl Into<String>,
        color: impl Into<String>,
        license_plate: impl Into<String>,
    ) -> Self {
        Self {
            make: make.into(),
            model: model.into(),
            color: color.into(),
            license_plate: license_plate.into(),
        }
    }
}

/// The driver assigned to a ride.
///
/// Identity is by `id`: equality and hashing ignore every other field,
/// since those may be stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverInfo {
    id: DriverId,
    name: String,
    rating: f32,
    vehicle: Vehicle,
    photo_url: Option<String>,
    phone_number: Option<String>,
    location: Option<Coordinate>,
    eta: Option<Duration>,
}

impl DriverInfo {
    /// Creates driver info.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if name is blank
    /// - `OutOfRange` if rating is outside 0-5
    pub fn new(
        id: DriverId,
        name: impl Into<String>,
        rating: f32,
        vehicle: Vehicle,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("driver_name"));
        }
        if !rating.is_finite() || !(0.0..=MAX_RATING).contains(&rating) {
            return Err(ValidationError::out_of_range(
                "rating",
                0.0,
                MAX_RATING as f64,
                rating as f64,
            ));
        }
        Ok(Self {
            id,
            name,
            rating,
            vehicle,
            photo_url: None,
            phone_number: None,
            location: None,
            eta: None,
        })
    }

    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }

    pub fn with_phone_number(mut self, phone: impl Into<String>) -> Self {
        self.phone_number = Some(phone.into());
        self
    }

    pub fn with_location(mut self, location: Coordinate) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_eta(mut self, eta: Duration) -> Self {
        self.eta = Some(eta);
        self
    }

    pub fn id(&self) -> &DriverId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rating(&self) -> f32 {
        self.rating
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    /// Last known location, if the backend reported one.
    pub fn location(&self) -> Option<&Coordinate> {
        self.location.as_ref()
    }

    pub fn eta(&self) -> Option<Duration> {
        self.eta
    }
}

impl PartialEq for DriverInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DriverInfo {}

impl Hash for DriverInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
