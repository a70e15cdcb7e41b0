//! Ride Flow - ride-lifecycle orchestration core for a ride-hailing client
//!
//! Takes a rider from choosing pickup and destination, through route
//! calculation, ride request, driver search and assignment, driver approach,
//! the trip itself, to completion. A single controller owns the current
//! `RideState`; every change is validated against a fixed transition table.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
