//! Test fixtures for safe-route-planner.
//!
//! Provides realistic test data including:
//! - Real Bangalore locations (from OpenStreetMap)
//! - A scripted route provider for deterministic planning tests

pub mod bangalore_locations;
pub mod providers;

#[allow(unused_imports)]
pub use bangalore_locations::*;
#[allow(unused_imports)]
pub use providers::*;
