//! safe-route-planner core
//!
//! Generates candidate routes between two points, scores each against local
//! crime, lighting, population, infrastructure and network data, and picks
//! the best route for each of several safety-oriented categories.

pub mod config;
pub mod error;
pub mod geo;
pub mod haversine;
pub mod instructions;
pub mod layers;
pub mod osrm;
pub mod polyline;
pub mod request;
pub mod response;
pub mod route;
pub mod safety;
pub mod solver;
pub mod traits;
pub mod waypoints;
