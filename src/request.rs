//! Route request input and flagged risk zones.

use serde::{Deserialize, Serialize};

use crate::error::RequestError;
use crate::geo::SpatialPoint;

/// Severity assigned to a flagged zone by its reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Exposure added per sampled point near a zone of this level.
    pub fn weight(&self) -> f64 {
        match self {
            RiskLevel::Critical => 0.4,
            RiskLevel::High => 0.3,
            RiskLevel::Medium => 0.2,
            RiskLevel::Low => 0.1,
        }
    }
}

/// A risk zone supplied with the request. Never stored by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedZone {
    pub latitude: f64,
    pub longitude: f64,
    pub risk_level: RiskLevel,
    #[serde(default = "default_active", alias = "is_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl FlaggedZone {
    pub fn new(point: SpatialPoint, risk_level: RiskLevel) -> Self {
        Self {
            latitude: point.lat,
            longitude: point.lon,
            risk_level,
            active: true,
        }
    }

    pub fn point(&self) -> SpatialPoint {
        SpatialPoint::new(self.latitude, self.longitude)
    }
}

/// Origin/destination request as received from callers.
///
/// Coordinates are optional at the type level so that a missing field is
/// reported as a validation error rather than a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    #[serde(default, alias = "start_latitude")]
    pub start_lat: Option<f64>,
    #[serde(default, alias = "start_longitude")]
    pub start_lon: Option<f64>,
    #[serde(default, alias = "end_latitude")]
    pub end_lat: Option<f64>,
    #[serde(default, alias = "end_longitude")]
    pub end_lon: Option<f64>,
    #[serde(default)]
    pub flagged_zones: Vec<FlaggedZone>,
    /// Reserved; accepted and range-checked but not used in scoring.
    #[serde(default)]
    pub safety_priority: Option<f64>,
}

/// The endpoints of a request that passed validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endpoints {
    pub start: SpatialPoint,
    pub end: SpatialPoint,
}

impl RouteRequest {
    pub fn new(start: SpatialPoint, end: SpatialPoint) -> Self {
        Self {
            start_lat: Some(start.lat),
            start_lon: Some(start.lon),
            end_lat: Some(end.lat),
            end_lon: Some(end.lon),
            ..Self::default()
        }
    }

    /// Parses a JSON payload. Syntax and type errors become
    /// [`RequestError::Malformed`]; absent fields are left for [`Self::validate`].
    pub fn from_json(raw: &str) -> Result<Self, RequestError> {
        serde_json::from_str(raw).map_err(|err| RequestError::Malformed(err.to_string()))
    }

    pub fn with_flagged_zones(mut self, zones: Vec<FlaggedZone>) -> Self {
        self.flagged_zones = zones;
        self
    }

    /// Checks presence and range of every coordinate.
    pub fn validate(&self) -> Result<Endpoints, RequestError> {
        let start = SpatialPoint::new(
            coordinate("start_lat", self.start_lat, 90.0)?,
            coordinate("start_lon", self.start_lon, 180.0)?,
        );
        let end = SpatialPoint::new(
            coordinate("end_lat", self.end_lat, 90.0)?,
            coordinate("end_lon", self.end_lon, 180.0)?,
        );

        for zone in &self.flagged_zones {
            coordinate("flagged_zones.latitude", Some(zone.latitude), 90.0)?;
            coordinate("flagged_zones.longitude", Some(zone.longitude), 180.0)?;
        }

        if let Some(priority) = self.safety_priority {
            bounded("safety_priority", priority, 0.0, 100.0)?;
        }

        Ok(Endpoints { start, end })
    }
}

fn coordinate(field: &'static str, value: Option<f64>, limit: f64) -> Result<f64, RequestError> {
    let value = value.ok_or(RequestError::Missing { field })?;
    bounded(field, value, -limit, limit)
}

fn bounded(field: &'static str, value: f64, min: f64, max: f64) -> Result<f64, RequestError> {
    if !value.is_finite() {
        return Err(RequestError::NotFinite { field });
    }
    if value < min || value > max {
        return Err(RequestError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(value)
}
