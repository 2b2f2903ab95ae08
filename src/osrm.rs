//! OSRM HTTP adapter for route geometries.

use serde::Deserialize;

use crate::error::ProviderError;
use crate::geo::SpatialPoint;
use crate::polyline::Polyline;
use crate::route::{Maneuver, ManeuverKind, Provenance, RouteCandidate, RouteStep};
use crate::traits::{RouteProvider, RouteQuery};

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://router.project-osrm.org".to_string(),
            profile: "driving".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn route_url(&self, query: &RouteQuery) -> String {
        let mut stops = vec![query.start];
        stops.extend(query.via);
        stops.push(query.end);

        let coords = stops
            .iter()
            .map(|p| format!("{:.6},{:.6}", p.lon, p.lat))
            .collect::<Vec<_>>()
            .join(";");

        let base = self.config.base_url.trim_end_matches('/');
        let options = "steps=true&overview=full&geometries=geojson";
        match query.via {
            Some(_) => format!("{}/route/v1/{}/{}?{}", base, self.config.profile, coords, options),
            None => format!(
                "{}/route/v1/{}/{}?alternatives={}&{}",
                base, self.config.profile, coords, query.alternatives, options
            ),
        }
    }
}

impl RouteProvider for OsrmClient {
    fn fetch_routes(&self, query: &RouteQuery) -> Result<Vec<RouteCandidate>, ProviderError> {
        let url = self.route_url(query);
        tracing::debug!(%url, "requesting OSRM routes");

        let response = self.client.get(&url).send()?;
        let status = response.status();
        let body = match response.json::<OsrmRouteResponse>() {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(ProviderError::Service {
                    code: status.to_string(),
                    message: "non-success HTTP status".to_string(),
                });
            }
            Err(err) => return Err(ProviderError::Malformed(err.to_string())),
        };

        let provenance = match query.via {
            Some(_) => Provenance::Strategic,
            None => Provenance::Direct,
        };
        body.into_candidates(provenance)
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

impl OsrmRouteResponse {
    fn into_candidates(self, provenance: Provenance) -> Result<Vec<RouteCandidate>, ProviderError> {
        match self.code.as_str() {
            "Ok" => {}
            "NoRoute" | "NoSegment" => return Ok(Vec::new()),
            _ => {
                return Err(ProviderError::Service {
                    code: self.code,
                    message: self.message.unwrap_or_default(),
                });
            }
        }

        let total = self.routes.len();
        let candidates: Vec<RouteCandidate> = self
            .routes
            .into_iter()
            .filter_map(|route| route.into_candidate(provenance))
            .collect();
        if candidates.len() < total {
            tracing::debug!(
                dropped = total - candidates.len(),
                "dropped unusable OSRM routes"
            );
        }
        Ok(candidates)
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    distance: f64,
    duration: f64,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

impl OsrmRoute {
    fn into_candidate(self, provenance: Provenance) -> Option<RouteCandidate> {
        let steps = self
            .legs
            .into_iter()
            .flat_map(|leg| leg.steps)
            .filter_map(OsrmStep::into_step)
            .collect();
        let geometry = Polyline::from_lon_lat(&self.geometry.coordinates);
        RouteCandidate::new(geometry, self.distance, self.duration, provenance)
            .map(|candidate| candidate.with_steps(steps))
    }
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    #[serde(default)]
    name: String,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    maneuver: OsrmManeuver,
}

impl OsrmStep {
    fn into_step(self) -> Option<RouteStep> {
        let location = SpatialPoint::from_lon_lat(self.maneuver.location);
        if !location.is_valid() {
            return None;
        }
        Some(RouteStep {
            maneuver: Maneuver {
                kind: ManeuverKind::parse(&self.maneuver.kind),
                modifier: self.maneuver.modifier,
                location,
                exit: self.maneuver.exit,
            },
            road_name: self.name,
            distance: self.distance.max(0.0),
            duration: self.duration.max(0.0),
        })
    }
}

#[derive(Debug, Deserialize)]
struct OsrmManeuver {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    modifier: Option<String>,
    location: [f64; 2],
    #[serde(default)]
    exit: Option<u32>,
}
