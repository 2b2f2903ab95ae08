//! Reference layers and their spatial indexes.
//!
//! Five independent CSV tables (crime, lighting, population, infrastructure,
//! network) are loaded once into R-trees keyed on `[lat, lon]`. A missing,
//! empty, or unreadable table never fails the engine: queries against that
//! layer return neutral defaults instead.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use rstar::{AABB, RTree, RTreeObject};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::error::DatasetError;
use crate::geo::SpatialPoint;
use crate::traits::GeoRecord;

/// Crime lookups radius (~300 m).
pub const CRIME_RADIUS_DEG: f64 = 0.003;
/// Lighting, population, infrastructure and network lookup radius (~500 m).
pub const LAYER_RADIUS_DEG: f64 = 0.005;
/// Landmark search radius (~1 km).
pub const LANDMARK_RADIUS_DEG: f64 = 0.01;

pub const DEFAULT_LIGHTING: f64 = 5.0;
pub const DEFAULT_POPULATION: f64 = 15000.0;
pub const DEFAULT_INFRASTRUCTURE: f64 = 5.0;
pub const DEFAULT_NETWORK: f64 = 5.0;
pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Crime,
    Lighting,
    Population,
    Infrastructure,
    Network,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Layer::Crime => "crime",
            Layer::Lighting => "lighting",
            Layer::Population => "population",
            Layer::Infrastructure => "infrastructure",
            Layer::Network => "network",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CrimeRecord {
    pub point: SpatialPoint,
    pub crime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightingRecord {
    pub point: SpatialPoint,
    /// 0-10.
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopulationRecord {
    pub point: SpatialPoint,
    pub density: f64,
    pub is_main_road: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfrastructureRecord {
    pub point: SpatialPoint,
    /// 0-10.
    pub score: f64,
    pub landmark: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkRecord {
    pub point: SpatialPoint,
    /// 0-10.
    pub score: f64,
    pub network_type: Option<String>,
}

macro_rules! geo_record {
    ($($ty:ty),*) => {
        $(impl GeoRecord for $ty {
            fn point(&self) -> SpatialPoint {
                self.point
            }
        })*
    };
}

geo_record!(CrimeRecord, LightingRecord, PopulationRecord, InfrastructureRecord, NetworkRecord);

// ============================================================================
// Index
// ============================================================================

struct IndexedRecord<T> {
    record: T,
    envelope: AABB<[f64; 2]>,
}

impl<T> RTreeObject for IndexedRecord<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Nearest-neighbor index over one layer.
pub struct LayerIndex<T> {
    tree: RTree<IndexedRecord<T>>,
}

impl<T: GeoRecord> LayerIndex<T> {
    pub fn new(records: Vec<T>) -> Self {
        let entries = records
            .into_iter()
            .map(|record| {
                let p = record.point();
                IndexedRecord {
                    record,
                    envelope: AABB::from_point([p.lat, p.lon]),
                }
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn empty() -> Self {
        Self { tree: RTree::new() }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Records within `radius_deg` of `point` (planar degree distance, inclusive).
    pub fn query(&self, point: SpatialPoint, radius_deg: f64) -> Vec<&T> {
        self.within(point, radius_deg).map(|(record, _)| record).collect()
    }

    /// Closest record within `radius_deg` that satisfies `accept`.
    pub fn nearest_within(
        &self,
        point: SpatialPoint,
        radius_deg: f64,
        accept: impl Fn(&T) -> bool,
    ) -> Option<&T> {
        self.within(point, radius_deg)
            .filter(|(record, _)| accept(*record))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(record, _)| record)
    }

    fn within(
        &self,
        point: SpatialPoint,
        radius_deg: f64,
    ) -> impl Iterator<Item = (&T, f64)> + '_ {
        let query_env = AABB::from_corners(
            [point.lat - radius_deg, point.lon - radius_deg],
            [point.lat + radius_deg, point.lon + radius_deg],
        );
        self.tree
            .locate_in_envelope_intersecting(&query_env)
            .map(move |entry| {
                let dist = entry.record.point().planar_distance_deg(&point);
                (&entry.record, dist)
            })
            .filter(move |(_, dist)| *dist <= radius_deg)
    }
}

// ============================================================================
// Per-point samples
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationSample {
    pub density: f64,
    pub is_main_road: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledScore {
    pub score: f64,
    /// Landmark name or network type of the nearest contributing record.
    pub label: String,
}

/// The immutable set of reference layers shared by every request.
///
/// Built once at startup and only read afterwards, so it can be shared across
/// threads without locking.
pub struct SpatialContext {
    crime: LayerIndex<CrimeRecord>,
    lighting: LayerIndex<LightingRecord>,
    population: LayerIndex<PopulationRecord>,
    infrastructure: LayerIndex<InfrastructureRecord>,
    network: LayerIndex<NetworkRecord>,
}

impl Default for SpatialContext {
    fn default() -> Self {
        Self::empty()
    }
}

impl SpatialContext {
    /// A context with every layer absent; all queries return neutral defaults.
    pub fn empty() -> Self {
        Self {
            crime: LayerIndex::empty(),
            lighting: LayerIndex::empty(),
            population: LayerIndex::empty(),
            infrastructure: LayerIndex::empty(),
            network: LayerIndex::empty(),
        }
    }

    pub fn with_crime(mut self, records: Vec<CrimeRecord>) -> Self {
        self.crime = LayerIndex::new(records);
        self
    }

    pub fn with_lighting(mut self, records: Vec<LightingRecord>) -> Self {
        self.lighting = LayerIndex::new(records);
        self
    }

    pub fn with_population(mut self, records: Vec<PopulationRecord>) -> Self {
        self.population = LayerIndex::new(records);
        self
    }

    pub fn with_infrastructure(mut self, records: Vec<InfrastructureRecord>) -> Self {
        self.infrastructure = LayerIndex::new(records);
        self
    }

    pub fn with_network(mut self, records: Vec<NetworkRecord>) -> Self {
        self.network = LayerIndex::new(records);
        self
    }

    /// Loads every layer named in `paths`. Never fails; unusable layers are
    /// logged and left empty.
    pub fn load(paths: &DatasetPaths) -> Self {
        let context = Self {
            crime: load_layer(Layer::Crime, &paths.crime, CrimeRow::into_record),
            lighting: load_layer(Layer::Lighting, &paths.lighting, LightingRow::into_record),
            population: load_layer(Layer::Population, &paths.population, PopulationRow::into_record),
            infrastructure: load_layer(
                Layer::Infrastructure,
                &paths.infrastructure,
                InfrastructureRow::into_record,
            ),
            network: load_layer(Layer::Network, &paths.network, NetworkRow::into_record),
        };

        tracing::info!(
            crime = context.crime.len(),
            lighting = context.lighting.len(),
            population = context.population.len(),
            infrastructure = context.infrastructure.len(),
            network = context.network.len(),
            "spatial context ready"
        );
        context
    }

    /// Row counts per layer, in declaration order.
    pub fn layer_sizes(&self) -> [(Layer, usize); 5] {
        [
            (Layer::Crime, self.crime.len()),
            (Layer::Lighting, self.lighting.len()),
            (Layer::Population, self.population.len()),
            (Layer::Infrastructure, self.infrastructure.len()),
            (Layer::Network, self.network.len()),
        ]
    }

    /// Crime incidents within ~300 m.
    pub fn crime_count(&self, point: SpatialPoint) -> usize {
        self.crime.query(point, CRIME_RADIUS_DEG).len()
    }

    /// Mean lighting score within ~500 m.
    pub fn lighting_at(&self, point: SpatialPoint) -> f64 {
        mean_within(&self.lighting, point, |r| r.score).unwrap_or(DEFAULT_LIGHTING)
    }

    /// Mean density and main-road presence within ~500 m.
    pub fn population_at(&self, point: SpatialPoint) -> PopulationSample {
        let nearby = self.population.query(point, LAYER_RADIUS_DEG);
        let densities: Vec<f64> = nearby.iter().map(|r| r.density).collect();
        match mean(&densities) {
            Some(density) => PopulationSample {
                density,
                is_main_road: nearby.iter().any(|r| r.is_main_road),
            },
            None => PopulationSample {
                density: DEFAULT_POPULATION,
                is_main_road: false,
            },
        }
    }

    /// Mean infrastructure score within ~500 m, without the label lookup.
    pub fn infrastructure_score(&self, point: SpatialPoint) -> f64 {
        mean_within(&self.infrastructure, point, |r| r.score).unwrap_or(DEFAULT_INFRASTRUCTURE)
    }

    /// Mean infrastructure score within ~500 m and the nearest record's landmark.
    pub fn infrastructure_at(&self, point: SpatialPoint) -> LabeledScore {
        let Some(score) = mean_within(&self.infrastructure, point, |r| r.score) else {
            return LabeledScore {
                score: DEFAULT_INFRASTRUCTURE,
                label: UNKNOWN_LABEL.to_string(),
            };
        };
        let label = self
            .infrastructure
            .nearest_within(point, LAYER_RADIUS_DEG, |_| true)
            .and_then(|r| r.landmark.clone())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
        LabeledScore { score, label }
    }

    /// Mean network score within ~500 m, without the label lookup.
    pub fn network_score(&self, point: SpatialPoint) -> f64 {
        mean_within(&self.network, point, |r| r.score).unwrap_or(DEFAULT_NETWORK)
    }

    /// Mean network score within ~500 m and the nearest record's network type.
    pub fn network_at(&self, point: SpatialPoint) -> LabeledScore {
        let Some(score) = mean_within(&self.network, point, |r| r.score) else {
            return LabeledScore {
                score: DEFAULT_NETWORK,
                label: UNKNOWN_LABEL.to_string(),
            };
        };
        let label = self
            .network
            .nearest_within(point, LAYER_RADIUS_DEG, |_| true)
            .and_then(|r| r.network_type.clone())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
        LabeledScore { score, label }
    }

    /// Closest named landmark within ~1 km.
    pub fn nearest_landmark(&self, point: SpatialPoint) -> Option<&str> {
        self.infrastructure
            .nearest_within(point, LANDMARK_RADIUS_DEG, |r| {
                r.landmark
                    .as_deref()
                    .is_some_and(|name| !name.is_empty() && name != UNKNOWN_LABEL)
            })
            .and_then(|r| r.landmark.as_deref())
    }
}

fn mean_within<T: GeoRecord>(
    index: &LayerIndex<T>,
    point: SpatialPoint,
    value: impl Fn(&T) -> f64,
) -> Option<f64> {
    let values: Vec<f64> = index
        .query(point, LAYER_RADIUS_DEG)
        .into_iter()
        .map(value)
        .collect();
    mean(&values)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

// ============================================================================
// Loading
// ============================================================================

/// One CSV file per layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetPaths {
    pub crime: PathBuf,
    pub lighting: PathBuf,
    pub population: PathBuf,
    pub infrastructure: PathBuf,
    pub network: PathBuf,
}

impl DatasetPaths {
    /// Default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            crime: dir.join("crimes.csv"),
            lighting: dir.join("lighting.csv"),
            population: dir.join("population.csv"),
            infrastructure: dir.join("infrastructure.csv"),
            network: dir.join("network.csv"),
        }
    }
}

fn load_layer<Row, T>(layer: Layer, path: &Path, convert: fn(Row) -> Option<T>) -> LayerIndex<T>
where
    Row: DeserializeOwned,
    T: GeoRecord,
{
    match read_rows_from_path(path, convert) {
        Ok(records) if records.is_empty() => {
            tracing::warn!(%layer, path = %path.display(), "reference layer is empty; using neutral defaults");
            LayerIndex::empty()
        }
        Ok(records) => {
            tracing::info!(%layer, rows = records.len(), "loaded reference layer");
            LayerIndex::new(records)
        }
        Err(err) => {
            tracing::warn!(%layer, error = %err, "reference layer unavailable; using neutral defaults");
            LayerIndex::empty()
        }
    }
}

fn read_rows_from_path<Row, T>(path: &Path, convert: fn(Row) -> Option<T>) -> Result<Vec<T>, DatasetError>
where
    Row: DeserializeOwned,
{
    if !path.exists() {
        return Err(DatasetError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| DatasetError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(collect_records(reader, convert))
}

/// Parses layer rows from any reader. Malformed rows are skipped.
pub fn read_rows<Row, T>(source: impl Read, convert: fn(Row) -> Option<T>) -> Vec<T>
where
    Row: DeserializeOwned,
{
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);
    collect_records(reader, convert)
}

fn collect_records<R, Row, T>(mut reader: csv::Reader<R>, convert: fn(Row) -> Option<T>) -> Vec<T>
where
    R: Read,
    Row: DeserializeOwned,
{
    let mut records = Vec::new();
    let mut skipped = 0usize;
    for result in reader.deserialize::<Row>() {
        match result.ok().and_then(convert) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, "skipped malformed dataset rows");
    }
    records
}

fn checked_point(lat: f64, lon: f64) -> Option<SpatialPoint> {
    let point = SpatialPoint::new(lat, lon);
    point.is_valid().then_some(point)
}

fn unit_score(value: f64) -> Option<f64> {
    value.is_finite().then(|| value.clamp(0.0, 10.0))
}

fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(matches!(
        raw.as_deref().map(str::to_ascii_lowercase).as_deref(),
        Some("true" | "1" | "yes" | "y")
    ))
}

#[derive(Debug, Deserialize)]
pub struct CrimeRow {
    #[serde(alias = "Latitude", alias = "lat")]
    latitude: f64,
    #[serde(alias = "Longitude", alias = "lon", alias = "lng")]
    longitude: f64,
    #[serde(rename = "Crime type", alias = "crime_type", default)]
    crime_type: Option<String>,
}

impl CrimeRow {
    pub fn into_record(self) -> Option<CrimeRecord> {
        Some(CrimeRecord {
            point: checked_point(self.latitude, self.longitude)?,
            crime_type: self.crime_type,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LightingRow {
    #[serde(alias = "Latitude", alias = "lat")]
    latitude: f64,
    #[serde(alias = "Longitude", alias = "lon", alias = "lng")]
    longitude: f64,
    lighting_score: f64,
}

impl LightingRow {
    pub fn into_record(self) -> Option<LightingRecord> {
        Some(LightingRecord {
            point: checked_point(self.latitude, self.longitude)?,
            score: unit_score(self.lighting_score)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PopulationRow {
    #[serde(alias = "Latitude", alias = "lat")]
    latitude: f64,
    #[serde(alias = "Longitude", alias = "lon", alias = "lng")]
    longitude: f64,
    #[serde(alias = "population_count")]
    population_density: f64,
    #[serde(default, deserialize_with = "flexible_bool")]
    is_main_road: bool,
}

impl PopulationRow {
    pub fn into_record(self) -> Option<PopulationRecord> {
        if !self.population_density.is_finite() {
            return None;
        }
        Some(PopulationRecord {
            point: checked_point(self.latitude, self.longitude)?,
            density: self.population_density.max(0.0),
            is_main_road: self.is_main_road,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct InfrastructureRow {
    #[serde(alias = "Latitude", alias = "lat")]
    latitude: f64,
    #[serde(alias = "Longitude", alias = "lon", alias = "lng")]
    longitude: f64,
    infrastructure_score: f64,
    #[serde(alias = "name", alias = "landmark_name", default)]
    landmark: Option<String>,
}

impl InfrastructureRow {
    pub fn into_record(self) -> Option<InfrastructureRecord> {
        Some(InfrastructureRecord {
            point: checked_point(self.latitude, self.longitude)?,
            score: unit_score(self.infrastructure_score)?,
            landmark: self.landmark,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct NetworkRow {
    #[serde(alias = "Latitude", alias = "lat")]
    latitude: f64,
    #[serde(alias = "Longitude", alias = "lon", alias = "lng")]
    longitude: f64,
    network_score: f64,
    #[serde(alias = "type", default)]
    network_type: Option<String>,
}

impl NetworkRow {
    pub fn into_record(self) -> Option<NetworkRecord> {
        Some(NetworkRecord {
            point: checked_point(self.latitude, self.longitude)?,
            score: unit_score(self.network_score)?,
            network_type: self.network_type,
        })
    }
}
