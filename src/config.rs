//! Engine configuration from environment.

use std::env;
use std::path::PathBuf;

use crate::layers::DatasetPaths;
use crate::osrm::OsrmConfig;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub osrm: OsrmConfig,
    pub data_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            osrm: OsrmConfig::default(),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            osrm: OsrmConfig {
                base_url: env::var("OSRM_SERVER").unwrap_or(defaults.osrm.base_url),
                profile: env::var("OSRM_PROFILE").unwrap_or(defaults.osrm.profile),
                timeout_secs: env::var("OSRM_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.osrm.timeout_secs),
            },
            data_dir: env::var("SAFE_ROUTES_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
        }
    }

    pub fn dataset_paths(&self) -> DatasetPaths {
        DatasetPaths::in_dir(&self.data_dir)
    }
}
