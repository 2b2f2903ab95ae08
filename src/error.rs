//! Error types for request validation, dataset loading, provider calls and
//! route planning.

use std::path::PathBuf;

/// A route request that cannot be planned as given.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestError {
    /// The payload is not a JSON route request (bad syntax or wrong types).
    #[error("Malformed request: {0}")]
    Malformed(String),

    /// A required coordinate was absent from the payload.
    #[error("Missing required field: {field}")]
    Missing {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A coordinate is NaN or infinite.
    #[error("{field} must be a finite number")]
    NotFinite {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A coordinate falls outside its valid range.
    #[error("{field} out of range: {value} (expected {min}..={max})")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Value supplied by the caller.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },
}

/// Failure while talking to the external routing service.
///
/// "No route between these points" is not an error: providers report it as an
/// empty route list.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Connection failure, timeout, or non-success HTTP status.
    #[error("routing request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered but reported a failure code.
    #[error("routing service returned code {code}: {message}")]
    Service {
        /// Provider status code, e.g. `InvalidQuery`.
        code: String,
        /// Provider message, if any.
        message: String,
    },

    /// The body could not be mapped onto route geometries.
    #[error("malformed routing response: {0}")]
    Malformed(String),
}

/// Failure while loading one reference layer.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// The file does not exist.
    #[error("dataset not found: {}", path.display())]
    NotFound {
        /// Path that was checked.
        path: PathBuf,
    },

    /// The CSV reader could not open or parse the file.
    #[error("failed to read dataset {}: {source}", path.display())]
    Csv {
        /// Path being read.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },
}

/// Failure of a whole route planning request.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// Input rejected before any computation.
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    /// Neither the provider nor fallback synthesis produced a usable route.
    #[error("No routes could be generated between the requested points")]
    NoCandidates,

    /// Unexpected fault during scoring or selection.
    #[error("Error calculating routes: {0}")]
    Internal(String),
}

impl PlanError {
    /// True when the failure was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PlanError::InvalidRequest(_))
    }
}
