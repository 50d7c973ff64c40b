//! Error types returned by the allocator.

use thiserror::Error;

/// Errors produced while loading inputs or building an allocation.
#[derive(Debug, Error)]
pub enum Error {
    /// No population of the requested size can be built from the resource roster.
    #[error("infrastructure can't handle request: {0}")]
    InfeasibleRequest(String),

    /// Request or roster has an invalid shape (checked by the front end, not by the GA core).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Experiment runs didn't produce any results.
    #[error("experiment failed: {0}")]
    Experiment(String),

    #[error("can't read file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("can't parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("can't parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("can't write CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub(crate) fn io(path: &str, source: std::io::Error) -> Self {
        Error::Io {
            path: path.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
