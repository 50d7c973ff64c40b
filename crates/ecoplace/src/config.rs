//! Allocator configuration.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Holds raw allocator config parsed from YAML file.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
struct RawAllocatorConfig {
    pub seed: Option<u64>,
    pub crossover_attempts: Option<usize>,
    pub mutation_attempts: Option<usize>,
    pub diagnostics_dir: Option<String>,
}

/// Represents allocator configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct AllocatorConfig {
    /// Seed of the random number generator driving the search.
    pub seed: u64,
    /// Number of attempts to produce a valid child before crossover falls back to the best parent.
    pub crossover_attempts: usize,
    /// Number of attempts to produce a valid mutant before mutation returns the child unchanged.
    pub mutation_attempts: usize,
    /// Directory for diagnostic artifacts (none are written if not set).
    pub diagnostics_dir: Option<String>,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self::from_raw(RawAllocatorConfig::default())
    }
}

impl AllocatorConfig {
    /// Creates allocator config by reading parameter values from YAML file
    /// (uses default values if some parameters are absent).
    pub fn from_file(file_name: &str) -> Result<Self> {
        let raw: RawAllocatorConfig = read_structured(file_name)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawAllocatorConfig) -> Self {
        Self {
            seed: raw.seed.unwrap_or(123),
            crossover_attempts: raw.crossover_attempts.unwrap_or(5),
            mutation_attempts: raw.mutation_attempts.unwrap_or(11),
            diagnostics_dir: raw.diagnostics_dir,
        }
    }

    /// Returns the same config with another seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Reads and deserializes a file, which is parsed as JSON if it has `.json` extension and as YAML otherwise.
pub(crate) fn read_structured<T: DeserializeOwned>(file_name: &str) -> Result<T> {
    let content = std::fs::read_to_string(file_name).map_err(|e| Error::io(file_name, e))?;
    let is_json = Path::new(file_name)
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(serde_yaml::from_str(&content)?)
    }
}
