//! Diagnostic artifacts written during a run.

use std::fs;
use std::fs::File;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::run_stats::{RunStats, UtilizationSnapshot};

/// File name prefix of per-generation utilization artifacts.
pub const UTILIZATION_PREFIX: &str = "resource_utilization_gen_";
/// File name of the fitness statistics artifact.
pub const FITNESS_STATS_FILE: &str = "fitness_stats.csv";

/// Receiver of diagnostic data produced by the genetic algorithm.
pub trait DiagnosticsSink {
    /// Invoked once before the initial population is built.
    fn on_run_start(&mut self) -> Result<()> {
        Ok(())
    }

    /// Invoked each time the best solution utilization is captured.
    fn on_snapshot(&mut self, _snapshot: &UtilizationSnapshot) -> Result<()> {
        Ok(())
    }

    /// Invoked once after the last generation.
    fn on_run_finish(&mut self, _stats: &RunStats) -> Result<()> {
        Ok(())
    }
}

/// Sink which drops all diagnostic data.
#[derive(Default)]
pub struct NoDiagnostics {}

impl NoDiagnostics {
    pub fn new() -> Self {
        Self {}
    }
}

impl DiagnosticsSink for NoDiagnostics {}

/// Writes diagnostic data as CSV files into a directory.
///
/// Artifacts left by the previous run in the same directory are removed when the run starts.
pub struct CsvDiagnostics {
    dir: PathBuf,
}

impl CsvDiagnostics {
    pub fn new(dir: &str) -> Self {
        Self { dir: PathBuf::from(dir) }
    }

    /// Returns the path of the utilization artifact of the specified generation.
    pub fn utilization_path(&self, generation: usize) -> PathBuf {
        self.dir.join(format!("{}{}.csv", UTILIZATION_PREFIX, generation))
    }

    /// Returns the path of the fitness statistics artifact.
    pub fn fitness_stats_path(&self) -> PathBuf {
        self.dir.join(FITNESS_STATS_FILE)
    }

    fn dir_name(&self) -> String {
        self.dir.display().to_string()
    }

    fn create_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir_name(), e))
    }

    fn writer(&self, path: PathBuf) -> Result<csv::Writer<File>> {
        let file = File::create(&path).map_err(|e| Error::io(&path.display().to_string(), e))?;
        Ok(csv::Writer::from_writer(file))
    }
}

impl DiagnosticsSink for CsvDiagnostics {
    fn on_run_start(&mut self) -> Result<()> {
        self.create_dir()?;
        let entries = fs::read_dir(&self.dir).map_err(|e| Error::io(&self.dir_name(), e))?;
        for entry in entries {
            let path = entry.map_err(|e| Error::io(&self.dir_name(), e))?.path();
            let is_stale = path
                .file_name()
                .and_then(|name| name.to_str())
                .map_or(false, |name| name.starts_with(UTILIZATION_PREFIX));
            if is_stale {
                fs::remove_file(&path).map_err(|e| Error::io(&path.display().to_string(), e))?;
            }
        }
        Ok(())
    }

    fn on_snapshot(&mut self, snapshot: &UtilizationSnapshot) -> Result<()> {
        self.create_dir()?;
        let mut wtr = self.writer(self.utilization_path(snapshot.generation))?;
        for resource in &snapshot.resources {
            wtr.serialize(resource)?;
        }
        wtr.flush().map_err(|e| Error::io(&self.dir_name(), e))?;
        Ok(())
    }

    fn on_run_finish(&mut self, stats: &RunStats) -> Result<()> {
        self.create_dir()?;
        let mut wtr = self.writer(self.fitness_stats_path())?;
        for generation in stats.generations() {
            wtr.serialize(generation)?;
        }
        wtr.flush().map_err(|e| Error::io(&self.dir_name(), e))?;
        Ok(())
    }
}
