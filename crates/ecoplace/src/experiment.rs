//! Tool for running multiple independent allocation runs.

use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use threadpool::ThreadPool;

use crate::config::AllocatorConfig;
use crate::error::{Error, Result};
use crate::genetic::genetic_algorithm;
use crate::request::PredictRequest;
use crate::resource::Resource;
use crate::solution::AllocationResponse;

/// Contains result of one run.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RunSummary {
    pub run_id: usize,
    pub seed: u64,
    pub energy_consumption: f64,
    /// Best fitness of the first generation, to compare with the final result.
    pub initial_best: f64,
    pub generations: usize,
    pub elapsed_secs: f64,
}

/// Results of all successful runs sorted by energy consumption, with the best response.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExperimentResult {
    pub runs: Vec<RunSummary>,
    pub best: AllocationResponse,
}

/// Runs the genetic algorithm several times with consecutive seeds and keeps the best result.
///
/// Every run owns copies of the request and the roster, so runs share no mutable state and can be executed in
/// parallel. If diagnostics directory is configured, each run writes its artifacts to `run_<id>` subdirectory.
pub struct Experiment {
    request: PredictRequest,
    resources: Vec<Resource>,
    config: AllocatorConfig,
    runs: usize,
}

impl Experiment {
    pub fn new(request: PredictRequest, resources: Vec<Resource>, config: AllocatorConfig, runs: usize) -> Self {
        Self {
            request,
            resources,
            config,
            runs: runs.max(1),
        }
    }

    /// Executes all runs using the specified number of threads.
    ///
    /// Fails only if every run fails, returning the error of the first run.
    pub fn run(&self, num_threads: usize) -> Result<ExperimentResult> {
        let results = Arc::new(Mutex::new(Vec::with_capacity(self.runs)));
        let pool = ThreadPool::new(num_threads.max(1));
        let start_time = Instant::now();

        for run_id in 0..self.runs {
            let request = self.request.clone();
            let resources = self.resources.clone();
            let mut config = self.config.clone().with_seed(self.config.seed.wrapping_add(run_id as u64));
            config.diagnostics_dir = self
                .config
                .diagnostics_dir
                .as_ref()
                .map(|dir| Path::new(dir).join(format!("run_{}", run_id)).display().to_string());
            let results = results.clone();

            pool.execute(move || {
                let seed = config.seed;
                let run_start = Instant::now();
                let outcome = genetic_algorithm(&request, &resources, config).map(|result| {
                    let summary = RunSummary {
                        run_id,
                        seed,
                        energy_consumption: result.best.fitness,
                        initial_best: result.stats.best_fitness.first().copied().unwrap_or(result.best.fitness),
                        generations: result.stats.generation_count(),
                        elapsed_secs: run_start.elapsed().as_secs_f64(),
                    };
                    (summary, result.to_response())
                });
                debug!("run {} with seed {} finished", run_id, seed);
                if let Ok(mut results) = results.lock() {
                    results.push((run_id, outcome));
                }
            });
        }

        pool.join();
        info!("Finished {} runs in {:.2?}", self.runs, start_time.elapsed());

        let outcomes = take_outcomes(&results)?;
        collect_results(self.runs, outcomes)
    }
}

type RunOutcome = (usize, Result<(RunSummary, AllocationResponse)>);

fn take_outcomes(results: &Mutex<Vec<RunOutcome>>) -> Result<Vec<RunOutcome>> {
    match results.lock() {
        Ok(mut results) => Ok(std::mem::take(&mut *results)),
        Err(_) => Err(Error::Experiment("results are poisoned by a panicked run".to_string())),
    }
}

/// Sorts finished runs by energy consumption. Fails only if no run succeeded, with the error of the first run.
fn collect_results(expected_runs: usize, mut outcomes: Vec<RunOutcome>) -> Result<ExperimentResult> {
    outcomes.sort_by_key(|(run_id, _)| *run_id);
    let mut finished = outcomes.iter().map(|(run_id, _)| *run_id).peekable();
    for run_id in 0..expected_runs {
        if finished.next_if_eq(&run_id).is_none() {
            warn!("run {} didn't finish", run_id);
        }
    }

    let mut succeeded = Vec::new();
    let mut first_error = None;
    for (_, outcome) in outcomes {
        match outcome {
            Ok(run) => succeeded.push(run),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    succeeded.sort_by(|a, b| a.0.energy_consumption.total_cmp(&b.0.energy_consumption));

    let mut succeeded = succeeded.into_iter();
    let Some((best_summary, best)) = succeeded.next() else {
        return Err(first_error.unwrap_or_else(|| Error::Experiment("no runs finished".to_string())));
    };
    let mut runs = vec![best_summary];
    runs.extend(succeeded.map(|(summary, _)| summary));
    Ok(ExperimentResult { runs, best })
}

impl ExperimentResult {
    /// Saves results as pretty-printed JSON.
    pub fn save(&self, path: &str) -> Result<()> {
        let mut file = File::create(path).map_err(|e| Error::io(path, e))?;
        serde_json::to_writer_pretty(&mut file, self)?;
        Ok(())
    }
}
