//! Genetic algorithm minimizing the energy consumption of VM placement.

use log::{info, warn};
use rand::prelude::*;
use rand_pcg::Pcg64;

use crate::config::AllocatorConfig;
use crate::crossover::crossover;
use crate::diagnostics::{CsvDiagnostics, DiagnosticsSink, NoDiagnostics};
use crate::error::{Error, Result};
use crate::mutation::apply_mutation;
use crate::population::{assign_vm_ids, generate_initial_population};
use crate::request::PredictRequest;
use crate::resource::Resource;
use crate::run_stats::{RunStats, UtilizationSnapshot};
use crate::selection::select_best;
use crate::solution::{AllocationResponse, PlacementProblem, Solution};

/// Result of a genetic algorithm run.
#[derive(Clone, Debug)]
pub struct RunResult {
    /// Best solution of the final population.
    pub best: Solution,
    /// Statistics collected over generations.
    pub stats: RunStats,
    /// Placement problem with VM identifiers assigned, used to interpret the solution.
    pub problem: PlacementProblem,
}

impl RunResult {
    pub fn to_response(&self) -> AllocationResponse {
        self.best.to_response(&self.problem)
    }
}

/// Genetic algorithm with elitist generational replacement.
///
/// Each generation keeps the best third of the population as parents and fills the rest with children produced
/// by crossover and mutation of two randomly chosen parents. The algorithm is single-threaded and all randomness
/// comes from a generator seeded from the config, so runs with the same inputs and seed are reproducible.
pub struct GeneticAlgorithm {
    config: AllocatorConfig,
    rng: Pcg64,
}

impl GeneticAlgorithm {
    pub fn new(config: AllocatorConfig) -> Self {
        let rng = Pcg64::seed_from_u64(config.seed);
        Self { config, rng }
    }

    /// Runs the algorithm and returns the best found solution.
    ///
    /// Fails with [`Error::InfeasibleRequest`] if the initial population can't be built. Failures of the
    /// diagnostics sink are logged and don't interrupt the run.
    pub fn run(
        &mut self,
        request: &PredictRequest,
        resources: &[Resource],
        sink: &mut dyn DiagnosticsSink,
    ) -> Result<RunResult> {
        report(sink.on_run_start());

        let mut vms = request.vms.clone();
        assign_vm_ids(&mut vms, &mut self.rng);
        let problem = PlacementProblem::new(vms, resources.to_vec());

        let mut population = generate_initial_population(&problem, request.population_size, &mut self.rng)?;
        let qt_parents = (request.population_size / 3).max(1);
        let qt_children = request.population_size.saturating_sub(qt_parents);

        let mut stats = RunStats::new();
        let mut snapshot_fitness: Option<f64> = None;

        for generation in 0..request.generations {
            let parents = select_best(&mut population, &problem, qt_parents);

            let mut children = Vec::with_capacity(qt_children);
            for _ in 0..qt_children {
                let (parent1, parent2) = self.pick_parents(&parents);
                let child = crossover(&problem, parent1, parent2, self.config.crossover_attempts, &mut self.rng);
                let child = apply_mutation(
                    request.chance_mutation,
                    &problem,
                    child,
                    self.config.mutation_attempts,
                    &mut self.rng,
                );
                children.push(child);
            }

            population = parents;
            population.extend(children);
            let best = best_of(&mut population, &problem)?;
            info!(
                "Generation {}: Best energy consumption = {} watts",
                generation, best.fitness
            );

            stats.record_generation(&population);

            if snapshot_fitness != Some(best.fitness) {
                snapshot_fitness = Some(best.fitness);
                let snapshot = UtilizationSnapshot::new(generation, &best, &problem);
                report(sink.on_snapshot(&snapshot));
                stats.snapshots.push(snapshot);
            }
        }

        report(sink.on_run_finish(&stats));

        let best = best_of(&mut population, &problem)?;
        Ok(RunResult { best, stats, problem })
    }

    fn pick_parents<'a>(&mut self, parents: &'a [Solution]) -> (&'a Solution, &'a Solution) {
        if parents.len() < 2 {
            return (&parents[0], &parents[0]);
        }
        let mut pair = parents.choose_multiple(&mut self.rng, 2);
        match (pair.next(), pair.next()) {
            (Some(parent1), Some(parent2)) => (parent1, parent2),
            _ => (&parents[0], &parents[1]),
        }
    }
}

/// Runs the genetic algorithm with diagnostics written to `config.diagnostics_dir` (if set).
pub fn genetic_algorithm(
    request: &PredictRequest,
    resources: &[Resource],
    config: AllocatorConfig,
) -> Result<RunResult> {
    let mut sink: Box<dyn DiagnosticsSink> = match &config.diagnostics_dir {
        Some(dir) => Box::new(CsvDiagnostics::new(dir)),
        None => Box::new(NoDiagnostics::new()),
    };
    GeneticAlgorithm::new(config).run(request, resources, sink.as_mut())
}

fn best_of(population: &mut [Solution], problem: &PlacementProblem) -> Result<Solution> {
    select_best(population, problem, 1)
        .into_iter()
        .next()
        .ok_or_else(|| Error::InfeasibleRequest("population is empty".to_string()))
}

fn report(result: Result<()>) {
    if let Err(e) = result {
        warn!("failed to write diagnostics: {}", e);
    }
}
