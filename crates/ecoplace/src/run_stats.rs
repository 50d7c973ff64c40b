//! Statistics collected during a genetic algorithm run.

use serde::{Deserialize, Serialize};

use crate::solution::{PlacementProblem, Solution};

/// Fitness of the population in one generation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct GenerationStats {
    pub generation: usize,
    pub best: f64,
    pub mean: f64,
    pub worst: f64,
}

/// Utilization of one resource under some solution, in percent.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ResourceUtilization {
    pub resource: String,
    pub energy_consumption: f64,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub storage_usage: f64,
    /// Mean of CPU, memory and storage usage.
    pub usage: f64,
}

/// Per-resource utilization of the best solution of some generation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UtilizationSnapshot {
    pub generation: usize,
    /// Total power of resources with non-zero usage.
    pub energy_consumption: f64,
    pub resources: Vec<ResourceUtilization>,
}

impl UtilizationSnapshot {
    /// Builds snapshot by replaying the solution on a clean pool state.
    pub fn new(generation: usize, solution: &Solution, problem: &PlacementProblem) -> Self {
        let pool = solution.replay(problem);
        let mut energy_consumption = 0.;
        let resources = problem
            .resources
            .iter()
            .enumerate()
            .map(|(i, resource)| {
                let cpu_usage = pool.get_cpu_load(i) * 100.;
                let memory_usage = pool.get_memory_load(i) * 100.;
                let storage_usage = pool.get_storage_load(i) * 100.;
                let usage = (cpu_usage + memory_usage + storage_usage) / 3.;
                if usage > 0. {
                    energy_consumption += resource.energy_consumption;
                }
                ResourceUtilization {
                    resource: resource.id.clone(),
                    energy_consumption: resource.energy_consumption,
                    cpu_usage,
                    memory_usage,
                    storage_usage,
                    usage,
                }
            })
            .collect();
        Self {
            generation,
            energy_consumption,
            resources,
        }
    }
}

/// Contains statistics collected from a run.
#[derive(Serialize, Deserialize, Clone, Default, Debug)]
pub struct RunStats {
    /// Best (minimal) fitness of each generation.
    pub best_fitness: Vec<f64>,
    /// Mean fitness of each generation.
    pub mean_fitness: Vec<f64>,
    /// Worst (maximal) fitness of each generation.
    pub worst_fitness: Vec<f64>,
    /// Snapshots taken when the best fitness changed (and at generation 0).
    pub snapshots: Vec<UtilizationSnapshot>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records fitness of an evaluated population.
    pub fn record_generation(&mut self, population: &[Solution]) {
        let (best, worst, sum) = population.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.),
            |(best, worst, sum), solution| (best.min(solution.fitness), worst.max(solution.fitness), sum + solution.fitness),
        );
        let mean = if population.is_empty() {
            0.
        } else {
            sum / population.len() as f64
        };
        self.best_fitness.push(best);
        self.mean_fitness.push(mean);
        self.worst_fitness.push(worst);
    }

    /// Returns the number of recorded generations.
    pub fn generation_count(&self) -> usize {
        self.best_fitness.len()
    }

    /// Returns recorded fitness of the specified generation.
    pub fn generation(&self, generation: usize) -> Option<GenerationStats> {
        Some(GenerationStats {
            generation,
            best: *self.best_fitness.get(generation)?,
            mean: *self.mean_fitness.get(generation)?,
            worst: *self.worst_fitness.get(generation)?,
        })
    }

    /// Returns recorded fitness of all generations.
    pub fn generations(&self) -> Vec<GenerationStats> {
        (0..self.generation_count()).filter_map(|g| self.generation(g)).collect()
    }
}
