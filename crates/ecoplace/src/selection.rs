//! Truncation selection.

use crate::solution::{PlacementProblem, Solution};

/// Evaluates every solution of the population in place.
pub fn evaluate_population(population: &mut [Solution], problem: &PlacementProblem) {
    for solution in population.iter_mut() {
        solution.evaluate(problem);
    }
}

/// Re-evaluates the population and returns copies of the `k` solutions with the lowest fitness.
///
/// The result is sorted by ascending fitness, equal solutions keep their population order.
/// At most `population.len()` solutions are returned.
pub fn select_best(population: &mut [Solution], problem: &PlacementProblem, k: usize) -> Vec<Solution> {
    evaluate_population(population, problem);
    let mut order = (0..population.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| population[a].fitness.total_cmp(&population[b].fitness));
    order.into_iter().take(k).map(|i| population[i].clone()).collect()
}
