//! Crossover operator.

use log::debug;
use rand::seq::IteratorRandom;
use rand::Rng;

use crate::solution::{PlacementProblem, Solution};

/// Produces a child which takes all allocations of `parent1` except one VM, whose allocation is taken from
/// `parent2`.
///
/// The swapped VM is drawn again on each of at most `max_attempts` attempts until the child is valid. If no
/// valid child is found, a copy of the parent with the lower fitness is returned (`parent2` on ties), so the
/// result is valid whenever both parents are.
pub fn crossover<R: Rng>(
    problem: &PlacementProblem,
    parent1: &Solution,
    parent2: &Solution,
    max_attempts: usize,
    rng: &mut R,
) -> Solution {
    for _ in 0..max_attempts {
        let Some(vm) = parent1.allocation.keys().choose(rng) else {
            break;
        };
        let Some(donor) = parent2.allocation.get(vm) else {
            continue;
        };

        let mut allocation = parent1.allocation.clone();
        allocation.insert(vm.clone(), *donor);
        let child = Solution::new(allocation);
        if child.is_valid(problem) {
            return child;
        }
    }

    debug!("crossover failed after {} attempts, falling back to the best parent", max_attempts);
    let best_parent = if parent1.fitness < parent2.fitness {
        parent1
    } else {
        parent2
    };
    Solution::new(best_parent.allocation.clone())
}
