//! Mutation operator.

use log::debug;
use rand::seq::IteratorRandom;
use rand::Rng;

use crate::common::Allocation;
use crate::solution::{PlacementProblem, Solution};

/// Randomly moves a subset of VMs of the child to random resources.
///
/// A roll uniform in `0..=100` decides whether the child is mutated at all: mutation is skipped if the roll
/// exceeds `chance_mutation` or the chance is zero. Once mutation starts, it is retried up to `max_attempts`
/// times (each time with a new subset and new target resources, chosen regardless of their free capacity)
/// until the mutant is valid. If no attempt succeeds, the child is returned unchanged.
pub fn apply_mutation<R: Rng>(
    chance_mutation: u32,
    problem: &PlacementProblem,
    child: Solution,
    max_attempts: usize,
    rng: &mut R,
) -> Solution {
    let roll = rng.gen_range(0..=100);
    if chance_mutation == 0 || roll > chance_mutation {
        return child;
    }
    if child.allocation.is_empty() || problem.resources.is_empty() {
        return child;
    }

    for _ in 0..max_attempts {
        let count = rng.gen_range(1..=child.allocation.len());
        let vms_to_move = child.allocation.keys().choose_multiple(rng, count);

        let mut allocation = child.allocation.clone();
        for vm in vms_to_move {
            let vm_index = child.allocation[vm].vm;
            let resource = rng.gen_range(0..problem.resources.len());
            allocation.insert(vm.clone(), Allocation::new(vm_index, resource));
        }

        let mutated = Solution::new(allocation);
        if mutated.is_valid(problem) {
            return mutated;
        }
    }

    debug!("mutation failed after {} attempts, keeping the child", max_attempts);
    child
}
