//! Initial population construction.

use indexmap::IndexMap;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::common::{Allocation, AllocationVerdict};
use crate::error::{Error, Result};
use crate::solution::{PlacementProblem, Solution};
use crate::vm::VmRequest;

/// Assigns random identifiers to VM requests submitted without one.
pub fn assign_vm_ids<R: Rng>(vms: &mut [VmRequest], rng: &mut R) {
    for vm in vms.iter_mut() {
        vm.ensure_id(rng);
    }
}

/// Builds up to `population_size` valid solutions by randomized greedy placement.
///
/// Each candidate starts from a clean pool state. VMs are placed in request order, each on a resource chosen
/// uniformly among the active resources that can still fit it, and the chosen resource capacity is consumed
/// immediately so the following VMs of the same candidate see the reduced availability.
///
/// A candidate which can't place every VM is discarded. When the number of consecutive discarded candidates
/// exceeds the number of accepted ones, the request is considered infeasible.
pub fn generate_initial_population<R: Rng>(
    problem: &PlacementProblem,
    population_size: usize,
    rng: &mut R,
) -> Result<Vec<Solution>> {
    let mut population = Vec::with_capacity(population_size);
    let mut invalid_solutions = 0;

    for _ in 0..population_size {
        match build_candidate(problem, rng) {
            Some(solution) => {
                population.push(solution);
                invalid_solutions = 0;
            }
            None => {
                invalid_solutions += 1;
                debug!(
                    "discarded incomplete candidate ({} consecutive, {} accepted)",
                    invalid_solutions,
                    population.len()
                );
                if invalid_solutions > population.len() {
                    return Err(Error::InfeasibleRequest(format!(
                        "failed to place all {} VMs on {} resources ({} of {} candidate solutions built)",
                        problem.vms.len(),
                        problem.resources.len(),
                        population.len(),
                        population_size
                    )));
                }
            }
        }
    }

    Ok(population)
}

fn build_candidate<R: Rng>(problem: &PlacementProblem, rng: &mut R) -> Option<Solution> {
    let mut pool = problem.pool_state();
    let mut allocation = IndexMap::with_capacity(problem.vms.len());

    for (vm_index, vm) in problem.vms.iter().enumerate() {
        let suitable = (0..problem.resources.len())
            .filter(|&resource| pool.can_allocate(vm, resource) == AllocationVerdict::Success)
            .collect::<Vec<_>>();
        let resource = *suitable.choose(rng)?;
        allocation.insert(vm.id().to_string(), Allocation::new(vm_index, resource));
        pool.allocate(vm_index, vm, resource);
    }

    // Repeated VM identifiers collapse into one entry and make the candidate incomplete.
    if allocation.len() == problem.vms.len() {
        Some(Solution::new(allocation))
    } else {
        None
    }
}
