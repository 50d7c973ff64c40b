//! Placement problem and its candidate solutions.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::common::Allocation;
use crate::resource::Resource;
use crate::resource_pool::ResourcePoolState;
use crate::vm::VmRequest;

/// The universe of a single allocation run: the requested VMs (with identifiers assigned) and the resource roster.
#[derive(Clone, Debug)]
pub struct PlacementProblem {
    pub vms: Vec<VmRequest>,
    pub resources: Vec<Resource>,
}

impl PlacementProblem {
    pub fn new(vms: Vec<VmRequest>, resources: Vec<Resource>) -> Self {
        Self { vms, resources }
    }

    /// Returns an empty pool state for the roster.
    pub fn pool_state(&self) -> ResourcePoolState {
        ResourcePoolState::new(&self.resources)
    }
}

/// Complete placement of the requested VMs together with its fitness.
///
/// Allocations are keyed by VM identifier and kept in the order of VM requests. Fitness is the total power of
/// resources hosting at least one VM (lower is better), it equals zero until the solution is evaluated.
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    pub allocation: IndexMap<String, Allocation>,
    pub fitness: f64,
}

impl Solution {
    /// Creates not evaluated solution.
    pub fn new(allocation: IndexMap<String, Allocation>) -> Self {
        Self {
            allocation,
            fitness: 0.,
        }
    }

    /// Accounts all allocations on a fresh pool state and returns it.
    pub fn replay(&self, problem: &PlacementProblem) -> ResourcePoolState {
        let mut pool = problem.pool_state();
        for alloc in self.allocation.values() {
            pool.allocate(alloc.vm, &problem.vms[alloc.vm], alloc.resource);
        }
        pool
    }

    /// Checks that no resource is overcommitted and all hosting resources are active.
    pub fn is_valid(&self, problem: &PlacementProblem) -> bool {
        let hosts_active = self
            .allocation
            .values()
            .all(|alloc| problem.resources[alloc.resource].is_active());
        hosts_active && self.replay(problem).all_valid()
    }

    /// Checks that every requested VM has exactly one allocation.
    pub fn is_complete(&self, problem: &PlacementProblem) -> bool {
        self.allocation.len() == problem.vms.len()
            && problem
                .vms
                .iter()
                .enumerate()
                .all(|(i, vm)| self.allocation.get(vm.id()).map_or(false, |alloc| alloc.vm == i))
    }

    /// Returns indices of resources hosting at least one VM.
    pub fn used_resources(&self) -> BTreeSet<usize> {
        self.allocation.values().map(|alloc| alloc.resource).collect()
    }

    /// Computes the solution energy consumption: the sum of power over distinct hosting resources.
    pub fn compute_fitness(&self, problem: &PlacementProblem) -> f64 {
        self.used_resources()
            .into_iter()
            .map(|resource| problem.resources[resource].energy_consumption)
            .sum()
    }

    /// Computes and stores the solution fitness.
    pub fn evaluate(&mut self, problem: &PlacementProblem) -> f64 {
        self.fitness = self.compute_fitness(problem);
        self.fitness
    }

    /// Converts solution to the response returned to the caller.
    pub fn to_response(&self, problem: &PlacementProblem) -> AllocationResponse {
        AllocationResponse {
            allocation: self
                .allocation
                .iter()
                .map(|(vm, alloc)| VmPlacement {
                    vm: vm.clone(),
                    resource: problem.resources[alloc.resource].id.clone(),
                })
                .collect(),
            energy_consumption: self.fitness,
        }
    }
}

/// Placement of one VM as reported to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VmPlacement {
    pub vm: String,
    pub resource: String,
}

/// Allocation result reported to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationResponse {
    pub allocation: Vec<VmPlacement>,
    pub energy_consumption: f64,
}
