//! Allocation request and its shape validation.
//!
//! Validation belongs to the front end which accepts requests, the genetic algorithm itself assumes
//! well-formed input and never calls it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::read_structured;
use crate::error::{Error, Result};
use crate::resource::Resource;
use crate::vm::VmRequest;

/// Request to allocate a set of VMs, together with the parameters of the genetic search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    /// Number of solutions in each generation.
    pub population_size: usize,
    /// Number of generations to run.
    pub generations: usize,
    /// Chance of mutating a child, in percent (0-100).
    pub chance_mutation: u32,
    /// VMs to allocate, in the order they are placed by the initializer.
    pub vms: Vec<VmRequest>,
}

impl PredictRequest {
    /// Reads request from YAML (or JSON, if the file has `.json` extension).
    pub fn from_file(file: &str) -> Result<Self> {
        read_structured(file)
    }

    /// Checks request shape: positive sizes, mutation chance within 0-100, non-empty list of VMs
    /// with positive requirements and unique explicitly given identifiers.
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return invalid("population_size must be greater than 0");
        }
        if self.generations == 0 {
            return invalid("generations must be greater than 0");
        }
        if self.chance_mutation > 100 {
            return invalid("chance_mutation must be within 0..=100");
        }
        if self.vms.is_empty() {
            return invalid("vms must contain at least one VM");
        }

        let mut ids = HashSet::new();
        for (i, vm) in self.vms.iter().enumerate() {
            if vm.cpu_cores == 0 {
                return invalid(&format!("vms[{}]: cpu_cores must be greater than 0", i));
            }
            for (name, value) in [
                ("memory", vm.memory),
                ("storage", vm.storage),
                ("network_bandwidth", vm.network_bandwidth),
            ] {
                if !(value > 0.) {
                    return invalid(&format!("vms[{}]: {} must be greater than 0", i, name));
                }
            }
            if let Some(id) = &vm.id {
                if !ids.insert(id.as_str()) {
                    return invalid(&format!("vms[{}]: duplicate id {}", i, id));
                }
            }
        }
        Ok(())
    }
}

/// Checks resource roster shape: positive capacities and power, unique identifiers.
pub fn validate_resources(resources: &[Resource]) -> Result<()> {
    let mut ids = HashSet::new();
    for resource in resources {
        if resource.cpu_cores == 0 {
            return invalid(&format!("resource {}: cpu_cores must be greater than 0", resource.id));
        }
        for (name, value) in [
            ("memory", resource.memory),
            ("storage", resource.storage),
            ("network_bandwidth", resource.network_bandwidth),
            ("energy_consumption", resource.energy_consumption),
        ] {
            if !(value > 0.) {
                return invalid(&format!("resource {}: {} must be greater than 0", resource.id, name));
            }
        }
        if !ids.insert(resource.id.as_str()) {
            return invalid(&format!("duplicate resource id {}", resource.id));
        }
    }
    Ok(())
}

fn invalid(message: &str) -> Result<()> {
    Err(Error::InvalidRequest(message.to_string()))
}
