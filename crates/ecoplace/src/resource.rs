//! Resource (physical host) model.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::config::read_structured;
use crate::error::Result;

/// Status of a resource. Only active resources can receive new VMs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceStatus {
    Active,
    Inactive,
}

impl Display for ResourceStatus {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ResourceStatus::Active => write!(f, "ACTIVE"),
            ResourceStatus::Inactive => write!(f, "INACTIVE"),
        }
    }
}

/// Represents a host that can run virtual machines.
///
/// Described by its capacities (CPU cores, memory, storage and network bandwidth) and the constant power it draws
/// while at least one VM is allocated to it. The resource itself carries no allocation state, the current load of
/// a resource is tracked by [`ResourcePoolState`](crate::resource_pool::ResourcePoolState).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub cpu_cores: u32,
    pub memory: f64,
    pub storage: f64,
    pub network_bandwidth: f64,
    pub energy_consumption: f64,
    pub status: ResourceStatus,
}

impl Resource {
    /// Creates an active resource with specified capacities.
    pub fn new(
        id: &str,
        cpu_cores: u32,
        memory: f64,
        storage: f64,
        network_bandwidth: f64,
        energy_consumption: f64,
    ) -> Self {
        Self {
            id: id.to_string(),
            cpu_cores,
            memory,
            storage,
            network_bandwidth,
            energy_consumption,
            status: ResourceStatus::Active,
        }
    }

    /// Returns the same resource with the given status.
    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == ResourceStatus::Active
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Resources {
    resources: Vec<Resource>,
}

/// Loads the resource roster from YAML (or JSON, if the file has `.json` extension).
///
/// Roster file example: `crates/ecoplace/test-configs/resources.yaml`.
pub fn load_resources(file: &str) -> Result<Vec<Resource>> {
    let roster: Resources = read_structured(file)?;
    Ok(roster.resources)
}
