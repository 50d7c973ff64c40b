//! Resource pool state.

use crate::common::AllocationVerdict;
use crate::resource::Resource;
use crate::vm::VmRequest;

/// Stores resource capacity and the VMs currently accounted on it.
#[derive(Clone, Debug)]
pub struct HostInfo {
    pub cpu_total: u32,
    pub memory_total: f64,
    pub storage_total: f64,
    pub network_bandwidth: f64,
    pub active: bool,

    cpu_allocated: u64,
    memory_allocated: f64,
    storage_allocated: f64,

    /// Indices of allocated VMs in allocation order.
    pub allocations: Vec<usize>,
}

impl HostInfo {
    /// Creates host info with no allocations from the resource capacities.
    pub fn new(resource: &Resource) -> Self {
        Self {
            cpu_total: resource.cpu_cores,
            memory_total: resource.memory,
            storage_total: resource.storage,
            network_bandwidth: resource.network_bandwidth,
            active: resource.is_active(),
            cpu_allocated: 0,
            memory_allocated: 0.,
            storage_allocated: 0.,
            allocations: Vec::new(),
        }
    }

    fn clean(&mut self) {
        self.cpu_allocated = 0;
        self.memory_allocated = 0.;
        self.storage_allocated = 0.;
        self.allocations.clear();
    }
}

/// Capacity accounting for a resource roster within a single evaluation.
///
/// A state is built from the roster by [`ResourcePoolState::new`] with nothing allocated, so each
/// feasibility check starts from a clean state. Resources are addressed by their index in the roster.
///
/// CPU, memory and storage are consumed by allocations and may become negative when a placement
/// overcommits a resource, which makes the state invalid. Network bandwidth is nominal: allocations never
/// reduce it and only each single VM requirement is compared against it.
#[derive(Clone, Debug)]
pub struct ResourcePoolState {
    hosts: Vec<HostInfo>,
}

impl ResourcePoolState {
    /// Creates state for the given roster with no allocations.
    pub fn new(resources: &[Resource]) -> Self {
        Self {
            hosts: resources.iter().map(HostInfo::new).collect(),
        }
    }

    /// Removes all allocations from all resources.
    pub fn clean(&mut self) {
        self.hosts.iter_mut().for_each(HostInfo::clean);
    }

    /// Returns host info of the specified resource.
    pub fn host(&self, resource: usize) -> &HostInfo {
        &self.hosts[resource]
    }

    /// Checks if the specified VM can currently be placed on the specified resource.
    pub fn can_allocate(&self, vm: &VmRequest, resource: usize) -> AllocationVerdict {
        let host = &self.hosts[resource];
        if !host.active {
            return AllocationVerdict::ResourceInactive;
        }
        if self.get_available_cpu(resource) < vm.cpu_cores as i64 {
            return AllocationVerdict::NotEnoughCPU;
        }
        if self.get_available_memory(resource) < vm.memory {
            return AllocationVerdict::NotEnoughMemory;
        }
        if self.get_available_storage(resource) < vm.storage {
            return AllocationVerdict::NotEnoughStorage;
        }
        if self.get_available_bandwidth(resource) < vm.network_bandwidth {
            return AllocationVerdict::NotEnoughBandwidth;
        }
        AllocationVerdict::Success
    }

    /// Accounts the specified VM on the specified resource without any checks.
    pub fn allocate(&mut self, vm_index: usize, vm: &VmRequest, resource: usize) {
        let host = &mut self.hosts[resource];
        host.cpu_allocated += vm.cpu_cores as u64;
        host.memory_allocated += vm.memory;
        host.storage_allocated += vm.storage;
        host.allocations.push(vm_index);
    }

    /// Returns the amount of available CPU cores on the specified resource (negative if overcommitted).
    pub fn get_available_cpu(&self, resource: usize) -> i64 {
        let host = &self.hosts[resource];
        host.cpu_total as i64 - host.cpu_allocated as i64
    }

    /// Returns the amount of available memory on the specified resource.
    pub fn get_available_memory(&self, resource: usize) -> f64 {
        let host = &self.hosts[resource];
        host.memory_total - host.memory_allocated
    }

    /// Returns the amount of available storage on the specified resource.
    pub fn get_available_storage(&self, resource: usize) -> f64 {
        let host = &self.hosts[resource];
        host.storage_total - host.storage_allocated
    }

    /// Returns the nominal network bandwidth of the specified resource, it is never reduced by allocations.
    pub fn get_available_bandwidth(&self, resource: usize) -> f64 {
        self.hosts[resource].network_bandwidth
    }

    /// Returns true if CPU, memory and storage of the specified resource are not overcommitted.
    pub fn valid(&self, resource: usize) -> bool {
        self.get_available_cpu(resource) >= 0
            && self.get_available_memory(resource) >= 0.
            && self.get_available_storage(resource) >= 0.
    }

    /// Returns true if no resource is overcommitted.
    pub fn all_valid(&self) -> bool {
        (0..self.hosts.len()).all(|resource| self.valid(resource))
    }

    /// Returns true if at least one VM is allocated on the specified resource.
    pub fn is_used(&self, resource: usize) -> bool {
        !self.hosts[resource].allocations.is_empty()
    }

    /// Returns the CPU allocation rate (ratio of allocated to total cores) of the specified resource.
    pub fn get_cpu_load(&self, resource: usize) -> f64 {
        let host = &self.hosts[resource];
        ratio(host.cpu_allocated as f64, host.cpu_total as f64)
    }

    /// Returns the memory allocation rate of the specified resource.
    pub fn get_memory_load(&self, resource: usize) -> f64 {
        let host = &self.hosts[resource];
        ratio(host.memory_allocated, host.memory_total)
    }

    /// Returns the storage allocation rate of the specified resource.
    pub fn get_storage_load(&self, resource: usize) -> f64 {
        let host = &self.hosts[resource];
        ratio(host.storage_allocated, host.storage_total)
    }
}

fn ratio(used: f64, total: f64) -> f64 {
    if total == 0. {
        0.
    } else {
        used / total
    }
}
