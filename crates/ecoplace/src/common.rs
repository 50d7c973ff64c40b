use serde::{Deserialize, Serialize};

/// Placement of a single VM onto a resource.
///
/// Both fields are indices: `vm` into the VM list and `resource` into the resource roster of a
/// [`PlacementProblem`](crate::solution::PlacementProblem).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Allocation {
    pub vm: usize,
    pub resource: usize,
}

impl Allocation {
    pub fn new(vm: usize, resource: usize) -> Self {
        Self { vm, resource }
    }
}

#[derive(Debug, PartialEq)]
pub enum AllocationVerdict {
    NotEnoughCPU,
    NotEnoughMemory,
    NotEnoughStorage,
    NotEnoughBandwidth,
    ResourceInactive,
    Success,
}
