//! Virtual machine request.

use rand::distributions::{Alphanumeric, DistString};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Length of identifiers generated for VMs submitted without one.
pub const GENERATED_ID_LEN: usize = 16;

/// Represents a request to place a virtual machine (VM) with specified resource requirements.
///
/// Requests are immutable for the duration of an allocation run once their identifier is set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VmRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub cpu_cores: u32,
    pub memory: f64,
    pub storage: f64,
    pub network_bandwidth: f64,
}

impl VmRequest {
    /// Creates VM request without identifier.
    pub fn new(cpu_cores: u32, memory: f64, storage: f64, network_bandwidth: f64) -> Self {
        Self {
            id: None,
            cpu_cores,
            memory,
            storage,
            network_bandwidth,
        }
    }

    /// Returns the same request with the given identifier.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Assigns a random alphanumeric identifier if the request has none and returns the identifier.
    ///
    /// Generated identifiers are not checked for uniqueness against other requests.
    pub fn ensure_id<R: Rng>(&mut self, rng: &mut R) -> &str {
        self.id
            .get_or_insert_with(|| Alphanumeric.sample_string(rng, GENERATED_ID_LEN))
            .as_str()
    }

    /// Returns the VM identifier or an empty string if it is not assigned yet.
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }
}
