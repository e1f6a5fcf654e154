//! The node registry: the compute host and its physical CPUs.
//!
//! This module handles:
//! - Identity of the host the daemon manages (there is exactly one)
//! - The fixed set of physical CPU records discovered at boot
//! - Reference validity checks for host and host-CPU guards
//!
//! Host and CPU references equal the entity uuid, so lookup-by-reference is
//! lookup-by-uuid throughout.

use getset::Getters;
use uuid::Uuid;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A physical CPU on the managed host.
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub with_prefix")]
pub struct HostCpu {
    /// Unique id; equal to the CPU's API reference.
    uuid: String,

    /// Zero-based CPU number.
    number: u32,

    /// Feature flags as reported by the hypervisor.
    features: String,

    /// Load average of the CPU, 0.0 to 1.0.
    utilisation: f64,
}

/// The managed compute host. Identity and hardware inventory are fixed at
/// construction; only one node exists per daemon.
#[derive(Debug, Getters)]
#[getset(get = "pub with_prefix")]
pub struct NodeRegistry {
    /// Unique id; equal to the host's API reference.
    uuid: String,

    /// Human-readable host name.
    name: String,

    /// Free-form host description.
    description: String,

    /// Version string of the underlying hypervisor.
    hypervisor_version: String,

    /// Physical CPUs discovered at boot.
    cpus: Vec<HostCpu>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl NodeRegistry {
    /// Default feature string advertised for each physical CPU.
    const CPU_FEATURES: &'static str = "fpu de tsc msr pae mce cx8 apic";

    /// Create the node registry for a host with the given identity and
    /// CPU count.
    pub fn new(name: impl Into<String>, description: impl Into<String>, cpu_count: u32) -> Self {
        let cpus = (0..cpu_count)
            .map(|number| HostCpu {
                uuid: Uuid::new_v4().to_string(),
                number,
                features: Self::CPU_FEATURES.to_string(),
                utilisation: 0.0,
            })
            .collect();

        Self {
            uuid: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            hypervisor_version: "hyperd-3.0".to_string(),
            cpus,
        }
    }

    /// Whether the reference names this host.
    pub fn is_valid_host(&self, host_ref: &str) -> bool {
        host_ref == self.uuid
    }

    /// Whether the reference names one of this host's physical CPUs.
    pub fn is_valid_cpu(&self, cpu_ref: &str) -> bool {
        self.cpus.iter().any(|cpu| cpu.uuid == cpu_ref)
    }

    /// References of all physical CPUs.
    pub fn cpu_refs(&self) -> Vec<String> {
        self.cpus.iter().map(|cpu| cpu.uuid.clone()).collect()
    }

    /// Look up a physical CPU by reference.
    pub fn get_cpu(&self, cpu_ref: &str) -> Option<&HostCpu> {
        self.cpus.iter().find(|cpu| cpu.uuid == cpu_ref)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_reference_equals_uuid() {
        let node = NodeRegistry::new("node0", "test host", 2);
        assert!(node.is_valid_host(node.get_uuid()));
        assert!(!node.is_valid_host("not-a-host"));
    }

    #[test]
    fn test_cpu_inventory() {
        let node = NodeRegistry::new("node0", "test host", 4);
        let refs = node.cpu_refs();
        assert_eq!(refs.len(), 4);

        for (number, cpu_ref) in refs.iter().enumerate() {
            assert!(node.is_valid_cpu(cpu_ref));
            let cpu = node.get_cpu(cpu_ref).unwrap();
            assert_eq!(*cpu.get_number(), number as u32);
        }
        assert!(node.get_cpu("missing").is_none());
    }
}
