//! The domain registry: virtual machines and their virtual devices.
//!
//! This module handles:
//! - Domain records and their power-state lifecycle
//! - Virtual block devices (VBD) and virtual network interfaces (VIF)
//! - Reference validity checks for the VM and device guards
//!
//! Lifecycle mutators enforce the legal power-state transitions; an attempt
//! to, say, pause a halted domain fails with
//! [`CoreError::InvalidPowerState`] rather than silently coercing state.
//! Serialization of concurrent mutations to the same domain is owned by the
//! registry lock, not by callers.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        PoisonError, RwLock,
    },
};

use getset::Getters;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

//--------------------------------------------------------------------------------------------------
// Types: Power State
//--------------------------------------------------------------------------------------------------

/// Power state of a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerState {
    /// The domain is defined but not running.
    Halted,
    /// The domain is running but paused.
    Paused,
    /// The domain is running.
    Running,
    /// The domain state has been written out; it can be resumed.
    Suspended,
    /// The domain is on its way down.
    ShuttingDown,
    /// The domain state could not be determined.
    Unknown,
}

impl PowerState {
    /// Wire representation of the power state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Halted => "Halted",
            Self::Paused => "Paused",
            Self::Running => "Running",
            Self::Suspended => "Suspended",
            Self::ShuttingDown => "ShuttingDown",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a clean shutdown should leave the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Power the domain off.
    Poweroff,
    /// Bring the domain back up after going down.
    Reboot,
}

//--------------------------------------------------------------------------------------------------
// Types: Devices
//--------------------------------------------------------------------------------------------------

/// Kinds of virtual device a domain can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Virtual block device.
    Vbd,
    /// Virtual network interface.
    Vif,
}

impl DeviceKind {
    /// Short lowercase name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vbd => "vbd",
            Self::Vif => "vif",
        }
    }
}

/// Creation parameters for a virtual block device.
#[derive(Debug, Clone, Deserialize)]
pub struct VbdSpec {
    /// Reference of the owning domain.
    #[serde(rename = "VM")]
    pub vm: String,

    /// Reference of the backing virtual disk image, if any.
    #[serde(rename = "VDI", default)]
    pub vdi: Option<String>,

    /// Guest device name, e.g. `xvda`.
    pub device: String,

    /// Access mode, e.g. `RW` or `RO`.
    pub mode: String,

    /// Backend driver, e.g. `paravirtualised`.
    pub driver: String,

    /// Host-side image path.
    #[serde(default)]
    pub image: Option<String>,
}

/// A virtual block device attached to a domain.
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub with_prefix")]
pub struct Vbd {
    /// Unique id; equal to the device's API reference.
    uuid: String,
    /// Reference of the owning domain.
    vm: String,
    /// Reference of the backing virtual disk image, if any.
    vdi: Option<String>,
    /// Guest device name.
    device: String,
    /// Access mode.
    mode: String,
    /// Backend driver.
    driver: String,
    /// Host-side image path.
    image: Option<String>,
}

/// Creation parameters for a virtual network interface.
#[derive(Debug, Clone, Deserialize)]
pub struct VifSpec {
    /// Reference of the owning domain.
    #[serde(rename = "VM")]
    pub vm: String,

    /// Interface name, e.g. `eth0`.
    pub name: String,

    /// Interface type.
    #[serde(rename = "type", default)]
    pub if_type: Option<String>,

    /// Guest device name.
    #[serde(default)]
    pub device: Option<String>,

    /// Network the interface attaches to.
    #[serde(default)]
    pub network: Option<String>,

    /// Hardware address.
    #[serde(rename = "MAC", default)]
    pub mac: Option<String>,

    /// Maximum transmission unit.
    #[serde(rename = "MTU", default)]
    pub mtu: Option<u32>,
}

/// A virtual network interface attached to a domain.
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub with_prefix")]
pub struct Vif {
    /// Unique id; equal to the device's API reference.
    uuid: String,
    /// Reference of the owning domain.
    vm: String,
    /// Interface name.
    name: String,
    /// Interface type.
    if_type: Option<String>,
    /// Guest device name.
    device: Option<String>,
    /// Network the interface attaches to.
    network: Option<String>,
    /// Hardware address.
    mac: Option<String>,
    /// Maximum transmission unit.
    mtu: Option<u32>,
}

//--------------------------------------------------------------------------------------------------
// Types: Domains
//--------------------------------------------------------------------------------------------------

/// Creation parameters for a domain.
#[derive(Debug, Clone, Deserialize)]
pub struct DomainSpec {
    /// Human-readable name.
    pub name_label: String,

    /// Free-form description.
    #[serde(default)]
    pub name_description: String,

    /// Static minimum memory in MiB.
    #[serde(default = "DomainSpec::default_memory")]
    pub memory_static_min: u64,

    /// Static maximum memory in MiB.
    #[serde(default = "DomainSpec::default_memory")]
    pub memory_static_max: u64,

    /// Number of virtual CPUs.
    #[serde(default = "DomainSpec::default_vcpus")]
    pub vcpus_number: u32,
}

impl DomainSpec {
    fn default_memory() -> u64 {
        256
    }

    fn default_vcpus() -> u32 {
        1
    }
}

/// A virtual machine known to the registry.
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub with_prefix")]
pub struct Domain {
    /// Unique id; equal to the domain's API reference.
    uuid: String,
    /// Human-readable name.
    name_label: String,
    /// Free-form description.
    name_description: String,
    /// Current power state.
    power_state: PowerState,
    /// Static minimum memory in MiB.
    memory_static_min: u64,
    /// Static maximum memory in MiB.
    memory_static_max: u64,
    /// Number of virtual CPUs.
    vcpus_number: u32,
    /// Aggregate vCPU load, 0.0 to 1.0.
    vcpus_utilisation: f64,
    /// Attached virtual block devices.
    vbds: Vec<Vbd>,
    /// Attached virtual network interfaces.
    vifs: Vec<Vif>,
}

impl Domain {
    /// References of the attached virtual block devices.
    pub fn vbd_refs(&self) -> Vec<String> {
        self.vbds.iter().map(|d| d.uuid.clone()).collect()
    }

    /// References of the attached virtual network interfaces.
    pub fn vif_refs(&self) -> Vec<String> {
        self.vifs.iter().map(|d| d.uuid.clone()).collect()
    }
}

/// Owns every domain on the host, keyed by reference.
pub struct DomainRegistry {
    domains: RwLock<HashMap<String, Domain>>,
    allow_new_domains: AtomicBool,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl DomainRegistry {
    /// Create an empty registry that accepts new domains.
    pub fn new() -> Self {
        Self {
            domains: RwLock::new(HashMap::new()),
            allow_new_domains: AtomicBool::new(true),
        }
    }

    /// Whether the host currently accepts new domains.
    pub fn allow_new_domains(&self) -> bool {
        self.allow_new_domains.load(Ordering::SeqCst)
    }

    /// Enable or disable creation of new domains on the host.
    pub fn set_allow_new_domains(&self, allow: bool) {
        self.allow_new_domains.store(allow, Ordering::SeqCst);
    }

    /// Whether the reference names a known domain.
    pub fn is_valid_vm(&self, vm_ref: &str) -> bool {
        self.read().contains_key(vm_ref)
    }

    /// Whether the reference names a known device of the given kind.
    pub fn is_valid_device(&self, kind: DeviceKind, dev_ref: &str) -> bool {
        let domains = self.read();
        match kind {
            DeviceKind::Vbd => domains
                .values()
                .any(|dom| dom.vbds.iter().any(|d| d.uuid == dev_ref)),
            DeviceKind::Vif => domains
                .values()
                .any(|dom| dom.vifs.iter().any(|d| d.uuid == dev_ref)),
        }
    }

    /// References of every known domain.
    pub fn domain_refs(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Snapshot of a domain record.
    pub fn get(&self, vm_ref: &str) -> Option<Domain> {
        self.read().get(vm_ref).cloned()
    }

    /// Reference of the domain with the given name label, if any.
    pub fn lookup_by_label(&self, label: &str) -> Option<String> {
        self.read()
            .values()
            .find(|dom| dom.name_label == label)
            .map(|dom| dom.uuid.clone())
    }

    /// Create a halted domain from a spec and return its reference.
    pub fn create_domain(&self, spec: DomainSpec) -> String {
        let uuid = Uuid::new_v4().to_string();
        let domain = Domain {
            uuid: uuid.clone(),
            name_label: spec.name_label,
            name_description: spec.name_description,
            power_state: PowerState::Halted,
            memory_static_min: spec.memory_static_min,
            memory_static_max: spec.memory_static_max,
            vcpus_number: spec.vcpus_number,
            vcpus_utilisation: 0.0,
            vbds: Vec::new(),
            vifs: Vec::new(),
        };
        tracing::info!("created domain '{}' ({})", domain.name_label, uuid);
        self.write().insert(uuid.clone(), domain);
        uuid
    }

    /// Remove a domain from the registry regardless of its state.
    pub fn delete_domain(&self, vm_ref: &str) -> CoreResult<()> {
        self.write()
            .remove(vm_ref)
            .map(|dom| tracing::info!("deleted domain '{}' ({})", dom.name_label, vm_ref))
            .ok_or_else(|| CoreError::DomainNotFound(vm_ref.to_string()))
    }

    /// Start a halted domain.
    pub fn start(&self, vm_ref: &str) -> CoreResult<()> {
        self.transition(vm_ref, "start", &[PowerState::Halted], PowerState::Running)
    }

    /// Pause a running domain.
    pub fn pause(&self, vm_ref: &str) -> CoreResult<()> {
        self.transition(vm_ref, "pause", &[PowerState::Running], PowerState::Paused)
    }

    /// Unpause a paused domain.
    pub fn unpause(&self, vm_ref: &str) -> CoreResult<()> {
        self.transition(vm_ref, "unpause", &[PowerState::Paused], PowerState::Running)
    }

    /// Suspend a running domain to state storage.
    pub fn suspend(&self, vm_ref: &str) -> CoreResult<()> {
        self.transition(
            vm_ref,
            "suspend",
            &[PowerState::Running],
            PowerState::Suspended,
        )
    }

    /// Resume a suspended domain.
    pub fn resume(&self, vm_ref: &str) -> CoreResult<()> {
        self.transition(
            vm_ref,
            "resume",
            &[PowerState::Suspended],
            PowerState::Running,
        )
    }

    /// Cleanly shut a running domain down, or cycle it for a reboot.
    pub fn shutdown(&self, vm_ref: &str, reason: ShutdownReason) -> CoreResult<()> {
        let target = match reason {
            ShutdownReason::Poweroff => PowerState::Halted,
            ShutdownReason::Reboot => PowerState::Running,
        };
        self.transition(vm_ref, "shutdown", &[PowerState::Running], target)
    }

    /// Forcibly halt a domain from any state.
    pub fn destroy(&self, vm_ref: &str) -> CoreResult<()> {
        let mut domains = self.write();
        let dom = domains
            .get_mut(vm_ref)
            .ok_or_else(|| CoreError::DomainNotFound(vm_ref.to_string()))?;
        dom.power_state = PowerState::Halted;
        tracing::info!("destroyed domain '{}' ({})", dom.name_label, vm_ref);
        Ok(())
    }

    /// Attach a new virtual block device to the owning domain.
    pub fn create_vbd(&self, spec: VbdSpec) -> CoreResult<String> {
        let mut domains = self.write();
        let dom = domains
            .get_mut(&spec.vm)
            .ok_or_else(|| CoreError::DomainNotFound(spec.vm.clone()))?;

        let uuid = Uuid::new_v4().to_string();
        dom.vbds.push(Vbd {
            uuid: uuid.clone(),
            vm: spec.vm,
            vdi: spec.vdi,
            device: spec.device,
            mode: spec.mode,
            driver: spec.driver,
            image: spec.image,
        });
        Ok(uuid)
    }

    /// Attach a new virtual network interface to the owning domain.
    pub fn create_vif(&self, spec: VifSpec) -> CoreResult<String> {
        let mut domains = self.write();
        let dom = domains
            .get_mut(&spec.vm)
            .ok_or_else(|| CoreError::DomainNotFound(spec.vm.clone()))?;

        let uuid = Uuid::new_v4().to_string();
        dom.vifs.push(Vif {
            uuid: uuid.clone(),
            vm: spec.vm,
            name: spec.name,
            if_type: spec.if_type,
            device: spec.device,
            network: spec.network,
            mac: spec.mac,
            mtu: spec.mtu,
        });
        Ok(uuid)
    }

    /// Snapshot of a virtual block device record.
    pub fn get_vbd(&self, vbd_ref: &str) -> Option<Vbd> {
        self.read()
            .values()
            .flat_map(|dom| dom.vbds.iter())
            .find(|d| d.uuid == vbd_ref)
            .cloned()
    }

    /// Snapshot of a virtual network interface record.
    pub fn get_vif(&self, vif_ref: &str) -> Option<Vif> {
        self.read()
            .values()
            .flat_map(|dom| dom.vifs.iter())
            .find(|d| d.uuid == vif_ref)
            .cloned()
    }

    fn transition(
        &self,
        vm_ref: &str,
        operation: &'static str,
        from: &[PowerState],
        to: PowerState,
    ) -> CoreResult<()> {
        let mut domains = self.write();
        let dom = domains
            .get_mut(vm_ref)
            .ok_or_else(|| CoreError::DomainNotFound(vm_ref.to_string()))?;

        if !from.contains(&dom.power_state) {
            return Err(CoreError::InvalidPowerState {
                name: dom.name_label.clone(),
                operation,
                state: dom.power_state,
            });
        }
        tracing::debug!(
            "domain '{}': {} ({} -> {})",
            dom.name_label,
            operation,
            dom.power_state,
            to
        );
        dom.power_state = to;
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Domain>> {
        self.domains.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Domain>> {
        self.domains.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DomainRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
