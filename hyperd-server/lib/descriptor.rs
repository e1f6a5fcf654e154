//! Static per-class API declarations.
//!
//! Each resource class declares its readable attributes, writable attributes,
//! instance methods, class functions, and the ordered guard chain that applies
//! to its non-function operations. A fixed set of base entries is appended to
//! every class before resolution. The declarations are data, not behavior:
//! whether a declared operation actually ends up in the dispatch table depends
//! on the handler resolver finding an implementation for it.
//!
//! Guard chains are declared in fold order: each later guard wraps the result
//! of the earlier ones, so the last-listed guard is the outermost check at
//! call time. Class functions never get reference guards since no instance
//! exists yet.

use crate::guard::Guard;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The declared resource classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiClass {
    /// Login sessions.
    Session,
    /// The compute host.
    Host,
    /// A physical CPU of the host.
    HostCpu,
    /// A virtual machine.
    Vm,
    /// A virtual block device.
    Vbd,
    /// A virtual network interface.
    Vif,
    /// A virtual network. Declared only; no handlers exist yet.
    Network,
}

impl ApiClass {
    /// The canonical class name used in operation names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Session => "Session",
            Self::Host => "Host",
            Self::HostCpu => "Host_CPU",
            Self::Vm => "VM",
            Self::Vbd => "VBD",
            Self::Vif => "VIF",
            Self::Network => "Network",
        }
    }
}

/// One class's declared surface.
pub struct ClassDescriptor {
    /// The class being described.
    pub class: ApiClass,
    /// Read-only attribute names.
    pub attr_ro: &'static [&'static str],
    /// Read-write attribute names.
    pub attr_rw: &'static [&'static str],
    /// Instance method names.
    pub methods: &'static [&'static str],
    /// Class function names.
    pub funcs: &'static [&'static str],
    /// Guard chain for non-function operations, in fold order.
    pub guards: &'static [Guard],
}

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Read-only attributes every class carries.
pub const BASE_ATTR_RO: &[&str] = &["uuid"];

/// Read-write attributes every class carries.
pub const BASE_ATTR_RW: &[&str] = &[];

/// Instance methods every class carries.
pub const BASE_METHODS: &[&str] = &["destroy", "to_xml", "get_record"];

/// Class functions every class carries.
pub const BASE_FUNCS: &[&str] = &["create", "get_by_uuid", "get_all"];

/// The full VM read-write attribute list; also used to register the
/// accept-and-ignore setters.
pub const VM_ATTR_RW: &[&str] = &[
    "name_label",
    "name_description",
    "user_version",
    "is_a_template",
    "memory_dynamic_max",
    "memory_dynamic_min",
    "VCPUs_policy",
    "VCPUs_params",
    "VCPUs_features_force_on",
    "VCPUs_features_force_off",
    "actions_after_shutdown",
    "actions_after_reboot",
    "actions_after_suspend",
    "actions_after_crash",
    "bios_boot",
    "platform_std_VGA",
    "platform_serial",
    "platform_localtime",
    "platform_clock_offset",
    "platform_enable_audio",
    "builder",
    "boot_method",
    "kernel_kernel",
    "kernel_initrd",
    "kernel_args",
    "grub_cmdline",
    "other_config",
];

static DESCRIPTORS: [ClassDescriptor; 7] = [
    ClassDescriptor {
        class: ApiClass::Session,
        attr_ro: &["this_host", "this_user"],
        attr_rw: &[],
        methods: &["logout"],
        funcs: &[],
        guards: &[Guard::Session],
    },
    ClassDescriptor {
        class: ApiClass::Host,
        attr_ro: &["software_version", "resident_VMs", "host_CPUs"],
        attr_rw: &["name_label", "name_description"],
        methods: &["disable", "enable", "reboot", "shutdown"],
        funcs: &["get_by_label"],
        guards: &[Guard::HostRef, Guard::Session],
    },
    ClassDescriptor {
        class: ApiClass::HostCpu,
        attr_ro: &["host", "number", "features", "utilisation"],
        attr_rw: &[],
        methods: &[],
        funcs: &[],
        guards: &[Guard::HostCpuRef, Guard::Session],
    },
    ClassDescriptor {
        class: ApiClass::Vm,
        attr_ro: &[
            "power_state",
            "resident_on",
            "memory_actual",
            "memory_static_max",
            "memory_static_min",
            "VCPUs_number",
            "VCPUs_utilisation",
            "VCPUs_features_required",
            "VCPUs_can_use",
            "VIFs",
            "VBDs",
            "TPM_instance",
            "TPM_backend",
            "PCI_bus",
            "tools_version",
        ],
        attr_rw: VM_ATTR_RW,
        methods: &[
            "clone",
            "start",
            "pause",
            "unpause",
            "clean_shutdown",
            "clean_reboot",
            "hard_shutdown",
            "hard_reboot",
            "suspend",
            "resume",
        ],
        funcs: &["get_by_label"],
        guards: &[Guard::VmRef, Guard::Session],
    },
    ClassDescriptor {
        class: ApiClass::Vbd,
        attr_ro: &[
            "image",
            "IO_bandwidth_incoming_kbs",
            "IO_bandwidth_outgoing_kbs",
        ],
        attr_rw: &["VM", "VDI", "device", "mode", "driver"],
        methods: &[],
        funcs: &[],
        guards: &[Guard::VbdRef, Guard::Session],
    },
    ClassDescriptor {
        class: ApiClass::Vif,
        attr_ro: &[
            "network_read_kbs",
            "network_write_kbs",
            "IO_bandwidth_incoming_kbs",
            "IO_bandwidth_outgoing_kbs",
        ],
        attr_rw: &["name", "type", "device", "network", "VM", "MAC", "MTU"],
        methods: &[],
        funcs: &[],
        guards: &[Guard::VifRef, Guard::Session],
    },
    ClassDescriptor {
        class: ApiClass::Network,
        attr_ro: &["VIFs"],
        attr_rw: &[
            "name_label",
            "name_description",
            "NIC",
            "VLAN",
            "default_gateway",
            "default_netmask",
        ],
        methods: &[],
        funcs: &[],
        guards: &[Guard::Session],
    },
];

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Every declared class descriptor, in registration order.
pub fn descriptors() -> &'static [ClassDescriptor] {
    &DESCRIPTORS
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
