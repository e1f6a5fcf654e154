//! Virtual machine handlers.
//!
//! The VM class carries the widest declared surface. Attributes the
//! underlying registry tracks answer with live state; attributes the
//! hypervisor backend does not expose yet answer with the TODO sentinel so
//! the surface stays discoverable; the boot/kernel attribute family answers
//! an empty string until a boot configuration store exists. Every declared
//! writable attribute has an accept-and-ignore setter.
//!
//! Lifecycle methods delegate to the domain registry. A reference that
//! vanished since the guard ran maps to `VM_INVALID`; an illegal power-state
//! transition is a collaborator error and deliberately escapes the envelope.

use hyperd_core::{CoreError, CoreResult, Domain, DomainSpec, ShutdownReason};
use serde_json::{json, Value};

use crate::{
    api::require_struct,
    descriptor::{ApiClass, VM_ATTR_RW},
    envelope::{ErrorCode, Response},
    error::ServerResult,
    guard::reference_param,
    resolver::{HandlerKind, HandlerMap},
    state::ApiServices,
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Declared attributes the hypervisor backend does not expose yet.
const TODO_ATTRS: &[&str] = &[
    "memory_actual",
    "memory_dynamic_max",
    "memory_dynamic_min",
    "VCPUs_policy",
    "VCPUs_params",
    "VCPUs_features_required",
    "VCPUs_can_use",
    "VCPUs_features_force_on",
    "VCPUs_features_force_off",
    "TPM_instance",
    "TPM_backend",
    "PCI_bus",
    "tools_version",
    "user_version",
    "is_a_template",
    "platform_std_VGA",
    "platform_serial",
    "platform_localtime",
    "platform_clock_offset",
    "platform_enable_audio",
    "builder",
    "other_config",
];

/// Boot-configuration attributes that answer an empty string until a boot
/// store exists.
const EMPTY_ATTRS: &[&str] = &[
    "actions_after_shutdown",
    "actions_after_reboot",
    "actions_after_suspend",
    "actions_after_crash",
    "bios_boot",
    "boot_method",
    "kernel_kernel",
    "kernel_initrd",
    "kernel_args",
    "grub_cmdline",
];

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Register the VM handlers.
pub fn register(map: &mut HandlerMap) {
    // Attributes backed by registry state.
    map.insert(
        ApiClass::Vm,
        HandlerKind::Getter,
        "power_state",
        |services, params| {
            with_domain(services, params, |dom| {
                json!(dom.get_power_state().as_str())
            })
        },
    );
    map.insert(
        ApiClass::Vm,
        HandlerKind::Getter,
        "resident_on",
        |services, _| Ok(Response::success(services.get_node().get_uuid().clone())),
    );
    map.insert(
        ApiClass::Vm,
        HandlerKind::Getter,
        "name_label",
        |services, params| {
            with_domain(services, params, |dom| json!(dom.get_name_label()))
        },
    );
    map.insert(
        ApiClass::Vm,
        HandlerKind::Getter,
        "name_description",
        |services, params| {
            with_domain(services, params, |dom| json!(dom.get_name_description()))
        },
    );
    map.insert(
        ApiClass::Vm,
        HandlerKind::Getter,
        "memory_static_max",
        |services, params| {
            with_domain(services, params, |dom| json!(dom.get_memory_static_max()))
        },
    );
    map.insert(
        ApiClass::Vm,
        HandlerKind::Getter,
        "memory_static_min",
        |services, params| {
            with_domain(services, params, |dom| json!(dom.get_memory_static_min()))
        },
    );
    map.insert(
        ApiClass::Vm,
        HandlerKind::Getter,
        "VCPUs_number",
        |services, params| {
            with_domain(services, params, |dom| json!(dom.get_vcpus_number()))
        },
    );
    map.insert(
        ApiClass::Vm,
        HandlerKind::Getter,
        "VCPUs_utilisation",
        |services, params| {
            with_domain(services, params, |dom| json!(dom.get_vcpus_utilisation()))
        },
    );
    map.insert(
        ApiClass::Vm,
        HandlerKind::Getter,
        "VIFs",
        |services, params| with_domain(services, params, |dom| json!(dom.vif_refs())),
    );
    map.insert(
        ApiClass::Vm,
        HandlerKind::Getter,
        "VBDs",
        |services, params| with_domain(services, params, |dom| json!(dom.vbd_refs())),
    );

    for attr in TODO_ATTRS {
        map.insert(ApiClass::Vm, HandlerKind::Getter, attr, |_, _| {
            Ok(Response::todo())
        });
    }
    for attr in EMPTY_ATTRS {
        map.insert(ApiClass::Vm, HandlerKind::Getter, attr, |_, _| {
            Ok(Response::success(""))
        });
    }

    // Every declared writable attribute accepts the write and ignores it;
    // domain reconfiguration goes through create for now.
    for attr in VM_ATTR_RW {
        map.insert(ApiClass::Vm, HandlerKind::Setter, attr, |_, _| {
            Ok(Response::success_void())
        });
    }

    // Lifecycle methods.
    map.insert(
        ApiClass::Vm,
        HandlerKind::Method,
        "start",
        |services, params| lifecycle(services, params, |d, r| d.start(r)),
    );
    map.insert(
        ApiClass::Vm,
        HandlerKind::Method,
        "pause",
        |services, params| lifecycle(services, params, |d, r| d.pause(r)),
    );
    map.insert(
        ApiClass::Vm,
        HandlerKind::Method,
        "unpause",
        |services, params| lifecycle(services, params, |d, r| d.unpause(r)),
    );
    map.insert(
        ApiClass::Vm,
        HandlerKind::Method,
        "suspend",
        |services, params| lifecycle(services, params, |d, r| d.suspend(r)),
    );
    map.insert(
        ApiClass::Vm,
        HandlerKind::Method,
        "resume",
        |services, params| lifecycle(services, params, |d, r| d.resume(r)),
    );
    map.insert(
        ApiClass::Vm,
        HandlerKind::Method,
        "clean_shutdown",
        |services, params| {
            lifecycle(services, params, |d, r| {
                d.shutdown(r, ShutdownReason::Poweroff)
            })
        },
    );
    map.insert(
        ApiClass::Vm,
        HandlerKind::Method,
        "clean_reboot",
        |services, params| {
            lifecycle(services, params, |d, r| {
                d.shutdown(r, ShutdownReason::Reboot)
            })
        },
    );
    map.insert(
        ApiClass::Vm,
        HandlerKind::Method,
        "hard_shutdown",
        |services, params| lifecycle(services, params, |d, r| d.destroy(r)),
    );
    map.insert(ApiClass::Vm, HandlerKind::Method, "hard_reboot", |_, _| {
        Ok(Response::error(ErrorCode::Unsupported))
    });
    map.insert(ApiClass::Vm, HandlerKind::Method, "clone", |_, _| {
        Ok(Response::error(ErrorCode::Unsupported))
    });
    map.insert(
        ApiClass::Vm,
        HandlerKind::Method,
        "destroy",
        |services, params| lifecycle(services, params, |d, r| d.delete_domain(r)),
    );
    map.insert(ApiClass::Vm, HandlerKind::Method, "to_xml", |_, _| {
        Ok(Response::todo())
    });
    map.insert(
        ApiClass::Vm,
        HandlerKind::Method,
        "get_record",
        get_record,
    );

    // Class functions.
    map.insert(
        ApiClass::Vm,
        HandlerKind::Function,
        "get_all",
        |services, _| Ok(Response::success(services.get_domains().domain_refs())),
    );
    map.insert(
        ApiClass::Vm,
        HandlerKind::Function,
        "get_by_label",
        get_by_label,
    );
    map.insert(ApiClass::Vm, HandlerKind::Function, "create", create);
}

fn with_domain(
    services: &ApiServices,
    params: &[Value],
    read: impl FnOnce(&Domain) -> Value,
) -> ServerResult<Response> {
    let domain = reference_param(params).and_then(|r| services.get_domains().get(r));
    match domain {
        Some(dom) => Ok(Response::success(read(&dom))),
        None => Ok(Response::error(ErrorCode::VmInvalid)),
    }
}

fn lifecycle(
    services: &ApiServices,
    params: &[Value],
    op: impl FnOnce(&hyperd_core::DomainRegistry, &str) -> CoreResult<()>,
) -> ServerResult<Response> {
    let Some(reference) = reference_param(params) else {
        return Ok(Response::error(ErrorCode::VmInvalid));
    };
    match op(services.get_domains(), reference) {
        Ok(()) => Ok(Response::success_void()),
        Err(CoreError::DomainNotFound(_)) => Ok(Response::error(ErrorCode::VmInvalid)),
        Err(err) => Err(err.into()),
    }
}

fn get_record(services: &ApiServices, params: &[Value]) -> ServerResult<Response> {
    let node_uuid = services.get_node().get_uuid().clone();
    with_domain(services, params, |dom| {
        json!({
            "uuid": dom.get_uuid(),
            "power_state": dom.get_power_state().as_str(),
            "name_label": dom.get_name_label(),
            "name_description": dom.get_name_description(),
            "user_version": 1,
            "is_a_template": false,
            "resident_on": node_uuid,
            "memory_static_min": dom.get_memory_static_min(),
            "memory_static_max": dom.get_memory_static_max(),
            "memory_dynamic_min": dom.get_memory_static_min(),
            "memory_dynamic_max": dom.get_memory_static_max(),
            "memory_actual": dom.get_memory_static_min(),
            "VCPUs_number": dom.get_vcpus_number(),
            "VCPUs_utilisation": dom.get_vcpus_utilisation(),
            "VIFs": dom.vif_refs(),
            "VBDs": dom.vbd_refs(),
            "actions_after_shutdown": "",
            "actions_after_reboot": "",
            "actions_after_suspend": "",
            "actions_after_crash": "",
            "bios_boot": "",
            "boot_method": "",
            "kernel_kernel": "",
            "kernel_initrd": "",
            "kernel_args": "",
            "grub_cmdline": "",
            "other_config": {},
        })
    })
}

fn get_by_label(services: &ApiServices, params: &[Value]) -> ServerResult<Response> {
    match params
        .get(1)
        .and_then(Value::as_str)
        .and_then(|label| services.get_domains().lookup_by_label(label))
    {
        Some(vm_ref) => Ok(Response::success(vm_ref)),
        None => Ok(Response::error(ErrorCode::VmInvalid)),
    }
}

fn create(services: &ApiServices, params: &[Value]) -> ServerResult<Response> {
    let spec: DomainSpec = require_struct(params, 1, "vm spec")?;
    let vm_ref = services.get_domains().create_domain(spec);
    Ok(Response::success(vm_ref))
}
