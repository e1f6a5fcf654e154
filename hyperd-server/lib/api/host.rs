//! Host handlers.
//!
//! There is exactly one host per daemon, so the class functions answer with
//! a single-element reference list and `create` is unsupported. The
//! name/description setters answer with the current value without applying
//! the write; host identity is fixed at boot. `reboot` and `shutdown`
//! require the host to be disabled first and are otherwise refused with
//! `HOST_RUNNING`.

use serde_json::json;

use crate::{
    descriptor::ApiClass,
    envelope::{ErrorCode, Response},
    error::ServerResult,
    resolver::{HandlerKind, HandlerMap},
    state::ApiServices,
};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Register the Host handlers.
pub fn register(map: &mut HandlerMap) {
    // Attribute reads; the rw attributes answer with live node state.
    map.insert(
        ApiClass::Host,
        HandlerKind::Getter,
        "name_label",
        |services, _| Ok(Response::success(services.get_node().get_name().clone())),
    );
    map.insert(
        ApiClass::Host,
        HandlerKind::Getter,
        "name_description",
        |services, _| {
            Ok(Response::success(
                services.get_node().get_description().clone(),
            ))
        },
    );
    map.insert(
        ApiClass::Host,
        HandlerKind::Getter,
        "software_version",
        software_version,
    );
    map.insert(
        ApiClass::Host,
        HandlerKind::Getter,
        "resident_VMs",
        |services, _| Ok(Response::success(services.get_domains().domain_refs())),
    );
    map.insert(
        ApiClass::Host,
        HandlerKind::Getter,
        "host_CPUs",
        |services, _| Ok(Response::success(services.get_node().cpu_refs())),
    );

    // Host identity is fixed at boot; writes answer with the current value.
    map.insert(
        ApiClass::Host,
        HandlerKind::Setter,
        "name_label",
        |services, _| Ok(Response::success(services.get_node().get_name().clone())),
    );
    map.insert(
        ApiClass::Host,
        HandlerKind::Setter,
        "name_description",
        |services, _| {
            Ok(Response::success(
                services.get_node().get_description().clone(),
            ))
        },
    );

    // Methods.
    map.insert(ApiClass::Host, HandlerKind::Method, "destroy", |_, _| {
        Ok(Response::error(ErrorCode::Unsupported))
    });
    map.insert(
        ApiClass::Host,
        HandlerKind::Method,
        "disable",
        |services, _| {
            services.get_domains().set_allow_new_domains(false);
            Ok(Response::success_void())
        },
    );
    map.insert(
        ApiClass::Host,
        HandlerKind::Method,
        "enable",
        |services, _| {
            services.get_domains().set_allow_new_domains(true);
            Ok(Response::success_void())
        },
    );
    map.insert(ApiClass::Host, HandlerKind::Method, "reboot", power_cycle);
    map.insert(ApiClass::Host, HandlerKind::Method, "shutdown", power_cycle);
    map.insert(
        ApiClass::Host,
        HandlerKind::Method,
        "get_record",
        get_record,
    );

    // Class functions.
    map.insert(
        ApiClass::Host,
        HandlerKind::Function,
        "get_all",
        |services, _| {
            Ok(Response::success(json!([services.get_node().get_uuid()])))
        },
    );
    map.insert(ApiClass::Host, HandlerKind::Function, "create", |_, _| {
        Ok(Response::error(ErrorCode::Unsupported))
    });
}

fn software_version(services: &ApiServices, _: &[serde_json::Value]) -> ServerResult<Response> {
    Ok(Response::success(json!({
        "hyperd": env!("CARGO_PKG_VERSION"),
        "hypervisor": services.get_node().get_hypervisor_version(),
    })))
}

/// The host must stop accepting new domains before it may go down; actually
/// taking it down is left to the platform.
fn power_cycle(services: &ApiServices, _: &[serde_json::Value]) -> ServerResult<Response> {
    if services.get_domains().allow_new_domains() {
        Ok(Response::error(ErrorCode::HostRunning))
    } else {
        Ok(Response::error(ErrorCode::Unsupported))
    }
}

fn get_record(services: &ApiServices, _: &[serde_json::Value]) -> ServerResult<Response> {
    let node = services.get_node();
    Ok(Response::success(json!({
        "uuid": node.get_uuid(),
        "name_label": node.get_name(),
        "name_description": node.get_description(),
        "software_version": {
            "hyperd": env!("CARGO_PKG_VERSION"),
            "hypervisor": node.get_hypervisor_version(),
        },
        "resident_VMs": services.get_domains().domain_refs(),
        "host_CPUs": node.cpu_refs(),
    })))
}
