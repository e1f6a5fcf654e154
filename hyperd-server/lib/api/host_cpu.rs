//! Host CPU handlers.
//!
//! Physical CPUs are discovered at boot and never created or destroyed
//! through the API. Every getter re-checks existence: the guard ran, but
//! the registry owns the window between check and read.

use serde_json::{json, Value};

use crate::{
    descriptor::ApiClass,
    envelope::{ErrorCode, Response},
    error::ServerResult,
    guard::reference_param,
    resolver::{HandlerKind, HandlerMap},
    state::ApiServices,
};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Register the Host_CPU handlers.
pub fn register(map: &mut HandlerMap) {
    map.insert(
        ApiClass::HostCpu,
        HandlerKind::Getter,
        "host",
        |services, _| Ok(Response::success(services.get_node().get_uuid().clone())),
    );
    map.insert(
        ApiClass::HostCpu,
        HandlerKind::Getter,
        "number",
        |services, params| {
            with_cpu(services, params, |cpu| json!(cpu.get_number()))
        },
    );
    map.insert(
        ApiClass::HostCpu,
        HandlerKind::Getter,
        "features",
        |services, params| {
            with_cpu(services, params, |cpu| json!(cpu.get_features()))
        },
    );
    map.insert(
        ApiClass::HostCpu,
        HandlerKind::Getter,
        "utilisation",
        |services, params| {
            with_cpu(services, params, |cpu| json!(cpu.get_utilisation()))
        },
    );

    map.insert(ApiClass::HostCpu, HandlerKind::Method, "destroy", |_, _| {
        Ok(Response::error(ErrorCode::Unsupported))
    });
    map.insert(ApiClass::HostCpu, HandlerKind::Method, "to_xml", |_, _| {
        Ok(Response::todo())
    });
    map.insert(
        ApiClass::HostCpu,
        HandlerKind::Method,
        "get_record",
        get_record,
    );

    map.insert(
        ApiClass::HostCpu,
        HandlerKind::Function,
        "get_all",
        |services, _| Ok(Response::success(services.get_node().cpu_refs())),
    );
    map.insert(ApiClass::HostCpu, HandlerKind::Function, "create", |_, _| {
        Ok(Response::error(ErrorCode::Unsupported))
    });
}

fn with_cpu(
    services: &ApiServices,
    params: &[Value],
    read: impl FnOnce(&hyperd_core::HostCpu) -> Value,
) -> ServerResult<Response> {
    let cpu = reference_param(params).and_then(|r| services.get_node().get_cpu(r));
    match cpu {
        Some(cpu) => Ok(Response::success(read(cpu))),
        None => Ok(Response::error(ErrorCode::HostCpuInvalid)),
    }
}

fn get_record(services: &ApiServices, params: &[Value]) -> ServerResult<Response> {
    with_cpu(services, params, |cpu| {
        json!({
            "uuid": cpu.get_uuid(),
            "host": services.get_node().get_uuid(),
            "number": cpu.get_number(),
            "features": cpu.get_features(),
            "utilisation": cpu.get_utilisation(),
        })
    })
}
