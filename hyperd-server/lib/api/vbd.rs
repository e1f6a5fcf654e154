//! Virtual block device handlers.
//!
//! Devices are created through their owning domain, so `create` validates
//! the `VM` field of the spec and answers `DOMAIN_INVALID` when it names
//! nothing. The `VDI` attribute is declared but unsupported until a storage
//! repository exists.

use hyperd_core::{CoreError, Vbd, VbdSpec};
use serde_json::{json, Value};

use crate::{
    api::require_struct,
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

/// Register the VBD handlers.
pub fn register(map: &mut HandlerMap) {
    map.insert(
        ApiClass::Vbd,
        HandlerKind::Getter,
        "VM",
        |services, params| with_vbd(services, params, |vbd| json!(vbd.get_vm())),
    );
    map.insert(ApiClass::Vbd, HandlerKind::Getter, "VDI", |_, _| {
        Ok(Response::error(ErrorCode::Unsupported))
    });
    map.insert(
        ApiClass::Vbd,
        HandlerKind::Getter,
        "device",
        |services, params| with_vbd(services, params, |vbd| json!(vbd.get_device())),
    );
    map.insert(
        ApiClass::Vbd,
        HandlerKind::Getter,
        "mode",
        |services, params| with_vbd(services, params, |vbd| json!(vbd.get_mode())),
    );
    map.insert(
        ApiClass::Vbd,
        HandlerKind::Getter,
        "driver",
        |services, params| with_vbd(services, params, |vbd| json!(vbd.get_driver())),
    );

    map.insert(
        ApiClass::Vbd,
        HandlerKind::Method,
        "get_record",
        get_record,
    );

    map.insert(ApiClass::Vbd, HandlerKind::Function, "create", create);
}

fn with_vbd(
    services: &ApiServices,
    params: &[Value],
    read: impl FnOnce(&Vbd) -> Value,
) -> ServerResult<Response> {
    let vbd = reference_param(params).and_then(|r| services.get_domains().get_vbd(r));
    match vbd {
        Some(vbd) => Ok(Response::success(read(&vbd))),
        None => Ok(Response::error(ErrorCode::VbdInvalid)),
    }
}

fn get_record(services: &ApiServices, params: &[Value]) -> ServerResult<Response> {
    with_vbd(services, params, |vbd| {
        json!({
            "uuid": vbd.get_uuid(),
            "VM": vbd.get_vm(),
            "VDI": vbd.get_vdi(),
            "device": vbd.get_device(),
            "mode": vbd.get_mode(),
            "driver": vbd.get_driver(),
            "image": vbd.get_image(),
        })
    })
}

fn create(services: &ApiServices, params: &[Value]) -> ServerResult<Response> {
    let spec: VbdSpec = require_struct(params, 1, "vbd spec")?;
    match services.get_domains().create_vbd(spec) {
        Ok(vbd_ref) => Ok(Response::success(vbd_ref)),
        Err(CoreError::DomainNotFound(_)) => Ok(Response::error(ErrorCode::DomainInvalid)),
        Err(err) => Err(err.into()),
    }
}
