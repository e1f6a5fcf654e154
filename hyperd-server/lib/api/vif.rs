//! Virtual network interface handlers.
//!
//! Only creation is implemented; the declared bandwidth counters and
//! per-field getters wait on a network statistics source, so those
//! operations are simply absent from the dispatch table.

use hyperd_core::{CoreError, VifSpec};
use serde_json::Value;

use crate::{
    api::require_struct,
    descriptor::ApiClass,
    envelope::{ErrorCode, Response},
    error::ServerResult,
    resolver::{HandlerKind, HandlerMap},
    state::ApiServices,
};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Register the VIF handlers.
pub fn register(map: &mut HandlerMap) {
    map.insert(ApiClass::Vif, HandlerKind::Function, "create", create);
}

fn create(services: &ApiServices, params: &[Value]) -> ServerResult<Response> {
    let spec: VifSpec = require_struct(params, 1, "vif spec")?;
    match services.get_domains().create_vif(spec) {
        Ok(vif_ref) => Ok(Response::success(vif_ref)),
        Err(CoreError::DomainNotFound(_)) => Ok(Response::error(ErrorCode::DomainInvalid)),
        Err(err) => Err(err.into()),
    }
}
