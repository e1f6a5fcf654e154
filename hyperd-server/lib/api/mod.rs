//! Per-class operation handlers.
//!
//! Each submodule registers the implemented handlers for one resource class
//! into the resolver's map; [`register_all`] is the single entry point the
//! composition engine uses. Handlers assume their guard chain has already
//! run but never rely on it: a reference that disappears between guard check
//! and handler body is answered with the class's `*_INVALID` error, not a
//! panic.

mod host;
mod host_cpu;
mod session;
mod vbd;
mod vif;
mod vm;

use serde_json::Value;

use crate::{
    error::{ServerError, ServerResult},
    resolver::HandlerMap,
};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Register every implemented handler.
pub fn register_all(map: &mut HandlerMap) {
    session::register(map);
    host::register(map);
    host_cpu::register(map);
    vm::register(map);
    vbd::register(map);
    vif::register(map);
}

/// A required string parameter, by position.
pub(crate) fn require_str<'a>(
    params: &'a [Value],
    index: usize,
    what: &str,
) -> ServerResult<&'a str> {
    params
        .get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| ServerError::ValidationError(format!("missing {} parameter", what)))
}

/// A required structured parameter, by position, deserialized into the
/// target spec type.
pub(crate) fn require_struct<T: serde::de::DeserializeOwned>(
    params: &[Value],
    index: usize,
    what: &str,
) -> ServerResult<T> {
    let value = params
        .get(index)
        .ok_or_else(|| ServerError::ValidationError(format!("missing {} parameter", what)))?;
    serde_json::from_value(value.clone())
        .map_err(|e| ServerError::ValidationError(format!("invalid {}: {}", what, e)))
}
