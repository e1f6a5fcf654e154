//! The handler resolver: an explicit registration map from declared
//! operations to implementation functions.
//!
//! Each implemented handler is registered under its `(class, kind, name)`
//! key at startup; the composition engine then resolves every declared
//! operation against this map. Resolution is a pure lookup: a missing key
//! means the operation is skipped at registration time, never a failure.
//! Attribute and method names are declared in mixed case (`VCPUs_number`)
//! but keyed lowercase, mirroring how the canonical operation name keeps
//! the declared casing while resolution does not.

use std::{collections::HashMap, sync::Arc};

use serde_json::Value;

use crate::{descriptor::ApiClass, envelope::Response, error::ServerResult, state::ApiServices};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// What role a handler plays for its class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// Reads an attribute.
    Getter,
    /// Writes an attribute.
    Setter,
    /// An instance method.
    Method,
    /// A class-level function.
    Function,
}

/// A registered implementation function. Handlers receive the injected
/// services and the call's positional parameters and shape their own
/// envelope; a `ServerResult` error escapes the envelope entirely and is
/// surfaced by the transport.
pub type Handler = Arc<dyn Fn(&ApiServices, &[Value]) -> ServerResult<Response> + Send + Sync>;

#[derive(PartialEq, Eq, Hash)]
struct HandlerKey {
    class: ApiClass,
    kind: HandlerKind,
    name: String,
}

/// The set of implemented handler functions, keyed by declared operation.
#[derive(Default)]
pub struct HandlerMap {
    entries: HashMap<HandlerKey, Handler>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl HandlerMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an implementation for a declared operation. Later
    /// registrations under the same key replace earlier ones.
    pub fn insert(
        &mut self,
        class: ApiClass,
        kind: HandlerKind,
        name: &str,
        handler: impl Fn(&ApiServices, &[Value]) -> ServerResult<Response> + Send + Sync + 'static,
    ) {
        self.entries.insert(
            HandlerKey {
                class,
                kind,
                name: name.to_lowercase(),
            },
            Arc::new(handler),
        );
    }

    /// Resolve a declared operation to its implementation, if one was
    /// registered.
    pub fn resolve(&self, class: ApiClass, kind: HandlerKind, name: &str) -> Option<Handler> {
        self.entries
            .get(&HandlerKey {
                class,
                kind,
                name: name.to_lowercase(),
            })
            .cloned()
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_is_case_insensitive_on_names() {
        let mut map = HandlerMap::new();
        map.insert(
            ApiClass::Vm,
            HandlerKind::Getter,
            "VCPUs_number",
            |_, _| Ok(Response::success(2)),
        );

        assert!(map
            .resolve(ApiClass::Vm, HandlerKind::Getter, "vcpus_number")
            .is_some());
        assert!(map
            .resolve(ApiClass::Vm, HandlerKind::Getter, "VCPUs_number")
            .is_some());
        // Kind and class are part of the key.
        assert!(map
            .resolve(ApiClass::Vm, HandlerKind::Setter, "VCPUs_number")
            .is_none());
        assert!(map
            .resolve(ApiClass::Host, HandlerKind::Getter, "VCPUs_number")
            .is_none());
    }
}
