//! The composition engine and the published dispatch table.
//!
//! A one-time startup pass walks every class descriptor, resolves each
//! declared operation against the handler map, snapshots the class's guard
//! chain next to the resolved handler, and inserts the pair under its
//! canonical `"Class.operation"` name. Operations whose handler cannot be
//! resolved are logged and skipped; the pass never fails. The result is an
//! immutable table, shared behind `Arc`, dispatching arbitrarily many
//! concurrent requests without synchronization.
//!
//! Two identity shortcuts are installed unguarded for every class before
//! anything else: `get_by_uuid` and `get_uuid` return the reference argument
//! unchanged, since a reference equals the entity uuid by construction.
//! Nothing later overwrites an existing name.

use std::collections::HashMap;

use serde_json::Value;

use crate::{
    api,
    descriptor::{descriptors, ApiClass, BASE_ATTR_RO, BASE_ATTR_RW, BASE_FUNCS, BASE_METHODS},
    envelope::Response,
    error::{ServerError, ServerResult},
    guard::Guard,
    resolver::{Handler, HandlerKind, HandlerMap},
    state::ApiServices,
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Guard chain for class functions: no instance exists yet, so only the
/// session check applies.
const SESSION_ONLY: &[Guard] = &[Guard::Session];

/// Guard chain for the identity shortcuts and for login.
const UNGUARDED: &[Guard] = &[];

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// One named, guarded operation in the dispatch table.
pub struct Operation {
    name: String,
    guards: &'static [Guard],
    handler: Handler,
}

impl Operation {
    /// Canonical `"Class.operation"` name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The guard chain snapshot this operation was built with, in the
    /// declared fold order.
    pub fn guards(&self) -> &'static [Guard] {
        self.guards
    }
}

/// The immutable mapping from canonical operation name to guarded handler.
pub struct DispatchTable {
    services: ApiServices,
    operations: HashMap<String, Operation>,
}

/// Builds the dispatch table once, single-threaded, before publication.
pub struct DispatchTableBuilder {
    services: ApiServices,
    handlers: HandlerMap,
    operations: HashMap<String, Operation>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl DispatchTable {
    /// Run the named operation: guards outer-to-inner, then the handler.
    /// Guard rejections are shaped into the envelope; an unknown name is a
    /// transport-level error.
    pub fn dispatch(&self, method: &str, params: &[Value]) -> ServerResult<Response> {
        let operation = self
            .operations
            .get(method)
            .ok_or_else(|| ServerError::UnknownMethod(method.to_string()))?;

        // The chain is declared in fold order, so the last-listed guard is
        // the outermost check; walk it back to front.
        for guard in operation.guards.iter().rev() {
            if let Err(code) = guard.check(&self.services, params) {
                tracing::debug!("{}: rejected by guard ({})", method, code.code());
                return Ok(Response::error(code));
            }
        }

        (operation.handler)(&self.services, params)
    }

    /// Whether an operation with this canonical name was registered.
    pub fn contains(&self, method: &str) -> bool {
        self.operations.contains_key(method)
    }

    /// Look up a registered operation.
    pub fn get(&self, method: &str) -> Option<&Operation> {
        self.operations.get(method)
    }

    /// Canonical names of every registered operation.
    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    /// Number of registered operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl DispatchTableBuilder {
    /// Create a builder over the full set of implemented handlers.
    pub fn new(services: ApiServices) -> Self {
        let mut handlers = HandlerMap::new();
        api::register_all(&mut handlers);
        Self::with_handlers(services, handlers)
    }

    /// Create a builder over an explicit handler map. Used by tests to
    /// exercise the composition pass in isolation.
    pub fn with_handlers(services: ApiServices, handlers: HandlerMap) -> Self {
        Self {
            services,
            handlers,
            operations: HashMap::new(),
        }
    }

    /// Run the composition pass and publish the table.
    pub fn build(mut self) -> DispatchTable {
        for descriptor in descriptors() {
            self.install_identity_shortcuts(descriptor.class);
        }

        for descriptor in descriptors() {
            let class = descriptor.class;
            let class_name = class.as_str();

            // Readable attributes: the class's own read-only and read-write
            // lists plus the base read-only ones.
            for attr in descriptor
                .attr_ro
                .iter()
                .chain(descriptor.attr_rw)
                .chain(BASE_ATTR_RO)
            {
                self.install(
                    class,
                    HandlerKind::Getter,
                    attr,
                    format!("{}.get_{}", class_name, attr),
                    descriptor.guards,
                );
            }

            for attr in descriptor.attr_rw.iter().chain(BASE_ATTR_RW) {
                self.install(
                    class,
                    HandlerKind::Setter,
                    attr,
                    format!("{}.set_{}", class_name, attr),
                    descriptor.guards,
                );
            }

            for method in descriptor.methods.iter().chain(BASE_METHODS) {
                self.install(
                    class,
                    HandlerKind::Method,
                    method,
                    format!("{}.{}", class_name, method),
                    descriptor.guards,
                );
            }

            // Class functions get only the session guard; no instance
            // reference exists to validate.
            for func in descriptor.funcs.iter().chain(BASE_FUNCS) {
                self.install(
                    class,
                    HandlerKind::Function,
                    func,
                    format!("{}.{}", class_name, func),
                    SESSION_ONLY,
                );
            }
        }

        // Login is the one operation that cannot require a session.
        self.install(
            ApiClass::Session,
            HandlerKind::Function,
            "login_with_password",
            "Session.login_with_password".to_string(),
            UNGUARDED,
        );

        DispatchTable {
            services: self.services,
            operations: self.operations,
        }
    }

    /// Install the unguarded `get_by_uuid`/`get_uuid` shortcuts for a
    /// class: a reference equals the entity uuid, so both return the
    /// reference argument unchanged.
    fn install_identity_shortcuts(&mut self, class: ApiClass) {
        for operation in ["get_by_uuid", "get_uuid"] {
            let name = format!("{}.{}", class.as_str(), operation);
            self.operations.insert(
                name.clone(),
                Operation {
                    name,
                    guards: UNGUARDED,
                    handler: std::sync::Arc::new(|_, params: &[Value]| {
                        Ok(Response::success(
                            params.get(1).cloned().unwrap_or_default(),
                        ))
                    }),
                },
            );
        }
    }

    fn install(
        &mut self,
        class: ApiClass,
        kind: HandlerKind,
        declared_name: &str,
        canonical_name: String,
        guards: &'static [Guard],
    ) {
        if self.operations.contains_key(&canonical_name) {
            tracing::debug!("API call {} already registered; keeping it", canonical_name);
            return;
        }

        match self.handlers.resolve(class, kind, declared_name) {
            Some(handler) => {
                self.operations.insert(
                    canonical_name.clone(),
                    Operation {
                        name: canonical_name,
                        guards,
                        handler,
                    },
                );
            }
            None => {
                tracing::warn!("API call {} not found", canonical_name);
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hyperd_core::{AuthManager, DomainRegistry, DomainSpec, NodeRegistry};
    use serde_json::json;

    use super::*;

    fn services() -> ApiServices {
        let auth = AuthManager::new([("admin".to_string(), "opensesame".to_string())]);
        ApiServices::new(
            Arc::new(NodeRegistry::new("node0", "test host", 2)),
            Arc::new(DomainRegistry::new()),
            Arc::new(auth),
        )
    }

    fn table() -> (DispatchTable, ApiServices) {
        let services = services();
        let table = DispatchTableBuilder::new(services.clone()).build();
        (table, services)
    }

    fn login(services: &ApiServices) -> String {
        services
            .get_auth()
            .login_with_password("admin", "opensesame")
            .unwrap()
    }

    fn create_vm(services: &ApiServices, label: &str) -> String {
        services.get_domains().create_domain(DomainSpec {
            name_label: label.to_string(),
            name_description: String::new(),
            memory_static_min: 128,
            memory_static_max: 256,
            vcpus_number: 1,
        })
    }

    #[test]
    fn test_declared_operations_present_iff_implemented() {
        let (table, _services) = table();

        // Declared and implemented.
        for name in [
            "Session.login_with_password",
            "Session.logout",
            "Session.get_this_user",
            "Host.get_name_label",
            "Host.set_name_label",
            "Host.enable",
            "Host.get_all",
            "Host_CPU.get_number",
            "VM.start",
            "VM.get_power_state",
            "VM.get_VCPUs_number",
            "VM.set_VCPUs_params",
            "VM.create",
            "VM.get_by_label",
            "VBD.create",
            "VBD.get_device",
            "VIF.create",
        ] {
            assert!(table.contains(name), "{} should be registered", name);
        }

        // Declared but never implemented: skipped, not fatal.
        for name in [
            "Host.get_by_label",
            "Host.to_xml",
            "Network.get_VIFs",
            "Network.set_name_label",
            "VBD.get_image",
            "VIF.get_network_read_kbs",
            "Session.create",
        ] {
            assert!(!table.contains(name), "{} should be absent", name);
        }
    }

    #[test]
    fn test_identity_shortcuts_for_every_class() {
        let (table, _services) = table();

        for descriptor in descriptors() {
            let class = descriptor.class.as_str();
            for operation in ["get_by_uuid", "get_uuid"] {
                let method = format!("{}.{}", class, operation);
                let op = table.get(&method).unwrap_or_else(|| {
                    panic!("{} missing", method)
                });
                assert!(op.guards().is_empty(), "{} must be unguarded", method);

                // No session, no existence check: the reference comes back
                // unchanged regardless.
                let response = table
                    .dispatch(&method, &[json!("bogus-session"), json!("some-ref")])
                    .unwrap();
                assert_eq!(response, Response::success("some-ref"));
            }
        }
    }

    #[test]
    fn test_guard_chain_runs_outermost_first() {
        let (table, _services) = table();

        // Both the session and the reference are invalid; the session guard
        // is last in the declared chain, hence outermost, so its error wins.
        let response = table
            .dispatch(
                "VM.get_power_state",
                &[json!("stale-token"), json!("no-such-vm")],
            )
            .unwrap();
        assert_eq!(response.error_code(), Some("SESSION_INVALID"));
    }

    #[test]
    fn test_reference_guard_runs_after_session_guard() {
        let (table, services) = table();
        let token = login(&services);

        let response = table
            .dispatch("VM.get_power_state", &[json!(token), json!("no-such-vm")])
            .unwrap();
        assert_eq!(response.error_code(), Some("VM_INVALID"));
    }

    #[test]
    fn test_class_functions_skip_reference_guards() {
        let (table, services) = table();
        let token = login(&services);

        // No reference argument at all; only the session guard applies.
        let response = table.dispatch("VM.get_all", &[json!(token)]).unwrap();
        assert!(response.is_success());
    }

    #[test]
    fn test_unknown_method_is_a_transport_error() {
        let (table, _services) = table();
        let err = table.dispatch("VM.levitate", &[]).unwrap_err();
        assert!(matches!(err, ServerError::UnknownMethod(_)));
    }

    #[test]
    fn test_skipped_operations_do_not_block_the_rest_of_the_pass() {
        let (table, _services) = table();
        // Host.get_by_label resolves to nothing, yet later registrations
        // (base functions of the same class) still landed.
        assert!(!table.contains("Host.get_by_label"));
        assert!(table.contains("Host.get_all"));
    }

    #[tokio::test]
    async fn test_concurrent_dispatch_on_a_shared_table() {
        let (table, services) = table();
        let token = login(&services);
        let vm_ref = create_vm(&services, "web");
        services.get_domains().start(&vm_ref).unwrap();

        let table = Arc::new(table);
        let mut handles = Vec::new();
        for _ in 0..2 {
            let table = Arc::clone(&table);
            let params = vec![json!(token.clone()), json!(vm_ref.clone())];
            handles.push(tokio::spawn(async move {
                table.dispatch("VM.pause", &params)
            }));
        }

        // Both calls must come back; exactly one pause can win, and the
        // loser's outcome is owned by the registry, not the dispatcher.
        let mut successes = 0;
        for handle in handles {
            if let Ok(response) = handle.await.unwrap() {
                if response.is_success() {
                    successes += 1;
                }
            }
        }
        assert_eq!(successes, 1);
    }

    #[test]
    fn test_missing_handlers_never_fail_the_build() {
        // An empty handler map composes to a table holding only the
        // identity shortcuts.
        let services = services();
        let table =
            DispatchTableBuilder::with_handlers(services, HandlerMap::new()).build();
        assert_eq!(table.len(), descriptors().len() * 2);
        for name in table.operation_names() {
            assert!(name.ends_with("get_by_uuid") || name.ends_with("get_uuid"));
        }
    }

    #[test]
    fn test_guard_rejection_short_circuits_the_handler() {
        let services = services();
        let mut handlers = HandlerMap::new();
        handlers.insert(ApiClass::Vm, HandlerKind::Method, "start", |_, _| {
            panic!("handler must not run after a guard rejection")
        });
        let table = DispatchTableBuilder::with_handlers(services, handlers).build();

        let response = table
            .dispatch("VM.start", &[json!("bad-token"), json!("bad-ref")])
            .unwrap();
        assert_eq!(response.error_code(), Some("SESSION_INVALID"));
    }
}
