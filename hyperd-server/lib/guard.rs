//! Reusable request guards.
//!
//! A guard is a request-time check that runs before a handler and may
//! short-circuit with an error code; on success the call proceeds with its
//! arguments untouched. The session guard resolves the token in the first
//! positional parameter; the reference guards additionally require the second
//! parameter to be a string naming an entity that exists in the owning
//! registry at check time. Existence may change before the handler body runs;
//! that race is owned by the registries, not closed here.

use hyperd_core::DeviceKind;
use serde_json::Value;

use crate::{envelope::ErrorCode, state::ApiServices};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The request guards a class descriptor can chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// The session token must resolve to a live session.
    Session,
    /// The reference must name the managed host.
    HostRef,
    /// The reference must name a physical CPU of the managed host.
    HostCpuRef,
    /// The reference must name a known virtual machine.
    VmRef,
    /// The reference must name a known virtual block device.
    VbdRef,
    /// The reference must name a known virtual network interface.
    VifRef,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Guard {
    /// Run the check against the call's positional parameters. `Ok(())`
    /// means the wrapped handler may run; `Err` carries the code the
    /// dispatcher shapes into an error envelope.
    pub fn check(&self, services: &ApiServices, params: &[Value]) -> Result<(), ErrorCode> {
        match self {
            Guard::Session => {
                let valid = session_param(params)
                    .is_some_and(|token| services.get_auth().is_valid_session(token));
                if valid {
                    Ok(())
                } else {
                    Err(ErrorCode::SessionInvalid)
                }
            }
            Guard::HostRef => {
                self.check_reference(params, ErrorCode::HostInvalid, |r| {
                    services.get_node().is_valid_host(r)
                })
            }
            Guard::HostCpuRef => {
                self.check_reference(params, ErrorCode::HostCpuInvalid, |r| {
                    services.get_node().is_valid_cpu(r)
                })
            }
            Guard::VmRef => self.check_reference(params, ErrorCode::VmInvalid, |r| {
                services.get_domains().is_valid_vm(r)
            }),
            Guard::VbdRef => self.check_reference(params, ErrorCode::VbdInvalid, |r| {
                services.get_domains().is_valid_device(DeviceKind::Vbd, r)
            }),
            Guard::VifRef => self.check_reference(params, ErrorCode::VifInvalid, |r| {
                services.get_domains().is_valid_device(DeviceKind::Vif, r)
            }),
        }
    }

    fn check_reference(
        &self,
        params: &[Value],
        code: ErrorCode,
        exists: impl FnOnce(&str) -> bool,
    ) -> Result<(), ErrorCode> {
        match reference_param(params) {
            Some(reference) if exists(reference) => Ok(()),
            _ => Err(code),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// The session token parameter, if present and a string.
pub fn session_param(params: &[Value]) -> Option<&str> {
    params.first().and_then(Value::as_str)
}

/// The instance reference parameter, if present and a string.
pub fn reference_param(params: &[Value]) -> Option<&str> {
    params.get(1).and_then(Value::as_str)
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

    #[test]
    fn test_session_guard() {
        let services = services();
        let token = services
            .get_auth()
            .login_with_password("admin", "opensesame")
            .unwrap();

        assert_eq!(
            Guard::Session.check(&services, &[json!(token)]),
            Ok(())
        );
        assert_eq!(
            Guard::Session.check(&services, &[json!("stale-token")]),
            Err(ErrorCode::SessionInvalid)
        );
        // A non-string token is invalid, not a panic.
        assert_eq!(
            Guard::Session.check(&services, &[json!(42)]),
            Err(ErrorCode::SessionInvalid)
        );
        assert_eq!(
            Guard::Session.check(&services, &[]),
            Err(ErrorCode::SessionInvalid)
        );
    }

    #[test]
    fn test_reference_guards_check_the_owning_registry() {
        let services = services();
        let host_ref = services.get_node().get_uuid().clone();
        let vm_ref = services.get_domains().create_domain(DomainSpec {
            name_label: "web".to_string(),
            name_description: String::new(),
            memory_static_min: 128,
            memory_static_max: 256,
            vcpus_number: 1,
        });

        let params = |reference: &str| vec![json!("tok"), json!(reference)];

        assert_eq!(Guard::HostRef.check(&services, &params(&host_ref)), Ok(()));
        assert_eq!(
            Guard::HostRef.check(&services, &params(&vm_ref)),
            Err(ErrorCode::HostInvalid)
        );
        assert_eq!(Guard::VmRef.check(&services, &params(&vm_ref)), Ok(()));
        assert_eq!(
            Guard::VbdRef.check(&services, &params(&vm_ref)),
            Err(ErrorCode::VbdInvalid)
        );

        let cpu_ref = services.get_node().cpu_refs()[0].clone();
        assert_eq!(
            Guard::HostCpuRef.check(&services, &params(&cpu_ref)),
            Ok(())
        );
        assert_eq!(
            Guard::VifRef.check(&services, &params("no-such-vif")),
            Err(ErrorCode::VifInvalid)
        );
    }

    #[test]
    fn test_reference_must_be_a_string() {
        let services = services();
        let host_ref = services.get_node().get_uuid().clone();

        assert_eq!(
            Guard::HostRef.check(&services, &[json!("tok"), json!({"ref": host_ref})]),
            Err(ErrorCode::HostInvalid)
        );
        assert_eq!(
            Guard::HostRef.check(&services, &[json!("tok")]),
            Err(ErrorCode::HostInvalid)
        );
    }
}
