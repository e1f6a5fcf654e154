//! End-to-end tests driving the published dispatch table the way the
//! transport does: canonical operation names, positional parameters, and
//! envelope assertions on the way back out.

use std::sync::Arc;

use hyperd_core::{AuthManager, DomainRegistry, NodeRegistry};
use serde_json::{json, Value};

use crate::{
    dispatch::{DispatchTable, DispatchTableBuilder},
    envelope::Response,
    state::ApiServices,
};

fn table() -> (DispatchTable, ApiServices) {
    let auth = AuthManager::new([("admin".to_string(), "opensesame".to_string())]);
    let services = ApiServices::new(
        Arc::new(NodeRegistry::new("node0", "test host", 4)),
        Arc::new(DomainRegistry::new()),
        Arc::new(auth),
    );
    let table = DispatchTableBuilder::new(services.clone()).build();
    (table, services)
}

fn login(table: &DispatchTable) -> String {
    let response = table
        .dispatch(
            "Session.login_with_password",
            &[json!("admin"), json!("opensesame")],
        )
        .unwrap();
    match response {
        Response::Success { value } => value.as_str().unwrap().to_string(),
        Response::Error { error_description } => panic!("login failed: {:?}", error_description),
    }
}

fn value_of(response: Response) -> Value {
    match response {
        Response::Success { value } => value,
        Response::Error { error_description } => {
            panic!("expected success, got {:?}", error_description)
        }
    }
}

#[test]
fn test_session_round_trip() {
    let (table, services) = table();
    let token = login(&table);

    let user = table
        .dispatch("Session.get_this_user", &[json!(token)])
        .unwrap();
    assert_eq!(value_of(user), json!("admin"));

    let host = table
        .dispatch("Session.get_this_host", &[json!(token)])
        .unwrap();
    assert_eq!(value_of(host), json!(services.get_node().get_uuid()));

    let logout = table.dispatch("Session.logout", &[json!(token)]).unwrap();
    assert_eq!(logout, Response::success_void());

    // The token is dead now; the session guard rejects it.
    let rejected = table
        .dispatch("Session.get_this_user", &[json!(token)])
        .unwrap();
    assert_eq!(rejected.error_code(), Some("SESSION_INVALID"));

    // Logging out twice is a harmless no-op.
    let logout = table.dispatch("Session.logout", &[json!(token)]).unwrap();
    assert_eq!(logout, Response::success_void());
}

#[test]
fn test_login_with_bad_password() {
    let (table, _services) = table();

    let response = table
        .dispatch(
            "Session.login_with_password",
            &[json!("admin"), json!("guess")],
        )
        .unwrap();
    assert_eq!(response.error_code(), Some("AUTHENTICATION_FAILED"));
}

#[test]
fn test_host_surface() {
    let (table, services) = table();
    let token = login(&table);
    let host_ref = services.get_node().get_uuid().clone();

    let all = table.dispatch("Host.get_all", &[json!(token)]).unwrap();
    assert_eq!(value_of(all), json!([host_ref]));

    let label = table
        .dispatch("Host.get_name_label", &[json!(token), json!(host_ref)])
        .unwrap();
    assert_eq!(value_of(label), json!("node0"));

    let cpus = table
        .dispatch("Host.get_host_CPUs", &[json!(token), json!(host_ref)])
        .unwrap();
    assert_eq!(value_of(cpus).as_array().unwrap().len(), 4);

    // A bogus reference is caught by the reference guard, not the handler.
    let rejected = table
        .dispatch("Host.get_name_label", &[json!(token), json!("nope")])
        .unwrap();
    assert_eq!(rejected.error_code(), Some("HOST_INVALID"));
}

#[test]
fn test_host_cpu_getters() {
    let (table, services) = table();
    let token = login(&table);
    let cpu_ref = services.get_node().cpu_refs().remove(0);
    let host_ref = services.get_node().get_uuid().clone();

    let host = table
        .dispatch("Host_CPU.get_host", &[json!(token), json!(cpu_ref)])
        .unwrap();
    assert_eq!(value_of(host), json!(host_ref));

    let number = table
        .dispatch("Host_CPU.get_number", &[json!(token), json!(cpu_ref)])
        .unwrap();
    assert_eq!(value_of(number), json!(0));
}

#[test]
fn test_host_reboot_requires_disable_first() {
    let (table, services) = table();
    let token = login(&table);
    let host_ref = services.get_node().get_uuid().clone();

    let rejected = table
        .dispatch("Host.reboot", &[json!(token), json!(host_ref)])
        .unwrap();
    assert_eq!(rejected.error_code(), Some("HOST_RUNNING"));

    let disabled = table
        .dispatch("Host.disable", &[json!(token), json!(host_ref)])
        .unwrap();
    assert!(disabled.is_success());

    // Disabled host: the operation is reachable but has no backend.
    let response = table
        .dispatch("Host.reboot", &[json!(token), json!(host_ref)])
        .unwrap();
    assert_eq!(response.error_code(), Some("UNSUPPORTED"));
}

#[test]
fn test_vm_create_and_lifecycle() {
    let (table, _services) = table();
    let token = login(&table);

    let vm_ref = value_of(
        table
            .dispatch(
                "VM.create",
                &[
                    json!(token),
                    json!({
                        "name_label": "web",
                        "name_description": "front end",
                        "memory_static_min": 128,
                        "memory_static_max": 512,
                        "vcpus_number": 2,
                    }),
                ],
            )
            .unwrap(),
    );
    let vm_ref = vm_ref.as_str().unwrap().to_string();

    let state = table
        .dispatch("VM.get_power_state", &[json!(token), json!(vm_ref)])
        .unwrap();
    assert_eq!(value_of(state), json!("Halted"));

    assert!(table
        .dispatch("VM.start", &[json!(token), json!(vm_ref)])
        .unwrap()
        .is_success());
    assert!(table
        .dispatch("VM.pause", &[json!(token), json!(vm_ref)])
        .unwrap()
        .is_success());
    assert!(table
        .dispatch("VM.unpause", &[json!(token), json!(vm_ref)])
        .unwrap()
        .is_success());

    let state = table
        .dispatch("VM.get_power_state", &[json!(token), json!(vm_ref)])
        .unwrap();
    assert_eq!(value_of(state), json!("Running"));

    let found = table
        .dispatch("VM.get_by_label", &[json!(token), json!("web")])
        .unwrap();
    assert_eq!(value_of(found), json!(vm_ref));

    // Destroy removes the record; the guard then rejects the reference.
    assert!(table
        .dispatch("VM.destroy", &[json!(token), json!(vm_ref)])
        .unwrap()
        .is_success());
    let rejected = table
        .dispatch("VM.get_power_state", &[json!(token), json!(vm_ref)])
        .unwrap();
    assert_eq!(rejected.error_code(), Some("VM_INVALID"));
}

#[test]
fn test_vm_illegal_transition_escapes_the_envelope() {
    let (table, services) = table();
    let token = login(&table);
    let vm_ref = services.get_domains().create_domain(hyperd_core::DomainSpec {
        name_label: "web".to_string(),
        name_description: String::new(),
        memory_static_min: 128,
        memory_static_max: 256,
        vcpus_number: 1,
    });

    // Pausing a halted domain is a collaborator error the handler does not
    // translate; it surfaces as a transport failure, not an envelope.
    let err = table
        .dispatch("VM.pause", &[json!(token), json!(vm_ref)])
        .unwrap_err();
    assert!(err.to_string().contains("pause"));
}

#[test]
fn test_vm_declared_but_unbacked_attributes() {
    let (table, _services) = table();
    let token = login(&table);
    let vm_ref = value_of(
        table
            .dispatch("VM.create", &[json!(token), json!({"name_label": "web"})])
            .unwrap(),
    );

    let todo = table
        .dispatch("VM.get_memory_actual", &[json!(token), vm_ref.clone()])
        .unwrap();
    assert_eq!(todo.error_code(), Some("TODO"));

    let empty = table
        .dispatch("VM.get_kernel_kernel", &[json!(token), vm_ref.clone()])
        .unwrap();
    assert_eq!(value_of(empty), json!(""));

    // Writable attributes accept the write and ignore it.
    let set = table
        .dispatch(
            "VM.set_name_label",
            &[json!(token), vm_ref.clone(), json!("renamed")],
        )
        .unwrap();
    assert_eq!(set, Response::success_void());
    let label = table
        .dispatch("VM.get_name_label", &[json!(token), vm_ref])
        .unwrap();
    assert_eq!(value_of(label), json!("web"));
}

#[test]
fn test_vm_record_reflects_devices() {
    let (table, services) = table();
    let token = login(&table);
    let vm_ref = value_of(
        table
            .dispatch("VM.create", &[json!(token), json!({"name_label": "web"})])
            .unwrap(),
    );
    let vm_ref = vm_ref.as_str().unwrap().to_string();

    let vbd_ref = value_of(
        table
            .dispatch(
                "VBD.create",
                &[
                    json!(token),
                    json!({
                        "VM": vm_ref,
                        "device": "xvda",
                        "mode": "RW",
                        "driver": "paravirtualised",
                    }),
                ],
            )
            .unwrap(),
    );
    let vif_ref = value_of(
        table
            .dispatch(
                "VIF.create",
                &[json!(token), json!({"VM": vm_ref, "name": "eth0"})],
            )
            .unwrap(),
    );

    let record = value_of(
        table
            .dispatch("VM.get_record", &[json!(token), json!(vm_ref)])
            .unwrap(),
    );
    assert_eq!(record["uuid"], json!(vm_ref));
    assert_eq!(record["power_state"], json!("Halted"));
    assert_eq!(record["VBDs"], json!([vbd_ref]));
    assert_eq!(record["VIFs"], json!([vif_ref]));
    assert_eq!(record["resident_on"], json!(services.get_node().get_uuid()));
}

#[test]
fn test_vbd_surface() {
    let (table, _services) = table();
    let token = login(&table);
    let vm_ref = value_of(
        table
            .dispatch("VM.create", &[json!(token), json!({"name_label": "web"})])
            .unwrap(),
    );

    let vbd_ref = value_of(
        table
            .dispatch(
                "VBD.create",
                &[
                    json!(token),
                    json!({
                        "VM": vm_ref,
                        "device": "xvda",
                        "mode": "RW",
                        "driver": "paravirtualised",
                    }),
                ],
            )
            .unwrap(),
    );

    let device = table
        .dispatch("VBD.get_device", &[json!(token), vbd_ref.clone()])
        .unwrap();
    assert_eq!(value_of(device), json!("xvda"));

    let vm = table
        .dispatch("VBD.get_VM", &[json!(token), vbd_ref.clone()])
        .unwrap();
    assert_eq!(value_of(vm), vm_ref);

    let vdi = table
        .dispatch("VBD.get_VDI", &[json!(token), vbd_ref])
        .unwrap();
    assert_eq!(vdi.error_code(), Some("UNSUPPORTED"));

    // Creating against a missing domain reports the bad owner reference.
    let rejected = table
        .dispatch(
            "VBD.create",
            &[
                json!(token),
                json!({"VM": "missing", "device": "xvdb", "mode": "RO", "driver": "tap"}),
            ],
        )
        .unwrap();
    assert_eq!(rejected.error_code(), Some("DOMAIN_INVALID"));
}

#[test]
fn test_identity_shortcuts_skip_all_guards() {
    let (table, _services) = table();

    // No login ever happened; the shortcut still answers.
    let response = table
        .dispatch("VM.get_by_uuid", &[json!("no-session"), json!("some-ref")])
        .unwrap();
    assert_eq!(value_of(response), json!("some-ref"));

    let response = table
        .dispatch("Host_CPU.get_uuid", &[json!("no-session"), json!("cpu-ref")])
        .unwrap();
    assert_eq!(value_of(response), json!("cpu-ref"));
}
