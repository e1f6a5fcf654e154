//! Session lifecycle handlers.
//!
//! Login is the only operation reachable without a session; everything else
//! in this module takes the caller's own token as its first parameter. Note
//! the two distinct invalid-session outcomes: the guard rejects a token the
//! session store does not know at all, while `get_this_user` answers
//! `SESSION_INVALID` itself when a guarded call races a logout and the token
//! no longer binds a user.

use hyperd_core::CoreError;
use serde_json::json;

use crate::{
    api::require_str,
    descriptor::ApiClass,
    envelope::{ErrorCode, Response},
    error::ServerResult,
    guard::session_param,
    resolver::{HandlerKind, HandlerMap},
    state::ApiServices,
};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Register the Session handlers.
pub fn register(map: &mut HandlerMap) {
    map.insert(
        ApiClass::Session,
        HandlerKind::Function,
        "login_with_password",
        login_with_password,
    );
    map.insert(ApiClass::Session, HandlerKind::Method, "logout", logout);
    map.insert(ApiClass::Session, HandlerKind::Method, "destroy", |_, _| {
        // Sessions end through logout; destroy stays unsupported by policy.
        Ok(Response::error(ErrorCode::Unsupported))
    });
    map.insert(
        ApiClass::Session,
        HandlerKind::Method,
        "get_record",
        get_record,
    );
    map.insert(ApiClass::Session, HandlerKind::Method, "to_xml", |_, _| {
        Ok(Response::todo())
    });
    map.insert(
        ApiClass::Session,
        HandlerKind::Getter,
        "this_host",
        |services, _| Ok(Response::success(services.get_node().get_uuid().clone())),
    );
    map.insert(
        ApiClass::Session,
        HandlerKind::Getter,
        "this_user",
        get_this_user,
    );
}

fn login_with_password(
    services: &ApiServices,
    params: &[serde_json::Value],
) -> ServerResult<Response> {
    let username = require_str(params, 0, "username")?;
    let password = require_str(params, 1, "password")?;

    match services.get_auth().login_with_password(username, password) {
        Ok(token) => Ok(Response::success(token)),
        Err(CoreError::AuthenticationFailed(_)) => {
            Ok(Response::error(ErrorCode::AuthenticationFailed))
        }
        Err(err) => Err(err.into()),
    }
}

fn logout(services: &ApiServices, params: &[serde_json::Value]) -> ServerResult<Response> {
    if let Some(token) = session_param(params) {
        services.get_auth().logout(token);
    }
    Ok(Response::success_void())
}

fn get_record(services: &ApiServices, params: &[serde_json::Value]) -> ServerResult<Response> {
    let user = session_param(params).and_then(|token| services.get_auth().get_user(token));
    Ok(Response::success(json!({
        "this_host": services.get_node().get_uuid(),
        "this_user": user,
    })))
}

fn get_this_user(services: &ApiServices, params: &[serde_json::Value]) -> ServerResult<Response> {
    match session_param(params).and_then(|token| services.get_auth().get_user(token)) {
        Some(user) => Ok(Response::success(user)),
        None => Ok(Response::error(ErrorCode::SessionInvalid)),
    }
}
