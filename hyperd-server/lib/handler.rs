//! Request handlers for the hyperd server.
//!
//! This module implements:
//! - The JSON-RPC endpoint that fronts the dispatch table
//! - The health check endpoint
//!
//! The JSON-RPC handler is deliberately thin: framing validation happens
//! here, everything else (guards, handler bodies, the envelope) lives behind
//! [`DispatchTable::dispatch`].

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::Value;

use crate::{
    error::{ServerError, ServerResult},
    payload::{JsonRpcRequest, JsonRpcResponse, RegularMessageResponse},
    state::AppState,
    DispatchTable,
};

//--------------------------------------------------------------------------------------------------
// Functions: REST API Handlers
//--------------------------------------------------------------------------------------------------

/// Handler for health check.
pub async fn health() -> ServerResult<impl IntoResponse> {
    Ok((
        StatusCode::OK,
        Json(RegularMessageResponse {
            message: "Service is healthy".to_string(),
        }),
    ))
}

//--------------------------------------------------------------------------------------------------
// Functions: JSON-RPC Handlers
//--------------------------------------------------------------------------------------------------

/// Main JSON-RPC handler; every API operation arrives here by name.
pub async fn json_rpc_handler(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> ServerResult<impl IntoResponse> {
    let response = rpc_call(state.get_dispatch(), payload)?;
    Ok((StatusCode::OK, Json(response)))
}

/// Validate the JSON-RPC framing and run the named operation.
pub fn rpc_call(dispatch: &DispatchTable, payload: Value) -> ServerResult<JsonRpcResponse> {
    if payload.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return Err(ServerError::ValidationError(
            "Invalid or missing jsonrpc version field".to_string(),
        ));
    }

    let request: JsonRpcRequest = serde_json::from_value(payload)
        .map_err(|e| ServerError::ValidationError(format!("Invalid JSON-RPC request: {}", e)))?;

    tracing::debug!("rpc: {} ({} params)", request.method, request.params.len());
    let envelope = dispatch.dispatch(&request.method, &request.params)?;

    Ok(JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        result: serde_json::to_value(envelope)
            .map_err(|e| ServerError::InternalError(format!("JSON serialization error: {}", e)))?,
        id: request.id,
    })
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hyperd_core::{AuthManager, DomainRegistry, NodeRegistry};
    use serde_json::json;

    use super::*;
    use crate::{dispatch::DispatchTableBuilder, state::ApiServices};

    fn dispatch() -> (DispatchTable, ApiServices) {
        let auth = AuthManager::new([("admin".to_string(), "opensesame".to_string())]);
        let services = ApiServices::new(
            Arc::new(NodeRegistry::new("node0", "test host", 1)),
            Arc::new(DomainRegistry::new()),
            Arc::new(auth),
        );
        (
            DispatchTableBuilder::new(services.clone()).build(),
            services,
        )
    }

    #[test]
    fn test_rpc_call_round_trip() {
        let (dispatch, _services) = dispatch();

        let response = rpc_call(
            &dispatch,
            json!({
                "jsonrpc": "2.0",
                "method": "Session.login_with_password",
                "params": ["admin", "opensesame"],
                "id": 7,
            }),
        )
        .unwrap();

        assert_eq!(response.id, Some(7));
        assert_eq!(response.result["Status"], "Success");
        assert!(response.result["Value"].is_string());
    }

    #[test]
    fn test_rpc_call_requires_version() {
        let (dispatch, _services) = dispatch();

        let err = rpc_call(
            &dispatch,
            json!({"method": "Host.get_all", "params": []}),
        )
        .unwrap_err();
        assert!(matches!(err, ServerError::ValidationError(_)));
    }

    #[test]
    fn test_rpc_call_unknown_method() {
        let (dispatch, _services) = dispatch();

        let err = rpc_call(
            &dispatch,
            json!({
                "jsonrpc": "2.0",
                "method": "Host.levitate",
                "params": [],
            }),
        )
        .unwrap_err();
        assert!(matches!(err, ServerError::UnknownMethod(_)));
    }

    #[test]
    fn test_rpc_call_defaults_missing_params_to_empty() {
        let (dispatch, _services) = dispatch();

        // No params at all: the session guard still runs and rejects.
        let response = rpc_call(
            &dispatch,
            json!({"jsonrpc": "2.0", "method": "Host.get_all"}),
        )
        .unwrap();
        assert_eq!(
            response.result["ErrorDescription"][0],
            "SESSION_INVALID"
        );
    }
}
