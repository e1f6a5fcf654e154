//! Router configuration for the hyperd server.
//!
//! This module handles:
//! - API route definitions
//! - Router configuration and setup
//!
//! The whole management API is one JSON-RPC endpoint; operations are
//! addressed by name inside the request body, not by URL.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handler, middleware as app_middleware, state::AppState};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Create a new router with the given state.
pub fn create_router(state: AppState) -> Router {
    let rest_api = Router::new().route("/health", get(handler::health));

    let rpc_api = Router::new().route("/rpc", post(handler::json_rpc_handler));

    Router::new()
        .nest("/api/v1", rest_api.merge(rpc_api))
        .layer(middleware::from_fn(app_middleware::logging_middleware))
        .with_state(state)
}
