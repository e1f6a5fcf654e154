//! Error handling for the hyperd server.
//!
//! This module distinguishes transport-level failures from API-level ones.
//! API-level failures (a bad reference, an invalid session) are shaped into
//! the response envelope by the dispatch layer and never appear here.
//! `ServerError` covers everything the envelope cannot express: malformed
//! requests, unknown operation names, configuration mistakes, and
//! collaborator errors a handler chose not to translate.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response as AxumResponse},
    Json,
};
use hyperd_core::CoreError;
use serde_json::json;
use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Result type for hyperd server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that escape the response envelope.
#[derive(pretty_error_debug::Debug, Error)]
pub enum ServerError {
    /// Server configuration is unusable.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// The request body did not satisfy the wire contract.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// No operation with the given canonical name exists in the
    /// dispatch table.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// A collaborator failed in a way the handler did not translate
    /// into an envelope error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Catch-all for internal failures.
    #[error("internal error: {0}")]
    InternalError(String),
}

//--------------------------------------------------------------------------------------------------
// Implementations
//--------------------------------------------------------------------------------------------------

impl IntoResponse for ServerError {
    fn into_response(self) -> AxumResponse {
        let status = match &self {
            ServerError::ValidationError(_) | ServerError::UnknownMethod(_) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::ConfigError(_)
            | ServerError::Core(_)
            | ServerError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
