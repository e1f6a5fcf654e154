//! Request and response payload definitions for the hyperd server.
//!
//! This module defines the data structures for:
//! - JSON-RPC request/response framing around API operations
//! - Plain REST responses for the health endpoint
//!
//! The API itself speaks the envelope defined in [`crate::envelope`]; the
//! JSON-RPC `result` field always carries one of its two shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

//--------------------------------------------------------------------------------------------------
// Types: JSON-RPC Payloads
//--------------------------------------------------------------------------------------------------

/// Generic JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version; must be "2.0".
    pub jsonrpc: String,

    /// Canonical operation name, e.g. `VM.start`.
    pub method: String,

    /// Positional parameters. The first is the session token for every
    /// operation except login; instance operations take the reference
    /// second.
    #[serde(default)]
    pub params: Vec<Value>,

    /// Request ID.
    pub id: Option<u64>,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,

    /// The operation's response envelope.
    pub result: Value,

    /// Request ID.
    pub id: Option<u64>,
}

//--------------------------------------------------------------------------------------------------
// Types: Responses
//--------------------------------------------------------------------------------------------------

/// Response type for regular message responses.
#[derive(Debug, Serialize)]
pub struct RegularMessageResponse {
    /// Message indicating the status of the operation.
    pub message: String,
}
