//! The two-shape success/error response envelope.
//!
//! Every operation, guard rejection included, answers with one of exactly two
//! shapes on the wire:
//!
//! ```json
//! {"Status": "Success", "Value": ...}
//! {"Status": "Error", "ErrorDescription": ["CODE", "human message"]}
//! ```
//!
//! The `Value` field is present even for void operations (as an empty
//! string); the error description pairs a stable machine code with a
//! human-readable message. Guard rejections historically used a third
//! `"Failure"` status literal; that inconsistency is deliberately unified
//! here so callers only ever branch on two statuses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Stable machine codes for every API-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Username/password pair was rejected at login.
    AuthenticationFailed,
    /// The session token does not resolve to a live session.
    SessionInvalid,
    /// The host reference is unknown.
    HostInvalid,
    /// The physical CPU reference is unknown.
    HostCpuInvalid,
    /// The virtual machine reference is unknown.
    VmInvalid,
    /// The virtual block device reference is unknown.
    VbdInvalid,
    /// The virtual network interface reference is unknown.
    VifInvalid,
    /// A spec named an owning domain that does not exist.
    DomainInvalid,
    /// The host must be disabled before this operation.
    HostRunning,
    /// The operation exists but is deliberately not supported.
    Unsupported,
    /// Declared surface area whose implementation is still pending.
    Todo,
}

/// The uniform wire response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Status")]
pub enum Response {
    /// The operation completed; its result is in `Value`.
    Success {
        /// Operation result. Empty string for void operations.
        #[serde(rename = "Value")]
        value: Value,
    },

    /// The operation was rejected or failed.
    Error {
        /// Two-element `[code, message]` description.
        #[serde(rename = "ErrorDescription")]
        error_description: Vec<String>,
    },
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ErrorCode {
    /// The stable machine code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::SessionInvalid => "SESSION_INVALID",
            Self::HostInvalid => "HOST_INVALID",
            Self::HostCpuInvalid => "HOST_CPU_INVALID",
            Self::VmInvalid => "VM_INVALID",
            Self::VbdInvalid => "VBD_INVALID",
            Self::VifInvalid => "VIF_INVALID",
            Self::DomainInvalid => "DOMAIN_INVALID",
            Self::HostRunning => "HOST_RUNNING",
            Self::Unsupported => "UNSUPPORTED",
            Self::Todo => "TODO",
        }
    }

    /// The human-readable companion message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "Authentication failed",
            Self::SessionInvalid => "Session invalid",
            Self::HostInvalid => "Host reference invalid",
            Self::HostCpuInvalid => "Host CPU reference invalid",
            Self::VmInvalid => "VM reference invalid",
            Self::VbdInvalid => "VBD reference invalid",
            Self::VifInvalid => "VIF reference invalid",
            Self::DomainInvalid => "Domain reference invalid",
            Self::HostRunning => "Host is still enabled",
            Self::Unsupported => "Operation unsupported",
            Self::Todo => "Operation not implemented",
        }
    }
}

impl Response {
    /// Success with a value.
    pub fn success(value: impl Into<Value>) -> Self {
        Self::Success {
            value: value.into(),
        }
    }

    /// Success for an operation with no return value. The wire schema
    /// requires a present `Value` field, so an empty string stands in.
    pub fn success_void() -> Self {
        Self::success("")
    }

    /// Error with the given code.
    pub fn error(code: ErrorCode) -> Self {
        Self::Error {
            error_description: vec![code.code().to_string(), code.message().to_string()],
        }
    }

    /// Sentinel for declared-but-unimplemented surface area, kept
    /// distinguishable from genuine runtime failures.
    pub fn todo() -> Self {
        Self::error(ErrorCode::Todo)
    }

    /// Whether this is the success shape.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The machine code of an error response, if this is one.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Error { error_description } => error_description.first().map(String::as_str),
            Self::Success { .. } => None,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let wire = serde_json::to_value(Response::success(json!(["a", "b"]))).unwrap();
        assert_eq!(wire, json!({"Status": "Success", "Value": ["a", "b"]}));
    }

    #[test]
    fn test_void_success_carries_empty_value() {
        let wire = serde_json::to_value(Response::success_void()).unwrap();
        assert_eq!(wire, json!({"Status": "Success", "Value": ""}));
    }

    #[test]
    fn test_error_shape() {
        let wire = serde_json::to_value(Response::error(ErrorCode::SessionInvalid)).unwrap();
        assert_eq!(
            wire,
            json!({
                "Status": "Error",
                "ErrorDescription": ["SESSION_INVALID", "Session invalid"],
            })
        );
    }

    #[test]
    fn test_todo_is_an_error_with_its_own_code() {
        let response = Response::todo();
        assert!(!response.is_success());
        assert_eq!(response.error_code(), Some("TODO"));
    }
}
