//! Error types for registry and session operations.

use thiserror::Error;

use crate::domain::PowerState;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Result type for hyperd-core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors surfaced by the registries and the auth manager.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Username/password pair was rejected.
    #[error("authentication failed for user '{0}'")]
    AuthenticationFailed(String),

    /// No domain with the given reference exists in the registry.
    #[error("domain '{0}' not found")]
    DomainNotFound(String),

    /// No device with the given reference exists on any domain.
    #[error("device '{0}' not found")]
    DeviceNotFound(String),

    /// The requested lifecycle transition is not allowed from the
    /// domain's current power state.
    #[error("domain '{name}' cannot {operation} while {state}")]
    InvalidPowerState {
        /// Name label of the domain.
        name: String,
        /// The lifecycle operation that was attempted.
        operation: &'static str,
        /// The power state the domain was in at the time.
        state: PowerState,
    },

    /// A domain spec referenced an entity that does not exist.
    #[error("invalid domain spec: {0}")]
    InvalidSpec(String),
}
