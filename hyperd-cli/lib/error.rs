//! Error types for the hyperd command line tools.

use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Result type for CLI operations.
pub type HyperdCliResult<T> = Result<T, HyperdCliError>;

/// Errors surfaced by the command line tools.
#[derive(pretty_error_debug::Debug, Error)]
pub enum HyperdCliError {
    /// The server crate rejected the startup configuration or failed while
    /// serving.
    #[error(transparent)]
    Server(#[from] hyperd_server::ServerError),

    /// Network or filesystem failure outside the server's control.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
