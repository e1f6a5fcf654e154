//! Hyperd Server - the guarded management API surface over a virtual machine host.
//!
//! # Overview
//!
//! Every manageable resource class (host, physical CPU, virtual machine,
//! virtual block device, virtual network interface, session) declares which
//! attributes are readable and writable and which methods and class functions
//! it supports. At startup a single composition pass turns those declarations
//! into a flat, immutable dispatch table of named operations, each wrapped in
//! its class's guard chain. The transport addresses operations by the
//! canonical `"Class.operation"` name and every response uses the same
//! two-shape success/error envelope.
//!
//! Entity state and lifecycle logic live in `hyperd-core`; this crate only
//! validates, dispatches, and shapes responses.

#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod descriptor;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod guard;
pub mod handler;
pub mod middleware;
pub mod payload;
pub mod resolver;
pub mod route;
pub mod state;

#[cfg(test)]
mod api_tests;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use config::*;
pub use descriptor::*;
pub use dispatch::*;
pub use envelope::*;
pub use error::*;
pub use guard::*;
pub use handler::*;
pub use payload::*;
pub use resolver::*;
pub use route::*;
pub use state::*;
