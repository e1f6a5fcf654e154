//! `hyperd-core` holds the entity state the hyperd management API operates on.
//!
//! # Overview
//!
//! hyperd-core owns the mutable side of the system:
//! - The node registry: the compute host itself and its physical CPUs
//! - The domain registry: virtual machines and their virtual block/network devices
//! - The auth manager: credential checks and the session token store
//!
//! The API surface in `hyperd-server` never holds entity state of its own; every
//! handler and guard consults these registries through explicitly injected
//! references. Consistency of concurrent mutations to the same entity is owned
//! here, not by the dispatch layer.

#![warn(missing_docs)]

mod error;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub mod auth;
pub mod domain;
pub mod node;

pub use auth::*;
pub use domain::*;
pub use error::*;
pub use node::*;
