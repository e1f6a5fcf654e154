//! Application state for the hyperd server.
//!
//! This module handles:
//! - The collaborator services the guards and handlers consult
//! - The shared application state handed to the axum router
//!
//! Collaborators are constructed by the binary and injected here explicitly;
//! nothing in this crate reaches for ambient globals. The dispatch table is
//! built exactly once, before the state is handed to the router, and is
//! immutable from then on.

use std::sync::Arc;

use getset::Getters;
use hyperd_core::{AuthManager, DomainRegistry, NodeRegistry};

use crate::{config::Config, dispatch::DispatchTable, DispatchTableBuilder};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The external collaborators every guard and handler runs against.
#[derive(Clone, Getters)]
#[getset(get = "pub with_prefix")]
pub struct ApiServices {
    /// The host node and its physical CPUs.
    node: Arc<NodeRegistry>,

    /// Virtual machines and their devices.
    domains: Arc<DomainRegistry>,

    /// Credential checks and the session store.
    auth: Arc<AuthManager>,
}

/// Application state shared across requests.
#[derive(Clone, Getters)]
#[getset(get = "pub with_prefix")]
pub struct AppState {
    /// The application configuration.
    config: Arc<Config>,

    /// The published, immutable operation table.
    dispatch: Arc<DispatchTable>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ApiServices {
    /// Bundle the injected collaborators.
    pub fn new(
        node: Arc<NodeRegistry>,
        domains: Arc<DomainRegistry>,
        auth: Arc<AuthManager>,
    ) -> Self {
        Self {
            node,
            domains,
            auth,
        }
    }
}

impl AppState {
    /// Create the application state, running the one-time composition pass
    /// that publishes the dispatch table.
    pub fn new(config: Arc<Config>, services: ApiServices) -> Self {
        let dispatch = Arc::new(DispatchTableBuilder::new(services).build());
        tracing::info!("published {} API operations", dispatch.len());

        Self { config, dispatch }
    }
}
