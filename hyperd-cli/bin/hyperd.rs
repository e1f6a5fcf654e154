use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use clap::Parser;
use hyperd_cli::{HyperdArgs, HyperdCliResult};
use hyperd_core::{AuthManager, DomainRegistry, NodeRegistry};
use hyperd_server::{
    route,
    state::{ApiServices, AppState},
    Config,
};
use tower_http::cors::{Any, CorsLayer};

//--------------------------------------------------------------------------------------------------
// Functions: Main
//--------------------------------------------------------------------------------------------------

#[tokio::main]
pub async fn main() -> HyperdCliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Parse command line arguments
    let args = HyperdArgs::parse();

    if args.dev_mode {
        tracing::info!("Development mode: {}", args.dev_mode);
        println!(
            "Running in {} mode",
            console::style("development").yellow()
        );
    }

    // Create configuration from arguments
    let config = Arc::new(Config::new(args.users, args.port, args.dev_mode)?);

    // Assemble the collaborators the API runs against
    let cpu_count = std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1);
    let services = ApiServices::new(
        Arc::new(NodeRegistry::new(
            args.host_name,
            args.host_description,
            cpu_count,
        )),
        Arc::new(DomainRegistry::new()),
        Arc::new(AuthManager::new(config.user_table())),
    );

    // Create application state; this runs the one-time composition pass
    let state = AppState::new(config.clone(), services);

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_origin(Any);

    // Build application
    let app = route::create_router(state).layer(cors);

    // Start server
    tracing::info!("Starting server on {}", config.get_addr());
    println!(
        "Server listening on {}",
        console::style(config.get_addr()).yellow()
    );

    let listener = tokio::net::TcpListener::bind(config.get_addr()).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
