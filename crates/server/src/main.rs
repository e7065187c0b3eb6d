mod api;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marquee_core::{
    load_config, validate_config, BookingCoordinator, MovieLookup, OmdbClient, SeatLedger,
    SessionCatalog, SessionStore, SqliteSessionStore, SqliteTicketStore, SqliteUserDirectory,
    TicketStore, UserDirectory,
};

use api::create_router;
use state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("MARQUEE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);

    let busy_timeout = config.database.busy_timeout();

    // Create SQLite user directory
    let users: Arc<dyn UserDirectory> = Arc::new(
        SqliteUserDirectory::new(&config.database.path, busy_timeout)
            .context("Failed to create user directory")?,
    );
    info!("User directory initialized");

    // Create SQLite session store
    let sessions: Arc<dyn SessionStore> = Arc::new(
        SqliteSessionStore::new(&config.database.path, busy_timeout)
            .context("Failed to create session store")?,
    );
    info!("Session store initialized");

    // Create SQLite ticket store
    let tickets: Arc<dyn TicketStore> = Arc::new(
        SqliteTicketStore::new(&config.database.path, busy_timeout)
            .context("Failed to create ticket store")?,
    );
    info!("Ticket store initialized");

    // Create movie catalog client if configured
    let movies: Option<Arc<dyn MovieLookup>> = match &config.omdb {
        Some(omdb_config) => {
            info!("Initializing OMDb client");
            let client = OmdbClient::new(omdb_config.clone())
                .context("Failed to create OMDb client")?;
            Some(Arc::new(client))
        }
        None => {
            info!("No movie catalog configured, titles pass through verbatim");
            None
        }
    };

    // Assemble the engine
    let catalog = SessionCatalog::new(Arc::clone(&sessions), Arc::clone(&tickets), movies);
    let coordinator =
        BookingCoordinator::new(Arc::clone(&users), Arc::clone(&sessions), Arc::clone(&tickets));
    let ledger = SeatLedger::new(Arc::clone(&sessions), Arc::clone(&tickets));

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        catalog,
        coordinator,
        ledger,
        users,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
