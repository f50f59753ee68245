use api::{AppState, ServerConfig, build_router};
use application::DocumentStore;
use infrastructure::InMemoryDocumentStore;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// Application entry point
#[tokio::main]
async fn main() {
    // --- Logger Initialization ---
    let filter: EnvFilter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
    info!("Logger initialized successfully.");

    let config = ServerConfig::from_env();

    // --- Dependency Injection ---
    // One store handle for the whole process, shared by every service.
    let store: Arc<dyn DocumentStore> =
        Arc::new(InMemoryDocumentStore::new(config.database_name.clone()));
    info!(database = %config.database_name, "Document store initialized.");
    if config.database_url.is_some() && !store.is_persistent() {
        warn!("DATABASE_URL is set but ignored: records are kept in memory and lost on restart");
    }

    let app_state = AppState::new(store, &config);
    let persistence_service = app_state.persistence_service.clone();
    info!("Application state created.");

    let app = build_router(app_state);
    info!("API routes configured.");

    // --- Server Startup ---
    let addr = config.bind_addr();
    info!("Server starting on {}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Server listening on {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    let served = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // --- Shutdown Hook ---
    persistence_service.shutdown().await;
    if let Err(e) = served {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
    info!("Server stopped.");
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            // Keep serving; the process can still be killed.
            std::future::pending::<()>().await;
        }
    }
}
