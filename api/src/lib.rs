pub mod config;
pub mod cors;
pub mod handlers;

use application::{DocumentStore, PersistenceService, StatusService};
use axum::{Router, middleware, routing::get};
use domain::{ContactMessage, DonationPledge, Volunteer};
use std::sync::Arc;

pub use config::ServerConfig;
use handlers::{
    create_record_handler, database_status_handler, health_check, hello_handler,
    list_records_handler, root_handler, schema_handler,
};

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub persistence_service: Arc<PersistenceService>,
    pub status_service: Arc<StatusService>,
}

impl AppState {
    /// Wires the services around one shared store handle.
    pub fn new(store: Arc<dyn DocumentStore>, config: &ServerConfig) -> Self {
        Self {
            persistence_service: Arc::new(PersistenceService::new(store.clone())),
            status_service: Arc::new(StatusService::new(store, config.database_url.is_some())),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/test", get(database_status_handler))
        .route("/schema", get(schema_handler))
        .route("/api/hello", get(hello_handler))
        // Record endpoints, one collection each
        .route(
            "/api/volunteers",
            get(list_records_handler::<Volunteer>).post(create_record_handler::<Volunteer>),
        )
        .route(
            "/api/donations",
            get(list_records_handler::<DonationPledge>)
                .post(create_record_handler::<DonationPledge>),
        )
        .route(
            "/api/contacts",
            get(list_records_handler::<ContactMessage>)
                .post(create_record_handler::<ContactMessage>),
        )
        .layer(middleware::from_fn(cors::permissive_cors))
        .with_state(state)
}
