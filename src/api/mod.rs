pub mod health;
pub mod identifiers;
pub mod positions;

use crate::config::Config;
use crate::datasource::ChainReader;
use crate::domain::IdentifierConfig;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub reader: Arc<dyn ChainReader>,
    /// `None` until an identifier configuration has been loaded.
    pub identifiers: Option<Arc<IdentifierConfig>>,
}

impl AppState {
    pub fn new(
        config: Config,
        reader: Arc<dyn ChainReader>,
        identifiers: Option<IdentifierConfig>,
    ) -> Self {
        Self {
            config,
            reader,
            identifiers: identifiers.map(Arc::new),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/positions", get(positions::get_positions))
        .route("/v1/identifiers", get(identifiers::get_identifiers))
        .layer(cors)
        .with_state(state)
}
