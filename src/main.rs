use sponsor_positions::datasource::RpcChainReader;
use sponsor_positions::{api, config::Config, ChainReader};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // A missing or broken identifier file leaves options unloaded rather than aborting
    let identifiers = match config.load_identifiers() {
        Ok(identifiers) => identifiers,
        Err(e) => {
            tracing::warn!("Identifier configuration not loaded: {}", e);
            None
        }
    };

    let port = config.port;
    let reader: Arc<dyn ChainReader> = Arc::new(RpcChainReader::new(
        config.rpc_url.clone(),
        config.registry_address.clone(),
    ));

    let app = api::create_router(api::AppState::new(config, reader, identifiers));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
