pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

pub use api::routes::create_router;
pub use logic::QueryResolver;
pub use model::*;
pub use store::{EntityStore, EntityStoreExt, InMemoryStore, PostgresStore};

/// The full application: every route, backed by `store`, with permissive CORS
pub fn build_app<S: EntityStore + 'static>(store: Arc<S>) -> Router {
    create_router()
        .with_state(store)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
}

/// Serve the application backed by `store` on an already bound listener
pub async fn serve<S: EntityStore + 'static>(
    listener: TcpListener,
    store: Arc<S>,
) -> anyhow::Result<()> {
    axum::serve(listener, build_app(store)).await?;
    Ok(())
}

/// Load the configuration, open the configured store and serve until shutdown
pub async fn run_server() -> anyhow::Result<()> {
    use crate::config::{AppConfig, StoreBackend};

    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    let listener = TcpListener::bind(config.server_address()).await?;
    log::info!("Listening on http://{}", config.server_address());

    let load_seed = std::env::var("LOAD_SEED_DATA").unwrap_or_default() == "true";

    match config.store.backend {
        StoreBackend::Memory => {
            log::info!("Using in-memory store");
            let store = Arc::new(InMemoryStore::new());
            if load_seed {
                seed::load_seed_data(&*store).await?;
            }
            serve(listener, store).await
        }
        StoreBackend::Postgres => {
            log::info!("Connecting to PostgreSQL...");
            let database_url = config.database_url()?;
            let store = PostgresStore::new(&database_url, config.database.max_connections).await?;
            store.migrate().await?;
            let store = Arc::new(store);
            if load_seed {
                seed::load_seed_data(&*store).await?;
            }
            serve(listener, store).await
        }
    }
}
