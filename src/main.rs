//! storefront-server: loads the resource catalog, connects the document store and
//! serves the API.

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use storefront_api::{
    app, builtin_catalog, ensure_collections, ensure_database_exists, load_from_path, resolve, AppState, CrudService,
    DocumentStore, MemoryStore, PgStore, ServerConfig,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("storefront_api=info,tower_http=info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let catalog_config = match &config.resources_path {
        Some(path) => load_from_path(path).await?,
        None => builtin_catalog()?,
    };
    let catalog = Arc::new(resolve(&catalog_config)?);
    tracing::info!(resources = catalog.resources.len(), "catalog loaded");

    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(database_url) => {
            ensure_database_exists(database_url).await?;
            let pool = PgPoolOptions::new().max_connections(5).connect(database_url).await?;
            ensure_collections(&pool, &config.schema, catalog.names()).await?;
            tracing::info!(schema = %config.schema, "using PostgreSQL document store");
            Arc::new(PgStore::new(pool, config.schema.clone()))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; records are kept in memory and lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let service = CrudService::new(store, catalog, config.strict_filter_ops);
    let router = app(AppState::new(service), config.max_body_bytes);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("storefront API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
