//! Storefront API: catalog-driven JSON resources (products, categories, posts,
//! service websites, FAQs, reviews, images, settings) over a document store.

pub mod config;
pub mod error;
pub mod handlers;
pub mod query;
pub mod record;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use config::{builtin_catalog, load_from_path, resolve, CatalogConfig, ResolvedCatalog, ResolvedResource, ServerConfig};
pub use error::{AppError, ConfigError};
pub use record::Record;
pub use response::{created, ok, ok_list, Envelope};
pub use routes::{common_routes_with_ready, resource_routes, settings_routes};
pub use service::CrudService;
pub use state::AppState;
pub use store::{ensure_collections, ensure_database_exists, DocumentStore, MemoryStore, PgStore};

use axum::Router;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Full HTTP app: common routes at the root, resources and settings under `/api/v1`.
pub fn app(state: AppState, max_body_bytes: usize) -> Router {
    let api = settings_routes(state.clone()).merge(resource_routes(state.clone()));
    common_routes_with_ready(state)
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(max_body_bytes)),
        )
}
