//! Resource routes. The first path segment names the resource; handlers resolve it
//! against the catalog.

use crate::handlers::resource::{
    bulk_delete, bulk_update, clone_record, count, create, delete as delete_handler, exists, guarded_update, list,
    publish, query, read, reorder, suggest, toggle, update, upsert,
};
use crate::state::AppState;
use axum::{
    routing::{get, patch, post, put},
    Router,
};

pub fn resource_routes(state: AppState) -> Router {
    Router::new()
        .route("/:resource", get(list).post(create))
        .route("/:resource/query", post(query))
        .route("/:resource/count", get(count))
        .route("/:resource/suggest", get(suggest))
        .route("/:resource/exists", get(exists))
        .route("/:resource/upsert", put(upsert))
        .route("/:resource/reorder", post(reorder))
        .route("/:resource/bulk/update", post(bulk_update))
        .route("/:resource/bulk/delete", post(bulk_delete))
        .route(
            "/:resource/:id",
            get(read).patch(update).delete(delete_handler),
        )
        .route("/:resource/:id/guarded", patch(guarded_update))
        .route("/:resource/:id/clone", post(clone_record))
        .route("/:resource/:id/toggle", post(toggle))
        .route("/:resource/:id/publish", post(publish))
        .with_state(state)
}
