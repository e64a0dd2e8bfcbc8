use crate::handlers::settings::{get_settings, put_settings};
use crate::state::AppState;
use axum::{routing::get, Router};

/// GET/PUT /settings. The static path takes precedence over `/:resource`.
pub fn settings_routes(state: AppState) -> Router {
    Router::new()
        .route("/settings", get(get_settings).put(put_settings))
        .with_state(state)
}
