//! Site settings: a single record in the `settings` resource.

use crate::error::AppError;
use crate::handlers::resource::body_to_map;
use crate::response::ok;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::Value;

pub const SETTINGS_RESOURCE: &str = "settings";

pub async fn get_settings(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(SETTINGS_RESOURCE)?;
    let settings = state.service.get_singleton(resource).await?;
    Ok(ok(settings))
}

pub async fn put_settings(State(state): State<AppState>, Json(body): Json<Value>) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(SETTINGS_RESOURCE)?;
    let record = state.service.put_singleton(resource, body_to_map(body)?).await?;
    Ok(ok(record))
}
