//! Resource handlers: list/query, count, suggest, exists, CRUD, bulk, upsert,
//! clone, toggle, publish, reorder.

use crate::config::{FieldKind, ResolvedResource};
use crate::error::AppError;
use crate::query::{Filter, SortDirection, SortSpec, DEFAULT_SUGGEST_LIMIT};
use crate::response::{created, ok, ok_list};
use crate::service::{ListArgs, ReorderArgs};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

pub(crate) fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

/// Coerce a query-string value by the field's declared kind. Falls back to the raw string.
fn query_value_for_field(resource: &ResolvedResource, field: &str, s: &str) -> Value {
    let kind = resource.field(field).map(|f| f.kind);
    match kind {
        Some(FieldKind::Number) | Some(FieldKind::Timestamp) => {
            if let Ok(n) = s.parse::<i64>() {
                return Value::Number(n.into());
            }
            if let Some(n) = s.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                return Value::Number(n);
            }
        }
        Some(FieldKind::Boolean) => {
            if s.eq_ignore_ascii_case("true") {
                return Value::Bool(true);
            }
            if s.eq_ignore_ascii_case("false") {
                return Value::Bool(false);
            }
        }
        _ => {}
    }
    Value::String(s.to_string())
}

/// Build list arguments from a query string. Parameters named after declared
/// fields become equality filters.
fn list_args_from_params(resource: &ResolvedResource, params: HashMap<String, String>) -> Result<ListArgs, AppError> {
    let mut args = ListArgs::default();
    let mut direction: Option<SortDirection> = None;

    for (k, v) in params {
        match k.as_str() {
            "q" => args.q = Some(v),
            "page" => args.page.page = v.parse().ok(),
            "pageSize" => args.page.page_size = v.parse().ok(),
            "cursor" => args.page.cursor = Some(v),
            "sort" => args.sort = SortSpec::from_param(&v),
            "direction" => direction = SortDirection::parse(&v),
            "filters" => {
                let parsed: Vec<Filter> = serde_json::from_str(&v)
                    .map_err(|e| AppError::BadRequest(format!("filters must be a JSON array of filters: {}", e)))?;
                args.filters.extend(parsed);
            }
            _ => {
                if resource.has_field(&k) {
                    let val = query_value_for_field(resource, &k, &v);
                    args.filters.push(Filter::equals(k, val));
                }
            }
        }
    }
    if let (Some(sort), Some(direction)) = (args.sort.as_mut(), direction) {
        sort.direction = direction;
    }
    Ok(args)
}

pub async fn list(
    State(state): State<AppState>,
    Path(resource_name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_name)?;
    let args = list_args_from_params(resource, params)?;
    let page = state.service.list(resource, &args).await?;
    Ok(ok(page))
}

pub async fn query(
    State(state): State<AppState>,
    Path(resource_name): Path<String>,
    Json(args): Json<ListArgs>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_name)?;
    let page = state.service.list(resource, &args).await?;
    Ok(ok(page))
}

pub async fn count(
    State(state): State<AppState>,
    Path(resource_name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_name)?;
    let args = list_args_from_params(resource, params)?;
    let total = state.service.count(resource, args.q.as_deref(), &args.filters).await?;
    Ok(ok(serde_json::json!({ "total": total })))
}

#[derive(Deserialize)]
pub struct SuggestParams {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

pub async fn suggest(
    State(state): State<AppState>,
    Path(resource_name): Path<String>,
    Query(params): Query<SuggestParams>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_name)?;
    let q = params.q.unwrap_or_default();
    let limit = params.limit.unwrap_or(DEFAULT_SUGGEST_LIMIT);
    let items = state.service.suggest(resource, &q, limit).await?;
    Ok(ok_list(items))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistsParams {
    field: String,
    value: String,
    #[serde(default)]
    exclude_id: Option<String>,
}

pub async fn exists(
    State(state): State<AppState>,
    Path(resource_name): Path<String>,
    Query(params): Query<ExistsParams>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_name)?;
    let value = query_value_for_field(resource, &params.field, &params.value);
    let exists = state
        .service
        .exists(resource, &params.field, &value, params.exclude_id.as_deref())
        .await?;
    Ok(ok(serde_json::json!({ "exists": exists })))
}

pub async fn create(
    State(state): State<AppState>,
    Path(resource_name): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_name)?;
    let record = state.service.create(resource, body_to_map(body)?).await?;
    Ok(created(record))
}

pub async fn read(
    State(state): State<AppState>,
    Path((resource_name, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_name)?;
    let record = state.service.get(resource, &id).await?;
    Ok(ok(record))
}

pub async fn update(
    State(state): State<AppState>,
    Path((resource_name, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_name)?;
    let record = state.service.update(resource, &id, body_to_map(body)?).await?;
    Ok(ok(record))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardedUpdateBody {
    expected_updated_at: i64,
    patch: Map<String, Value>,
}

pub async fn guarded_update(
    State(state): State<AppState>,
    Path((resource_name, id)): Path<(String, String)>,
    Json(body): Json<GuardedUpdateBody>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_name)?;
    let record = state
        .service
        .guarded_update(resource, &id, body.expected_updated_at, body.patch)
        .await?;
    Ok(ok(record))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((resource_name, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_name)?;
    let summary = state.service.delete(resource, &id).await?;
    Ok(ok(summary))
}

#[derive(Deserialize)]
pub struct BulkUpdateBody {
    ids: Vec<String>,
    patch: Map<String, Value>,
}

pub async fn bulk_update(
    State(state): State<AppState>,
    Path(resource_name): Path<String>,
    Json(body): Json<BulkUpdateBody>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_name)?;
    let summary = state.service.bulk_update(resource, &body.ids, body.patch).await?;
    Ok(ok(summary))
}

#[derive(Deserialize)]
pub struct BulkDeleteBody {
    ids: Vec<String>,
}

pub async fn bulk_delete(
    State(state): State<AppState>,
    Path(resource_name): Path<String>,
    Json(body): Json<BulkDeleteBody>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_name)?;
    let summary = state.service.bulk_delete(resource, &body.ids).await?;
    Ok(ok(summary))
}

#[derive(Deserialize)]
pub struct UpsertParams {
    #[serde(default)]
    key: Option<String>,
}

pub async fn upsert(
    State(state): State<AppState>,
    Path(resource_name): Path<String>,
    Query(params): Query<UpsertParams>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_name)?;
    let record = state
        .service
        .upsert(resource, params.key.as_deref(), body_to_map(body)?)
        .await?;
    Ok(ok(record))
}

pub async fn clone_record(
    State(state): State<AppState>,
    Path((resource_name, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_name)?;
    let record = state.service.clone_record(resource, &id).await?;
    Ok(created(record))
}

#[derive(Deserialize)]
pub struct ToggleBody {
    field: String,
}

pub async fn toggle(
    State(state): State<AppState>,
    Path((resource_name, id)): Path<(String, String)>,
    Json(body): Json<ToggleBody>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_name)?;
    let record = state.service.toggle(resource, &id, &body.field).await?;
    Ok(ok(record))
}

#[derive(Deserialize)]
pub struct PublishBody {
    published: bool,
}

pub async fn publish(
    State(state): State<AppState>,
    Path((resource_name, id)): Path<(String, String)>,
    Json(body): Json<PublishBody>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_name)?;
    let record = state.service.publish(resource, &id, body.published).await?;
    Ok(ok(record))
}

pub async fn reorder(
    State(state): State<AppState>,
    Path(resource_name): Path<String>,
    Json(args): Json<ReorderArgs>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_name)?;
    let result = state.service.reorder(resource, &args).await?;
    Ok(ok(result))
}
