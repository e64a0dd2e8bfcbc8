//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("duplicate resource: {0}")]
    DuplicateResource(String),
    #[error("duplicate field: {resource}.{field}")]
    DuplicateField { resource: String, field: String },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("record {id} not found in reorder scope")]
    NotFoundInScope { id: String },
    #[error("validation: {0}")]
    Validation(String),
    #[error("duplicate value for {field}: {value}")]
    Duplicate { field: String, value: String },
    #[error("stale write on {id}: expected updatedAt {expected}, found {actual}")]
    StaleWrite { id: String, expected: i64, actual: i64 },
    #[error("unsupported operation: {0}")]
    Unsupported(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Stable machine-readable code used in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_error",
            AppError::NotFound(_) => "not_found",
            AppError::NotFoundInScope { .. } => "not_found_in_scope",
            AppError::Validation(_) => "validation_error",
            AppError::Duplicate { .. } => "duplicate_value",
            AppError::StaleWrite { .. } => "stale_write",
            AppError::Unsupported(_) => "unsupported_operation",
            AppError::Db(sqlx::Error::RowNotFound) => "not_found",
            AppError::Db(_) => "database_error",
            AppError::BadRequest(_) => "bad_request",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) | AppError::NotFoundInScope { .. } => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Duplicate { .. } | AppError::StaleWrite { .. } => StatusCode::CONFLICT,
            AppError::Unsupported(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Db(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Duplicate { field, value } => Some(serde_json::json!({ "field": field, "value": value })),
            AppError::StaleWrite { id, expected, actual } => Some(serde_json::json!({
                "id": id,
                "expectedUpdatedAt": expected,
                "actualUpdatedAt": actual,
            })),
            AppError::NotFoundInScope { id } => Some(serde_json::json!({ "id": id })),
            _ => None,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        (status, Json(body)).into_response()
    }
}
