//! Success envelope `{"data": ..., "meta"?: {...}}`. Errors use `AppError`'s envelope.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ListMeta>,
}

#[derive(Serialize)]
pub struct ListMeta {
    pub count: usize,
}

pub type Reply<T> = (StatusCode, Json<Envelope<T>>);

fn reply<T: Serialize>(status: StatusCode, data: T, meta: Option<ListMeta>) -> Reply<T> {
    (status, Json(Envelope { data, meta }))
}

/// 201 with the new record.
pub fn created<T: Serialize>(data: T) -> Reply<T> {
    reply(StatusCode::CREATED, data, None)
}

pub fn ok<T: Serialize>(data: T) -> Reply<T> {
    reply(StatusCode::OK, data, None)
}

/// 200 with a bare list and its length in `meta.count`.
pub fn ok_list<T: Serialize>(items: Vec<T>) -> Reply<Vec<T>> {
    let count = items.len();
    reply(StatusCode::OK, items, Some(ListMeta { count }))
}
