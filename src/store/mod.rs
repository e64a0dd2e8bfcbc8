//! Document store seam. The query layer scans whole collections through this trait
//! and filters in memory; the store only persists documents.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_collections, ensure_database_exists, PgStore};

use crate::error::AppError;
use crate::record::Record;
use async_trait::async_trait;
use serde_json::{Map, Value};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every record of `collection` in insertion order.
    async fn scan(&self, collection: &str) -> Result<Vec<Record>, AppError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, AppError>;

    /// Insert a new record; the store assigns id and timestamps.
    async fn insert(&self, collection: &str, fields: Map<String, Value>) -> Result<Record, AppError>;

    /// Merge `fields` into the record. Null values remove the key. Returns None when
    /// the record does not exist.
    async fn patch(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<Option<Record>, AppError>;

    /// Delete and return the record, or None when it does not exist.
    async fn delete(&self, collection: &str, id: &str) -> Result<Option<Record>, AppError>;

    /// Cheap liveness probe for readiness checks.
    async fn ping(&self) -> Result<(), AppError>;
}

/// Split a patch into keys to set and keys to remove (null values).
pub(crate) fn split_patch(fields: Map<String, Value>) -> (Map<String, Value>, Vec<String>) {
    let mut set = Map::new();
    let mut unset = Vec::new();
    for (k, v) in fields {
        if v.is_null() {
            unset.push(k);
        } else {
            set.insert(k, v);
        }
    }
    (set, unset)
}
