//! In-process store. Used by tests and when no database is configured.

use crate::error::AppError;
use crate::record::{next_stamp, now_millis, Record};
use crate::store::{split_patch, DocumentStore};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn scan(&self, collection: &str) -> Result<Vec<Record>, AppError> {
        let guard = self.collections.read().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.get(collection).cloned().unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, AppError> {
        let guard = self.collections.read().unwrap_or_else(PoisonError::into_inner);
        Ok(guard
            .get(collection)
            .and_then(|records| records.iter().find(|r| r.id == id))
            .cloned())
    }

    async fn insert(&self, collection: &str, fields: Map<String, Value>) -> Result<Record, AppError> {
        let (fields, _) = split_patch(fields);
        let now = now_millis();
        let record = Record {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            fields,
        };
        let mut guard = self.collections.write().unwrap_or_else(PoisonError::into_inner);
        guard.entry(collection.to_string()).or_default().push(record.clone());
        Ok(record)
    }

    async fn patch(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<Option<Record>, AppError> {
        let (set, unset) = split_patch(fields);
        let mut guard = self.collections.write().unwrap_or_else(PoisonError::into_inner);
        let Some(record) = guard
            .get_mut(collection)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
        else {
            return Ok(None);
        };
        for key in unset {
            record.fields.remove(&key);
        }
        record.fields.extend(set);
        record.updated_at = next_stamp(record.updated_at);
        Ok(Some(record.clone()))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<Option<Record>, AppError> {
        let mut guard = self.collections.write().unwrap_or_else(PoisonError::into_inner);
        let Some(records) = guard.get_mut(collection) else {
            return Ok(None);
        };
        Ok(records
            .iter()
            .position(|r| r.id == id)
            .map(|pos| records.remove(pos)))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
