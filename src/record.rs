//! Stored documents and the field-accessor view the query layer reads them through.

use crate::query::{FieldValue, Fields};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// Keys owned by the store. Stripped from write payloads.
pub const SYSTEM_KEYS: &[&str] = &["id", "_id", "createdAt", "updatedAt", "_creationTime"];

/// One document of a collection. `created_at` / `updated_at` are epoch milliseconds.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// API shape: fields plus `id`, `createdAt`, `updatedAt`.
    pub fn to_json(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert("id".into(), Value::String(self.id.clone()));
        map.insert("createdAt".into(), Value::Number(self.created_at.into()));
        map.insert("updatedAt".into(), Value::Number(self.updated_at.into()));
        Value::Object(map)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 3))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("createdAt", &self.created_at)?;
        map.serialize_entry("updatedAt", &self.updated_at)?;
        map.end()
    }
}

impl Fields for Record {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "id" | "_id" => FieldValue::Id(&self.id),
            "createdAt" | "_creationTime" => FieldValue::Number(self.created_at as f64),
            "updatedAt" => FieldValue::Number(self.updated_at as f64),
            _ => self.fields.get(name).map(FieldValue::from_json).unwrap_or(FieldValue::Undefined),
        }
    }

    fn record_id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

/// Remove store-owned keys from a write payload.
pub fn strip_system_keys(body: &mut Map<String, Value>) {
    for key in SYSTEM_KEYS {
        body.remove(*key);
    }
}

/// Epoch milliseconds, used for all record timestamps.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Next `updated_at` for a record: wall clock, but always past the previous stamp.
pub fn next_stamp(previous: i64) -> i64 {
    now_millis().max(previous + 1)
}
