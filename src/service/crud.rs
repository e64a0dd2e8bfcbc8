//! Generic resource operations over a document store.
//!
//! Reads scan the whole collection and run the query layer in memory. Mutations
//! that read before they write hold the collection's write lock for the whole
//! read-modify-write, so two writers in this process never interleave on one
//! collection.

use crate::config::{ResolvedCatalog, ResolvedResource, STATUS_DRAFT, STATUS_PUBLISHED};
use crate::error::AppError;
use crate::query::{
    apply_sort, ensure_unique, matches_filters, matches_query, next_sort_order, paginate, plan_reorder, suggest,
    value_exists, FieldValue, Fields, Filter, OrderChange, Page, PageRequest, ReorderScope, ReorderTarget, SortSpec,
    Suggestion,
};
use crate::record::{now_millis, Record};
use crate::service::locks::WriteLocks;
use crate::service::RequestValidator;
use crate::store::DocumentStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Arguments of `list` (and `count`, which ignores the paging part).
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListArgs {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub sort: Option<SortSpec>,
    #[serde(flatten)]
    pub page: PageRequest,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderArgs {
    pub id: String,
    #[serde(default)]
    pub to_index: Option<i64>,
    #[serde(default)]
    pub before_id: Option<String>,
    #[serde(default)]
    pub after_id: Option<String>,
    /// Explicit sibling scope. None: derived from the resource's scope field.
    #[serde(default)]
    pub scope: Option<ReorderScope>,
}

impl ReorderArgs {
    /// `toIndex` wins over `beforeId`, which wins over `afterId`. Nothing: move to the end.
    pub fn target(&self) -> ReorderTarget {
        if let Some(i) = self.to_index {
            ReorderTarget::Index(i)
        } else if let Some(id) = &self.before_id {
            ReorderTarget::Before(id.clone())
        } else if let Some(id) = &self.after_id {
            ReorderTarget::After(id.clone())
        } else {
            ReorderTarget::End
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MutationSummary {
    pub success: bool,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReorderResult {
    pub success: bool,
    pub changed: Vec<OrderChange>,
}

pub struct CrudService {
    store: Arc<dyn DocumentStore>,
    catalog: Arc<ResolvedCatalog>,
    locks: WriteLocks,
    strict_filter_ops: bool,
}

impl CrudService {
    pub fn new(store: Arc<dyn DocumentStore>, catalog: Arc<ResolvedCatalog>, strict_filter_ops: bool) -> Self {
        CrudService {
            store,
            catalog,
            locks: WriteLocks::new(),
            strict_filter_ops,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn catalog(&self) -> &Arc<ResolvedCatalog> {
        &self.catalog
    }

    /// Search, filter, sort and paginate a collection.
    pub async fn list(&self, resource: &ResolvedResource, args: &ListArgs) -> Result<Page<Record>, AppError> {
        self.check_filters(resource, &args.filters)?;
        let records = self.store.scan(&resource.name).await?;
        let total_scanned = records.len();
        let selected = select(resource, records, args.q.as_deref(), &args.filters);
        let sorted = apply_sort(selected, args.sort.as_ref());
        let page = paginate(sorted, &args.page);
        tracing::debug!(
            resource = %resource.name,
            scanned = total_scanned,
            matched = page.total,
            returned = page.items.len(),
            "list"
        );
        Ok(page)
    }

    pub async fn count(&self, resource: &ResolvedResource, q: Option<&str>, filters: &[Filter]) -> Result<usize, AppError> {
        self.check_filters(resource, filters)?;
        let records = self.store.scan(&resource.name).await?;
        Ok(select(resource, records, q, filters).len())
    }

    pub async fn suggest(&self, resource: &ResolvedResource, q: &str, limit: usize) -> Result<Vec<Suggestion>, AppError> {
        let records = self.store.scan(&resource.name).await?;
        Ok(suggest(&records, q, &resource.label_fields, limit))
    }

    /// Whether another record (not `exclude_id`) holds `value` in `field`.
    pub async fn exists(
        &self,
        resource: &ResolvedResource,
        field: &str,
        value: &Value,
        exclude_id: Option<&str>,
    ) -> Result<bool, AppError> {
        if !resource.has_field(field) {
            return Err(AppError::BadRequest(format!("unknown field '{}' for {}", field, resource.name)));
        }
        let records = self.store.scan(&resource.name).await?;
        Ok(value_exists(&records, field, &FieldValue::from_json(value), exclude_id))
    }

    pub async fn get(&self, resource: &ResolvedResource, id: &str) -> Result<Record, AppError> {
        self.store
            .get(&resource.name, id)
            .await?
            .ok_or_else(|| not_found(resource, id))
    }

    pub async fn create(&self, resource: &ResolvedResource, mut body: Map<String, Value>) -> Result<Record, AppError> {
        if resource.singleton {
            return Err(AppError::Unsupported(format!("{} is a singleton; use PUT", resource.name)));
        }
        RequestValidator::sanitize(resource, &mut body)?;
        let _guard = self.locks.acquire(&resource.name).await;
        let records = self.store.scan(&resource.name).await?;
        self.create_locked(resource, body, &records).await
    }

    pub async fn update(&self, resource: &ResolvedResource, id: &str, mut body: Map<String, Value>) -> Result<Record, AppError> {
        prepare_patch(resource, &mut body)?;
        let _guard = self.locks.acquire(&resource.name).await;
        let records = self.store.scan(&resource.name).await?;
        let existing = find(&records, id).ok_or_else(|| not_found(resource, id))?;
        self.patch_locked(resource, existing, &records, body).await
    }

    /// Patch only if the record's `updatedAt` still equals `expected_updated_at`.
    pub async fn guarded_update(
        &self,
        resource: &ResolvedResource,
        id: &str,
        expected_updated_at: i64,
        mut body: Map<String, Value>,
    ) -> Result<Record, AppError> {
        prepare_patch(resource, &mut body)?;
        let _guard = self.locks.acquire(&resource.name).await;
        let records = self.store.scan(&resource.name).await?;
        let existing = find(&records, id).ok_or_else(|| not_found(resource, id))?;
        if existing.updated_at != expected_updated_at {
            tracing::info!(
                resource = %resource.name,
                id = %id,
                expected = expected_updated_at,
                actual = existing.updated_at,
                "stale write rejected"
            );
            return Err(AppError::StaleWrite {
                id: id.to_string(),
                expected: expected_updated_at,
                actual: existing.updated_at,
            });
        }
        self.patch_locked(resource, existing, &records, body).await
    }

    /// Delete a record and, transitively, the records of declared child resources
    /// that reference it. `count` includes the cascaded records.
    pub async fn delete(&self, resource: &ResolvedResource, id: &str) -> Result<MutationSummary, AppError> {
        {
            let _guard = self.locks.acquire(&resource.name).await;
            self.store
                .delete(&resource.name, id)
                .await?
                .ok_or_else(|| not_found(resource, id))?;
        }
        tracing::info!(resource = %resource.name, id = %id, "record deleted");
        let cascaded = self.cascade_delete(resource, id).await?;
        Ok(MutationSummary {
            success: true,
            count: 1 + cascaded,
        })
    }

    /// Apply the same patch to each id in order. Stops at the first failure;
    /// records already patched stay patched.
    pub async fn bulk_update(
        &self,
        resource: &ResolvedResource,
        ids: &[String],
        mut body: Map<String, Value>,
    ) -> Result<MutationSummary, AppError> {
        prepare_patch(resource, &mut body)?;
        let _guard = self.locks.acquire(&resource.name).await;
        let mut records = self.store.scan(&resource.name).await?;
        let mut count = 0;
        for id in ids {
            let pos = records
                .iter()
                .position(|r| r.id == *id)
                .ok_or_else(|| not_found(resource, id))?;
            let updated = self.patch_locked(resource, &records[pos], &records, body.clone()).await?;
            records[pos] = updated;
            count += 1;
        }
        tracing::info!(resource = %resource.name, count, "bulk update");
        Ok(MutationSummary { success: true, count })
    }

    /// Delete each id in order (with cascade). Stops at the first failure.
    pub async fn bulk_delete(&self, resource: &ResolvedResource, ids: &[String]) -> Result<MutationSummary, AppError> {
        let mut count = 0;
        for id in ids {
            count += self.delete(resource, id).await?.count;
        }
        Ok(MutationSummary { success: true, count })
    }

    /// Create, or patch the record whose `key` field equals the body's value.
    /// `key` defaults to the resource's upsert key.
    pub async fn upsert(
        &self,
        resource: &ResolvedResource,
        key: Option<&str>,
        mut body: Map<String, Value>,
    ) -> Result<Record, AppError> {
        if resource.singleton {
            return Err(AppError::Unsupported(format!("{} is a singleton; use PUT", resource.name)));
        }
        let key = key
            .or(resource.upsert_key.as_deref())
            .ok_or_else(|| AppError::BadRequest(format!("{} has no upsert key; pass ?key=", resource.name)))?
            .to_string();
        if !resource.has_field(&key) {
            return Err(AppError::BadRequest(format!("unknown field '{}' for {}", key, resource.name)));
        }
        RequestValidator::sanitize(resource, &mut body)?;
        let key_value = body.get(&key).cloned().unwrap_or(Value::Null);
        if key_value.is_null() {
            return Err(AppError::Validation(format!("{} is required for upsert", key)));
        }

        let _guard = self.locks.acquire(&resource.name).await;
        let records = self.store.scan(&resource.name).await?;
        let wanted = FieldValue::from_json(&key_value);
        match records.iter().find(|r| r.field(&key).loose_eq(&wanted)) {
            Some(existing) => {
                RequestValidator::validate_partial(resource, &body)?;
                self.patch_locked(resource, existing, &records, body).await
            }
            None => self.create_locked(resource, body, &records).await,
        }
    }

    /// Copy a record. Unique text fields get a `-copy` suffix (`-copy-2`, ... when
    /// taken); publishable copies start as drafts; ordered copies go last in scope.
    pub async fn clone_record(&self, resource: &ResolvedResource, id: &str) -> Result<Record, AppError> {
        if resource.singleton {
            return Err(AppError::Unsupported(format!("{} is a singleton", resource.name)));
        }
        let _guard = self.locks.acquire(&resource.name).await;
        let records = self.store.scan(&resource.name).await?;
        let source = find(&records, id).ok_or_else(|| not_found(resource, id))?;
        let mut fields = source.fields.clone();

        for field in &resource.unique_fields {
            let copy = match source.field(field) {
                FieldValue::String(s) => Some(unique_copy_value(&records, field, s)),
                _ => None,
            };
            match copy {
                Some(v) => fields.insert(field.clone(), Value::String(v)),
                None => fields.remove(field),
            };
        }
        if let Some(publish) = &resource.publish {
            fields.insert(publish.status_field.clone(), Value::String(STATUS_DRAFT.into()));
            fields.remove(&publish.published_at_field);
        }
        if let Some(reorder) = &resource.reorder {
            let siblings = siblings_of(&records, reorder.scope_field.as_deref(), source);
            fields.insert(reorder.field.clone(), Value::from(next_sort_order(&siblings, &reorder.field)));
        }
        RequestValidator::validate(resource, &fields)?;

        let record = self.store.insert(&resource.name, fields).await?;
        tracing::info!(resource = %resource.name, source = %id, id = %record.id, "record cloned");
        Ok(record)
    }

    /// Flip a boolean field listed in the resource's toggle fields. Missing counts as false.
    pub async fn toggle(&self, resource: &ResolvedResource, id: &str, field: &str) -> Result<Record, AppError> {
        if !resource.toggle_fields.iter().any(|f| f == field) {
            return Err(AppError::Unsupported(format!("{}.{} cannot be toggled", resource.name, field)));
        }
        let _guard = self.locks.acquire(&resource.name).await;
        let existing = self.get(resource, id).await?;
        let current = existing.field(field).as_bool().unwrap_or(false);
        let mut patch = Map::new();
        patch.insert(field.to_string(), Value::Bool(!current));
        self.store
            .patch(&resource.name, id, patch)
            .await?
            .ok_or_else(|| not_found(resource, id))
    }

    /// Set the publish status. The first publish stamps the published-at field.
    pub async fn publish(&self, resource: &ResolvedResource, id: &str, published: bool) -> Result<Record, AppError> {
        let publish = resource
            .publish
            .as_ref()
            .ok_or_else(|| AppError::Unsupported(format!("{} cannot be published", resource.name)))?;
        let _guard = self.locks.acquire(&resource.name).await;
        let existing = self.get(resource, id).await?;
        let status = if published { STATUS_PUBLISHED } else { STATUS_DRAFT };
        let mut patch = Map::new();
        patch.insert(publish.status_field.clone(), Value::String(status.into()));
        if published && existing.field(&publish.published_at_field).is_undefined() {
            patch.insert(publish.published_at_field.clone(), Value::from(now_millis()));
        }
        let record = self
            .store
            .patch(&resource.name, id, patch)
            .await?
            .ok_or_else(|| not_found(resource, id))?;
        tracing::info!(resource = %resource.name, id = %id, status, "publish status changed");
        Ok(record)
    }

    /// Move a record among its siblings and renumber them densely.
    pub async fn reorder(&self, resource: &ResolvedResource, args: &ReorderArgs) -> Result<ReorderResult, AppError> {
        let reorder = resource
            .reorder
            .as_ref()
            .ok_or_else(|| AppError::Unsupported(format!("{} cannot be reordered", resource.name)))?;
        let _guard = self.locks.acquire(&resource.name).await;
        let records = self.store.scan(&resource.name).await?;

        let siblings: Vec<Record> = match (&args.scope, reorder.scope_field.as_deref()) {
            (Some(scope), _) => records.into_iter().filter(|r| scope.contains(r)).collect(),
            (None, scope_field) => {
                let moving = find(&records, &args.id).ok_or_else(|| AppError::NotFoundInScope { id: args.id.clone() })?;
                siblings_of(&records, scope_field, moving)
            }
        };

        let changes = plan_reorder(&siblings, &reorder.field, &args.id, &args.target())?;
        for change in &changes {
            let mut patch = Map::new();
            patch.insert(reorder.field.clone(), Value::from(change.sort_order));
            self.store.patch(&resource.name, &change.id, patch).await?;
        }
        tracing::info!(resource = %resource.name, id = %args.id, changed = changes.len(), "reordered");
        Ok(ReorderResult {
            success: true,
            changed: changes,
        })
    }

    /// The singleton record, or an empty object when none has been saved.
    pub async fn get_singleton(&self, resource: &ResolvedResource) -> Result<Value, AppError> {
        require_singleton(resource)?;
        let records = self.store.scan(&resource.name).await?;
        Ok(records
            .first()
            .map(Record::to_json)
            .unwrap_or_else(|| Value::Object(Map::new())))
    }

    /// Create the singleton record or patch the existing one.
    pub async fn put_singleton(&self, resource: &ResolvedResource, mut body: Map<String, Value>) -> Result<Record, AppError> {
        require_singleton(resource)?;
        RequestValidator::sanitize(resource, &mut body)?;
        let _guard = self.locks.acquire(&resource.name).await;
        let records = self.store.scan(&resource.name).await?;
        match records.first() {
            Some(existing) => {
                RequestValidator::validate_partial(resource, &body)?;
                self.patch_locked(resource, existing, &records, body).await
            }
            None => self.create_locked(resource, body, &records).await,
        }
    }

    /// Insert a sanitized body. Caller holds the collection lock; `records` is its
    /// current content.
    async fn create_locked(
        &self,
        resource: &ResolvedResource,
        mut body: Map<String, Value>,
        records: &[Record],
    ) -> Result<Record, AppError> {
        for (k, v) in &resource.defaults {
            if !body.contains_key(k) {
                body.insert(k.clone(), v.clone());
            }
        }
        RequestValidator::validate(resource, &body)?;
        ensure_unique(records, &resource.unique_fields, &body, None)?;

        if let Some(reorder) = &resource.reorder {
            if body.get(&reorder.field).map_or(true, Value::is_null) {
                let siblings = siblings_of(records, reorder.scope_field.as_deref(), &body);
                body.insert(reorder.field.clone(), Value::from(next_sort_order(&siblings, &reorder.field)));
            }
        }
        if let Some(publish) = &resource.publish {
            let published = body.field(&publish.status_field).as_text() == Some(STATUS_PUBLISHED);
            if published && body.field(&publish.published_at_field).is_undefined() {
                body.insert(publish.published_at_field.clone(), Value::from(now_millis()));
            }
        }

        let record = self.store.insert(&resource.name, body).await?;
        tracing::info!(resource = %resource.name, id = %record.id, "record created");
        Ok(record)
    }

    /// Patch `existing` with a sanitized, validated body. Caller holds the lock.
    async fn patch_locked(
        &self,
        resource: &ResolvedResource,
        existing: &Record,
        records: &[Record],
        mut body: Map<String, Value>,
    ) -> Result<Record, AppError> {
        ensure_unique(records, &resource.unique_fields, &body, Some(&existing.id))?;
        if let Some(publish) = &resource.publish {
            let publishing = body.field(&publish.status_field).as_text() == Some(STATUS_PUBLISHED);
            if publishing
                && existing.field(&publish.published_at_field).is_undefined()
                && !body.contains_key(&publish.published_at_field)
            {
                body.insert(publish.published_at_field.clone(), Value::from(now_millis()));
            }
        }
        let record = self
            .store
            .patch(&resource.name, &existing.id, body)
            .await?
            .ok_or_else(|| not_found(resource, &existing.id))?;
        tracing::info!(resource = %resource.name, id = %record.id, "record updated");
        Ok(record)
    }

    async fn cascade_delete(&self, resource: &ResolvedResource, id: &str) -> Result<usize, AppError> {
        let mut pending: Vec<(String, String)> = vec![(resource.name.clone(), id.to_string())];
        let mut removed = 0;
        while let Some((parent, parent_id)) = pending.pop() {
            let Some(parent) = self.catalog.resource(&parent) else {
                continue;
            };
            for child in &parent.children {
                let _guard = self.locks.acquire(&child.resource).await;
                let records = self.store.scan(&child.resource).await?;
                let parent_ref = FieldValue::Id(&parent_id);
                for record in records.iter().filter(|r| r.field(&child.field).loose_eq(&parent_ref)) {
                    if self.store.delete(&child.resource, &record.id).await?.is_some() {
                        removed += 1;
                        pending.push((child.resource.clone(), record.id.clone()));
                    }
                }
            }
        }
        if removed > 0 {
            tracing::info!(resource = %resource.name, id = %id, removed, "cascade delete");
        }
        Ok(removed)
    }

    fn check_filters(&self, resource: &ResolvedResource, filters: &[Filter]) -> Result<(), AppError> {
        for filter in filters.iter().filter(|f| f.op.is_unknown()) {
            if self.strict_filter_ops {
                return Err(AppError::BadRequest(format!("unknown filter operator '{}'", filter.op.as_str())));
            }
            tracing::warn!(
                resource = %resource.name,
                field = %filter.field,
                op = %filter.op.as_str(),
                "unknown filter operator matches every record"
            );
        }
        Ok(())
    }
}

fn select(resource: &ResolvedResource, records: Vec<Record>, q: Option<&str>, filters: &[Filter]) -> Vec<Record> {
    records
        .into_iter()
        .filter(|r| matches_query(r, q, &resource.search_fields) && matches_filters(r, filters))
        .collect()
}

fn prepare_patch(resource: &ResolvedResource, body: &mut Map<String, Value>) -> Result<(), AppError> {
    RequestValidator::sanitize(resource, body)?;
    RequestValidator::validate_partial(resource, body)
}

fn require_singleton(resource: &ResolvedResource) -> Result<(), AppError> {
    if resource.singleton {
        Ok(())
    } else {
        Err(AppError::Unsupported(format!("{} is not a singleton", resource.name)))
    }
}

fn find<'a>(records: &'a [Record], id: &str) -> Option<&'a Record> {
    records.iter().find(|r| r.id == id)
}

fn not_found(resource: &ResolvedResource, id: &str) -> AppError {
    AppError::NotFound(format!("{} {}", resource.name, id))
}

/// Records sharing `anchor`'s value of `scope_field` (all records when unscoped).
fn siblings_of<A: Fields + ?Sized>(records: &[Record], scope_field: Option<&str>, anchor: &A) -> Vec<Record> {
    match scope_field {
        None => records.to_vec(),
        Some(field) => {
            let value = anchor.field(field);
            records.iter().filter(|r| r.field(field).loose_eq(&value)).cloned().collect()
        }
    }
}

fn unique_copy_value(records: &[Record], field: &str, original: &str) -> String {
    let mut candidate = format!("{}-copy", original);
    let mut n = 2;
    while value_exists(records, field, &FieldValue::String(&candidate), None) {
        candidate = format!("{}-copy-{}", original, n);
        n += 1;
    }
    candidate
}
