//! PostgreSQL document store: one JSONB table per collection inside a dedicated schema
//! (`STOREFRONT_SCHEMA`, default `storefront`).

use crate::error::{AppError, ConfigError};
use crate::record::{now_millis, Record};
use crate::store::{split_patch, DocumentStore};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

type Row = (uuid::Uuid, Value, i64, i64);

/// Quote identifier for PostgreSQL (safe: collection names come from validated config).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn row_to_record((id, payload, created_at, updated_at): Row) -> Record {
    let fields = match payload {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Record {
        id: id.to_string(),
        created_at,
        updated_at,
        fields,
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    schema: String,
}

impl PgStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgStore {
            pool,
            schema: schema.into(),
        }
    }

    fn table(&self, collection: &str) -> String {
        format!("{}.{}", quoted(&self.schema), quoted(collection))
    }
}

/// Ids are UUIDs; anything else cannot exist in the table.
fn parse_id(id: &str) -> Option<uuid::Uuid> {
    uuid::Uuid::parse_str(id).ok()
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn scan(&self, collection: &str) -> Result<Vec<Record>, AppError> {
        let sql = format!(
            "SELECT id, payload, created_at, updated_at FROM {} ORDER BY seq",
            self.table(collection)
        );
        tracing::debug!(sql = %sql, "query");
        let rows: Vec<Row> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(row_to_record).collect())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, AppError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let sql = format!(
            "SELECT id, payload, created_at, updated_at FROM {} WHERE id = $1",
            self.table(collection)
        );
        tracing::debug!(sql = %sql, id = %id, "query");
        let row: Option<Row> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(row_to_record))
    }

    async fn insert(&self, collection: &str, fields: Map<String, Value>) -> Result<Record, AppError> {
        let (fields, _) = split_patch(fields);
        let sql = format!(
            "INSERT INTO {} (id, payload, created_at, updated_at) VALUES ($1, $2, $3, $3) \
             RETURNING id, payload, created_at, updated_at",
            self.table(collection)
        );
        tracing::debug!(sql = %sql, "query");
        let row: Row = sqlx::query_as(&sql)
            .bind(uuid::Uuid::new_v4())
            .bind(Value::Object(fields))
            .bind(now_millis())
            .fetch_one(&self.pool)
            .await?;
        Ok(row_to_record(row))
    }

    async fn patch(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<Option<Record>, AppError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let (set, unset) = split_patch(fields);
        let sql = format!(
            "UPDATE {} SET payload = (payload || $2) - $3::text[], \
             updated_at = GREATEST($4, updated_at + 1) WHERE id = $1 \
             RETURNING id, payload, created_at, updated_at",
            self.table(collection)
        );
        tracing::debug!(sql = %sql, id = %id, "query");
        let row: Option<Row> = sqlx::query_as(&sql)
            .bind(id)
            .bind(Value::Object(set))
            .bind(unset)
            .bind(now_millis())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(row_to_record))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<Option<Record>, AppError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let sql = format!(
            "DELETE FROM {} WHERE id = $1 RETURNING id, payload, created_at, updated_at",
            self.table(collection)
        );
        tracing::debug!(sql = %sql, id = %id, "query");
        let row: Option<Row> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(row_to_record))
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

/// Create the schema and one document table per collection if missing.
pub async fn ensure_collections<'a, I>(pool: &PgPool, schema: &str, collections: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = &'a str>,
{
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)))
        .execute(pool)
        .await?;
    for collection in collections {
        let table = format!("{}.{}", quoted(schema), quoted(collection));
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY,
                seq BIGSERIAL NOT NULL,
                payload JSONB NOT NULL,
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL
            )
            "#,
            table
        );
        sqlx::query(&ddl).execute(pool).await?;
        tracing::debug!(table = %table, "collection ready");
    }
    Ok(())
}

/// Create the database named in `database_url` when it is missing, through a
/// connection to the server's `postgres` maintenance database.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let opts = PgConnectOptions::from_str(database_url)
        .map_err(|e| ConfigError::Load(format!("DATABASE_URL: {}", e)))?;
    let Some(db_name) = database_to_create(&opts) else {
        return Ok(());
    };
    let mut conn = opts.database(MAINTENANCE_DB).connect().await?;
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists {
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await?;
        tracing::info!(database = %db_name, "created database");
    }
    Ok(())
}

const MAINTENANCE_DB: &str = "postgres";

fn database_to_create(opts: &PgConnectOptions) -> Option<String> {
    opts.get_database()
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != MAINTENANCE_DB)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_name_comes_from_url() {
        let opts = PgConnectOptions::from_str("postgres://u:p@localhost:5432/cuahang?sslmode=disable").unwrap();
        assert_eq!(database_to_create(&opts).as_deref(), Some("cuahang"));
        let opts = PgConnectOptions::from_str("postgres://u:p@localhost:5432/postgres").unwrap();
        assert_eq!(database_to_create(&opts), None);
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quoted("products"), "\"products\"");
        assert_eq!(quoted("we\"ird"), "\"we\"\"ird\"");
    }
}
