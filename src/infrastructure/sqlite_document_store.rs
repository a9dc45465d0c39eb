use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use sqlx::{
    sqlite::{Sqlite, SqlitePool, SqlitePoolOptions, SqliteRow},
    QueryBuilder, Row,
};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::infrastructure::document_store::{
    Collection, DocumentFilter, DocumentOrder, DocumentStore, StoredDocument,
};

static FIELD_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid field name pattern"));

const SELECT_DOCUMENTS: &str = "SELECT id, created_at, data FROM documents";

/// SQLite implementation of the document store.
/// All collections share one `documents` table; fields live in a JSON `data` column.
pub struct SqliteDocumentStore {
    pool: SqlitePool,
    name: String,
}

impl SqliteDocumentStore {
    pub async fn connect(url: &str, name: &str) -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .connect(url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to {}: {}", url, e)))?;

        let store = Self {
            pool,
            name: name.to_string(),
        };
        store.initialize().await?;
        info!("Document store '{}' ready", store.name);
        Ok(store)
    }

    /// A private in-memory database. The pool is pinned to one connection that is never
    /// recycled, since every SQLite memory connection is its own database.
    pub async fn new_in_memory() -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to connect to in-memory SQLite: {}", e))
            })?;

        let store = Self {
            pool,
            name: "memory".to_string(),
        };
        store.initialize().await?;
        Ok(store)
    }

    pub async fn initialize(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                id TEXT NOT NULL UNIQUE,
                created_at INTEGER NOT NULL,
                data TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create documents table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection_created ON documents(collection, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to create documents collection index: {}", e))
        })?;

        Ok(())
    }

    fn push_filter(
        qb: &mut QueryBuilder<'_, Sqlite>,
        collection: Collection,
        filter: &DocumentFilter,
    ) {
        qb.push(" WHERE collection = ");
        qb.push_bind(collection.as_str());

        for (field, value) in &filter.equals {
            qb.push(" AND json_extract(data, ");
            qb.push_bind(json_path(field));
            qb.push(") = ");
            qb.push_bind(value.clone());
        }
        if let Some(since) = filter.created_since {
            qb.push(" AND created_at >= ");
            qb.push_bind(since.timestamp_millis());
        }
    }
}

fn json_path(field: &str) -> String {
    format!("$.{}", field)
}

fn millis_to_datetime(millis: i64) -> AppResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| {
            AppError::DatabaseError(format!("Stored timestamp {} is out of range", millis))
        })
}

fn row_to_document(collection: Collection, row: SqliteRow) -> AppResult<StoredDocument> {
    let data: String = row.get("data");
    Ok(StoredDocument {
        id: row.get("id"),
        collection,
        created_at: millis_to_datetime(row.get("created_at"))?,
        fields: serde_json::from_str(&data)?,
    })
}

fn map_write_error(collection: Collection, err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() || db_err.message().contains("UNIQUE constraint failed") {
            return AppError::UniqueViolation(format!("duplicate record in '{}'", collection));
        }
    }
    AppError::DatabaseError(format!("Failed to insert into '{}': {}", collection, err))
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn insert(
        &self,
        collection: Collection,
        fields: Map<String, Value>,
        created_at: DateTime<Utc>,
    ) -> AppResult<String> {
        let id = Uuid::new_v4().to_string();
        let data = serde_json::to_string(&fields)?;

        sqlx::query("INSERT INTO documents (collection, id, created_at, data) VALUES (?, ?, ?, ?)")
            .bind(collection.as_str())
            .bind(&id)
            .bind(created_at.timestamp_millis())
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(collection, e))?;

        debug!("Inserted {} {}", collection, id);
        Ok(id)
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> AppResult<Option<StoredDocument>> {
        let row = sqlx::query(
            "SELECT id, created_at, data FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to get {} {}: {}", collection, id, e))
        })?;

        row.map(|row| row_to_document(collection, row)).transpose()
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
        order: DocumentOrder,
    ) -> AppResult<Vec<StoredDocument>> {
        let mut qb = QueryBuilder::<Sqlite>::new(SELECT_DOCUMENTS);
        Self::push_filter(&mut qb, collection, filter);
        match order {
            DocumentOrder::Insertion => qb.push(" ORDER BY seq ASC"),
            DocumentOrder::NewestFirst => qb.push(" ORDER BY created_at DESC, seq DESC"),
        };

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to query {}: {}", collection, e))
            })?;

        rows.into_iter()
            .map(|row| row_to_document(collection, row))
            .collect()
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
    ) -> AppResult<Option<StoredDocument>> {
        let mut qb = QueryBuilder::<Sqlite>::new(SELECT_DOCUMENTS);
        Self::push_filter(&mut qb, collection, filter);
        qb.push(" ORDER BY seq ASC LIMIT 1");

        let row = qb
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to query {}: {}", collection, e))
            })?;

        row.map(|row| row_to_document(collection, row)).transpose()
    }

    async fn count(&self, collection: Collection, filter: &DocumentFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM documents");
        Self::push_filter(&mut qb, collection, filter);

        let count = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to count {}: {}", collection, e))
            })?;
        Ok(count as u64)
    }

    async fn ensure_unique_index(&self, collection: Collection, fields: &[&str]) -> AppResult<()> {
        if fields.is_empty() {
            return Err(AppError::Validation("a unique index needs at least one field".to_string()));
        }
        if let Some(bad) = fields.iter().find(|field| !FIELD_NAME.is_match(field)) {
            return Err(AppError::Validation(format!("invalid index field name {:?}", bad)));
        }

        // DDL cannot take bound parameters; names are validated above.
        let columns = fields
            .iter()
            .map(|field| format!("json_extract(data, '{}')", json_path(field)))
            .collect::<Vec<_>>()
            .join(", ");
        let statement = format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_{collection}_unique_{name} ON documents ({columns}) WHERE collection = '{collection}'",
            collection = collection.as_str(),
            name = fields.join("_"),
            columns = columns,
        );

        sqlx::query(&statement)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to create unique index on {}: {}",
                    collection, e
                ))
            })?;
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Database health check failed: {}", e)))?;
        Ok(())
    }

    async fn list_collections(&self) -> AppResult<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT collection FROM documents ORDER BY collection")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list collections: {}", e)))?;

        Ok(rows.into_iter().map(|row| row.get("collection")).collect())
    }

    fn database_name(&self) -> &str {
        &self.name
    }
}
