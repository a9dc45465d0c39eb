// Diagnostics - store reachability report that never fails the request

use serde::Serialize;
use std::sync::Arc;

use crate::{config::DatabaseConfig, infrastructure::document_store::DocumentStore};

const MAX_COLLECTIONS: usize = 10;
const MAX_ERROR_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticsReport {
    pub backend: String,
    pub database: String,
    pub database_url: Option<String>,
    pub database_name: Option<String>,
    pub connection_status: String,
    pub collections: Vec<String>,
}

impl Default for DiagnosticsReport {
    fn default() -> Self {
        Self {
            backend: "✅ Running".to_string(),
            database: "❌ Not Available".to_string(),
            database_url: None,
            database_name: None,
            connection_status: "Not Connected".to_string(),
            collections: Vec::new(),
        }
    }
}

fn truncate_error(err: impl ToString) -> String {
    err.to_string().chars().take(MAX_ERROR_CHARS).collect()
}

fn presence(value: &Option<String>) -> String {
    if value.is_some() {
        "✅ Set".to_string()
    } else {
        "❌ Not Set".to_string()
    }
}

/// Probe the store and describe what was found. Store failures become report fields.
pub async fn run_diagnostics(
    store: &Arc<dyn DocumentStore>,
    database: &DatabaseConfig,
) -> DiagnosticsReport {
    let mut report = DiagnosticsReport::default();

    match store.ping().await {
        Ok(()) => {
            report.database = "✅ Available".to_string();
            report.connection_status = "Connected".to_string();

            match store.list_collections().await {
                Ok(mut collections) => {
                    collections.truncate(MAX_COLLECTIONS);
                    report.collections = collections;
                    report.database = "✅ Connected & Working".to_string();
                }
                Err(e) => {
                    report.database = format!("⚠️  Connected but Error: {}", truncate_error(e));
                }
            }
        }
        Err(e) => {
            report.database = format!("❌ Error: {}", truncate_error(e));
        }
    }

    report.database_url = Some(presence(&database.url));
    report.database_name = Some(presence(&database.name));
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppResult};
    use crate::infrastructure::document_store::{
        Collection, DocumentFilter, DocumentOrder, StoredDocument,
    };
    use crate::infrastructure::sqlite_document_store::SqliteDocumentStore;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use serde_json::{json, Map, Value};

    // Store whose every call fails
    struct UnreachableStore;

    #[async_trait]
    impl DocumentStore for UnreachableStore {
        async fn insert(
            &self,
            _: Collection,
            _: Map<String, Value>,
            _: DateTime<Utc>,
        ) -> AppResult<String> {
            Err(AppError::DatabaseError("down".into()))
        }
        async fn find_by_id(&self, _: Collection, _: &str) -> AppResult<Option<StoredDocument>> {
            Err(AppError::DatabaseError("down".into()))
        }
        async fn find(
            &self,
            _: Collection,
            _: &DocumentFilter,
            _: DocumentOrder,
        ) -> AppResult<Vec<StoredDocument>> {
            Err(AppError::DatabaseError("down".into()))
        }
        async fn find_one(
            &self,
            _: Collection,
            _: &DocumentFilter,
        ) -> AppResult<Option<StoredDocument>> {
            Err(AppError::DatabaseError("down".into()))
        }
        async fn count(&self, _: Collection, _: &DocumentFilter) -> AppResult<u64> {
            Err(AppError::DatabaseError("down".into()))
        }
        async fn ensure_unique_index(&self, _: Collection, _: &[&str]) -> AppResult<()> {
            Err(AppError::DatabaseError("down".into()))
        }
        async fn ping(&self) -> AppResult<()> {
            Err(AppError::DatabaseError(
                "connection refused while talking to the database server at localhost".into(),
            ))
        }
        async fn list_collections(&self) -> AppResult<Vec<String>> {
            Err(AppError::DatabaseError("down".into()))
        }
        fn database_name(&self) -> &str {
            "unreachable"
        }
    }

    #[tokio::test]
    async fn test_reports_working_store() {
        let sqlite = SqliteDocumentStore::new_in_memory().await.unwrap();
        sqlite
            .insert(
                Collection::Idea,
                json!({"title": "t"}).as_object().cloned().unwrap(),
                Utc::now(),
            )
            .await
            .unwrap();
        let store: Arc<dyn DocumentStore> = Arc::new(sqlite);

        let database = DatabaseConfig {
            url: Some("sqlite::memory:".into()),
            name: None,
        };
        let report = run_diagnostics(&store, &database).await;

        assert_eq!(report.database, "✅ Connected & Working");
        assert_eq!(report.connection_status, "Connected");
        assert_eq!(report.collections, vec!["idea"]);
        assert_eq!(report.database_url.as_deref(), Some("✅ Set"));
        assert_eq!(report.database_name.as_deref(), Some("❌ Not Set"));
    }

    #[tokio::test]
    async fn test_captures_store_failure() {
        let store: Arc<dyn DocumentStore> = Arc::new(UnreachableStore);
        let report = run_diagnostics(&store, &DatabaseConfig::default()).await;

        assert_eq!(report.backend, "✅ Running");
        assert_eq!(report.connection_status, "Not Connected");
        assert!(report.collections.is_empty());

        let detail = report.database.strip_prefix("❌ Error: ").unwrap();
        assert_eq!(detail.chars().count(), 50);
    }
}
