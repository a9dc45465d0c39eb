// Document Store - collection-oriented persistence contract
// Records are JSON field maps keyed by a store-generated id, stamped with a creation time

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::AppResult;

/// Named collections of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Idea,
    Comment,
    Vote,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Idea, Collection::Comment, Collection::Vote];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Idea => "idea",
            Collection::Comment => "comment",
            Collection::Vote => "vote",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record as held by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub collection: Collection,
    pub created_at: DateTime<Utc>,
    pub fields: Map<String, Value>,
}

/// Conjunction of string-field equalities plus an optional lower bound on `created_at`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    pub equals: Vec<(String, String)>,
    pub created_since: Option<DateTime<Utc>>,
}

impl DocumentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field_eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.equals.push((field.into(), value.into()));
        self
    }

    pub fn created_since(mut self, since: Option<DateTime<Utc>>) -> Self {
        self.created_since = since;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocumentOrder {
    /// Store-native order, which is insertion order.
    #[default]
    Insertion,
    /// `created_at` descending; records created in the same instant keep reverse insertion order.
    NewestFirst,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert `fields` into `collection` and return the generated id.
    /// Fails with `AppError::UniqueViolation` when a unique index rejects the record.
    async fn insert(
        &self,
        collection: Collection,
        fields: Map<String, Value>,
        created_at: DateTime<Utc>,
    ) -> AppResult<String>;

    async fn find_by_id(&self, collection: Collection, id: &str)
        -> AppResult<Option<StoredDocument>>;

    async fn find(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
        order: DocumentOrder,
    ) -> AppResult<Vec<StoredDocument>>;

    async fn find_one(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
    ) -> AppResult<Option<StoredDocument>>;

    async fn count(&self, collection: Collection, filter: &DocumentFilter) -> AppResult<u64>;

    /// Create a compound uniqueness constraint over `fields`. Repeated calls are no-ops.
    async fn ensure_unique_index(&self, collection: Collection, fields: &[&str]) -> AppResult<()>;

    /// Round-trip to the backing database.
    async fn ping(&self) -> AppResult<()>;

    /// Names of collections that currently hold records.
    async fn list_collections(&self) -> AppResult<Vec<String>>;

    fn database_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_builder() {
        let filter = DocumentFilter::new()
            .field_eq("idea_id", "abc")
            .field_eq("voter", "user_1")
            .created_since(None);
        assert_eq!(filter.equals.len(), 2);
        assert_eq!(filter.equals[1], ("voter".to_string(), "user_1".to_string()));
        assert!(filter.created_since.is_none());
    }

    #[test]
    fn test_collection_names() {
        let names: Vec<&str> = Collection::ALL.iter().map(Collection::as_str).collect();
        assert_eq!(names, vec!["idea", "comment", "vote"]);
    }
}
