// Persistence helpers shared by the API and the seeder

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::infrastructure::document_store::{
    Collection, DocumentFilter, DocumentOrder, DocumentStore, StoredDocument,
};

/// Stamp `data` with the current time and insert it into `collection`.
/// Returns the new record's id.
pub async fn create_document<T>(
    store: &dyn DocumentStore,
    collection: Collection,
    data: &T,
) -> AppResult<String>
where
    T: Serialize + ?Sized,
{
    let fields = match serde_json::to_value(data)? {
        Value::Object(mut map) => {
            // Identity and creation time belong to the store
            map.remove("id");
            map.remove("created_at");
            map
        }
        other => {
            return Err(AppError::Validation(format!(
                "{} records must be objects, got {}",
                collection, other
            )))
        }
    };

    store.insert(collection, fields, Utc::now()).await
}

/// Every record in `collection`, in insertion order.
pub async fn get_documents(
    store: &dyn DocumentStore,
    collection: Collection,
) -> AppResult<Vec<StoredDocument>> {
    store
        .find(collection, &DocumentFilter::new(), DocumentOrder::Insertion)
        .await
}
