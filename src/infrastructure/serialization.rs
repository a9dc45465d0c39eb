// Stored record -> transport representation

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::AppResult;
use crate::infrastructure::document_store::StoredDocument;

const TIMESTAMP_FIELDS: [&str; 2] = ["created_at", "updated_at"];

/// Expose the store id as `id` and render timestamps as ISO-8601 text.
pub fn serialize_doc(doc: StoredDocument) -> Map<String, Value> {
    let StoredDocument {
        id,
        created_at,
        mut fields,
        ..
    } = doc;

    fields.insert("id".to_string(), Value::String(id));
    fields.insert(
        "created_at".to_string(),
        Value::String(created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
    );

    // Timestamps written by other producers as epoch millis
    for key in TIMESTAMP_FIELDS {
        let rendered = match fields.get(key) {
            Some(Value::Number(millis)) => millis
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(|at| at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            _ => None,
        };
        if let Some(text) = rendered {
            fields.insert(key.to_string(), Value::String(text));
        }
    }

    fields
}

/// Serialize a stored record and read it back as a typed model.
pub fn decode_doc<T: DeserializeOwned>(doc: StoredDocument) -> AppResult<T> {
    Ok(serde_json::from_value(Value::Object(serialize_doc(doc)))?)
}
