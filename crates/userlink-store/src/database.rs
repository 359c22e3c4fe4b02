//! Flat JSON document management.
//!
//! The [`Database`] owns one JSON object whose top-level arrays are the
//! record collections. Every mutation works on a copy of the document,
//! rewrites the whole file and only then swaps the copy in, so a failed
//! write leaves the in-memory view unchanged.
//!
//! An in-memory database (no backing file) stands in for the browser-side
//! store variant and is what most tests use.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::models::DEFAULT_COLLECTIONS;
use crate::query::{field_equals, scalar_text, Query};

type Document = Map<String, Value>;

/// A JSON document acting as a record store.
pub struct Database {
    path: Option<PathBuf>,
    doc: Mutex<Document>,
}

impl Database {
    /// Open (or create) the document at `path`.
    ///
    /// A missing file is created with the default empty collections.
    pub async fn open_at(path: &Path) -> Result<Self> {
        let doc = match fs::read_to_string(path).await {
            Ok(raw) => parse_document(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "creating initial database");
                let doc = default_document();
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).await?;
                }
                write_document(path, &doc).await?;
                doc
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            path = %path.display(),
            collections = doc.len(),
            "opened database"
        );

        Ok(Self {
            path: Some(path.to_path_buf()),
            doc: Mutex::new(doc),
        })
    }

    /// A database that lives only in memory.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            doc: Mutex::new(default_document()),
        }
    }

    /// Names of every top-level collection.
    pub async fn resources(&self) -> Vec<String> {
        let doc = self.doc.lock().await;
        doc.iter()
            .filter(|(_, v)| v.is_array())
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub async fn list(&self, resource: &str, query: &Query) -> Result<Vec<Value>> {
        let doc = self.doc.lock().await;
        let records = collection(&doc, resource)?;
        Ok(query.apply(records))
    }

    pub async fn get(&self, resource: &str, id: &str) -> Result<Value> {
        let doc = self.doc.lock().await;
        let records = collection(&doc, resource)?;
        records
            .iter()
            .find(|r| has_id(r, id))
            .cloned()
            .ok_or_else(|| not_found(resource, id))
    }

    /// Append a record, assigning `id` and `createdAt` when absent.
    ///
    /// A caller-supplied id must not already be present in the collection.
    pub async fn create(&self, resource: &str, body: Value) -> Result<Value> {
        let mut record = into_object(body)?;
        let supplied = record.get("id").and_then(scalar_text).map(Cow::into_owned);
        let id = match supplied {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                record.insert("id".into(), Value::String(id.clone()));
                id
            }
        };
        if record.get("createdAt").map_or(true, Value::is_null) {
            record.insert("createdAt".into(), Value::String(timestamp()));
        }
        let record = Value::Object(record);

        self.mutate(resource, |records| {
            if records.iter().any(|r| has_id(r, &id)) {
                return Err(StoreError::Conflict {
                    resource: resource.to_string(),
                    id,
                });
            }
            records.push(record.clone());
            Ok(record)
        })
        .await
    }

    /// Replace a whole record. The id from the path always wins.
    pub async fn replace(&self, resource: &str, id: &str, body: Value) -> Result<Value> {
        let mut record = into_object(body)?;
        self.mutate(resource, |records| {
            let slot = find_mut(records, resource, id)?;
            if let Some(existing) = slot.get("id") {
                record.insert("id".into(), existing.clone());
            }
            *slot = Value::Object(record);
            Ok(slot.clone())
        })
        .await
    }

    /// Shallow-merge `body` into the record's top-level fields.
    pub async fn merge(&self, resource: &str, id: &str, body: Value) -> Result<Value> {
        let patch = into_object(body)?;
        self.mutate(resource, |records| {
            let slot = find_mut(records, resource, id)?;
            if let Some(fields) = slot.as_object_mut() {
                for (key, value) in patch {
                    if key != "id" {
                        fields.insert(key, value);
                    }
                }
            }
            Ok(slot.clone())
        })
        .await
    }

    /// Remove a record, returning it.
    pub async fn delete(&self, resource: &str, id: &str) -> Result<Value> {
        self.mutate(resource, |records| {
            let index = records
                .iter()
                .position(|r| has_id(r, id))
                .ok_or_else(|| not_found(resource, id))?;
            Ok(records.remove(index))
        })
        .await
    }

    /// Remove every record whose `field` equals `value`, returning the count.
    pub async fn delete_where(&self, resource: &str, field: &str, value: &str) -> Result<usize> {
        self.mutate(resource, |records| {
            let before = records.len();
            records.retain(|r| !field_equals(r, field, value));
            Ok(before - records.len())
        })
        .await
    }

    async fn mutate<T, F>(&self, resource: &str, apply: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Value>) -> Result<T>,
    {
        let mut doc = self.doc.lock().await;
        let mut next = doc.clone();
        let records = next
            .get_mut(resource)
            .and_then(Value::as_array_mut)
            .ok_or_else(|| StoreError::UnknownResource(resource.to_string()))?;

        let out = apply(records)?;

        if let Some(path) = &self.path {
            write_document(path, &next).await?;
            tracing::debug!(resource, path = %path.display(), "saved database");
        }
        *doc = next;
        Ok(out)
    }
}

/// Decode a stored record into one of the typed models.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(record: Value) -> Result<T> {
    Ok(serde_json::from_value(record)?)
}

pub(crate) fn decode_all<T: serde::de::DeserializeOwned>(records: Vec<Value>) -> Result<Vec<T>> {
    records.into_iter().map(decode).collect()
}

/// RFC 3339 UTC timestamp with millisecond precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn default_document() -> Document {
    DEFAULT_COLLECTIONS
        .iter()
        .map(|name| (name.to_string(), Value::Array(Vec::new())))
        .collect()
}

fn parse_document(raw: &str) -> Result<Document> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(doc) => Ok(doc),
        other => Err(StoreError::Corrupt(format!(
            "expected a JSON object at the top level, found {}",
            json_kind(&other)
        ))),
    }
}

async fn write_document(path: &Path, doc: &Document) -> Result<()> {
    let raw = serde_json::to_string_pretty(doc)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, raw).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

fn collection<'a>(doc: &'a Document, resource: &str) -> Result<&'a Vec<Value>> {
    doc.get(resource)
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::UnknownResource(resource.to_string()))
}

fn find_mut<'a>(records: &'a mut [Value], resource: &str, id: &str) -> Result<&'a mut Value> {
    records
        .iter_mut()
        .find(|r| has_id(r, id))
        .ok_or_else(|| not_found(resource, id))
}

fn has_id(record: &Value, id: &str) -> bool {
    field_equals(record, "id", id)
}

fn not_found(resource: &str, id: &str) -> StoreError {
    StoreError::NotFound {
        resource: resource.to_string(),
        id: id.to_string(),
    }
}

fn into_object(body: Value) -> Result<Map<String, Value>> {
    match body {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::InvalidRecord(format!(
            "expected a JSON object, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn create_assigns_id_and_timestamp() {
        let db = Database::in_memory();
        let a = db.create("users", json!({ "name": "Ada" })).await.unwrap();
        let b = db.create("users", json!({ "name": "Ada" })).await.unwrap();

        assert!(a["id"].is_string());
        assert_ne!(a["id"], b["id"]);
        let created = a["createdAt"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(created).is_ok());
    }

    #[tokio::test]
    async fn create_keeps_caller_supplied_fields() {
        let db = Database::in_memory();
        let rec = db
            .create(
                "users",
                json!({ "id": "u-1", "name": "Ada", "createdAt": "2024-01-01T00:00:00.000Z" }),
            )
            .await
            .unwrap();
        assert_eq!(rec["id"], "u-1");
        assert_eq!(rec["createdAt"], "2024-01-01T00:00:00.000Z");
    }

    #[tokio::test]
    async fn create_rejects_duplicate_ids() {
        let db = Database::in_memory();
        db.create("users", json!({ "id": "u1", "name": "Ada" }))
            .await
            .unwrap();

        let err = db
            .create("users", json!({ "id": "u1", "name": "Grace" }))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        // Numeric and string forms of the same id collide too.
        db.create("files", json!({ "id": 7 })).await.unwrap();
        assert!(db.create("files", json!({ "id": "7" })).await.is_err());

        let matching = db
            .list("users", &Query::new().filter("id", "u1"))
            .await
            .unwrap();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0]["name"], "Ada");
    }

    #[tokio::test]
    async fn create_rejects_non_objects() {
        let db = Database::in_memory();
        let err = db.create("users", json!([1, 2])).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord(_)));
    }

    #[tokio::test]
    async fn unknown_resource_is_not_found() {
        let db = Database::in_memory();
        let err = db.list("widgets", &Query::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownResource(_)));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn merge_is_shallow_and_keeps_id() {
        let db = Database::in_memory();
        db.create("assistants", json!({ "id": "a1", "userId": "u1" }))
            .await
            .unwrap();
        let merged = db
            .merge("assistants", "a1", json!({ "threadId": "t1", "id": "other" }))
            .await
            .unwrap();
        assert_eq!(merged["id"], "a1");
        assert_eq!(merged["userId"], "u1");
        assert_eq!(merged["threadId"], "t1");
    }

    #[tokio::test]
    async fn replace_drops_missing_fields() {
        let db = Database::in_memory();
        db.create("users", json!({ "id": "u1", "name": "Ada", "email": "a@b" }))
            .await
            .unwrap();
        let replaced = db
            .replace("users", "u1", json!({ "name": "Grace" }))
            .await
            .unwrap();
        assert_eq!(replaced, json!({ "id": "u1", "name": "Grace" }));
    }

    #[tokio::test]
    async fn delete_returns_removed_record() {
        let db = Database::in_memory();
        db.create("files", json!({ "id": "f1" })).await.unwrap();
        let removed = db.delete("files", "f1").await.unwrap();
        assert_eq!(removed["id"], "f1");
        assert!(db.get("files", "f1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn delete_where_filters_collection() {
        let db = Database::in_memory();
        for thread in ["t1", "t1", "t2"] {
            db.create("messages", json!({ "threadId": thread }))
                .await
                .unwrap();
        }
        let removed = db.delete_where("messages", "threadId", "t1").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(db.list("messages", &Query::new()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn numeric_ids_are_addressable() {
        let db = Database::in_memory();
        db.create("users", json!({ "id": 42, "name": "Ada" }))
            .await
            .unwrap();
        assert_eq!(db.get("users", "42").await.unwrap()["name"], "Ada");
    }

    #[tokio::test]
    async fn file_round_trip_persists_every_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");

        {
            let db = Database::open_at(&path).await.unwrap();
            assert!(path.exists());
            db.create("users", json!({ "id": "u1", "name": "Ada" }))
                .await
                .unwrap();
            db.merge("users", "u1", json!({ "assistantId": "a1" }))
                .await
                .unwrap();
        }

        let reopened = Database::open_at(&path).await.unwrap();
        let user = reopened.get("users", "u1").await.unwrap();
        assert_eq!(user["assistantId"], "a1");
        let mut resources = reopened.resources().await;
        resources.sort();
        assert_eq!(
            resources,
            vec!["assistants", "chat_threads", "files", "messages", "users"]
        );
    }

    #[tokio::test]
    async fn corrupt_document_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, "[]").unwrap();
        let err = Database::open_at(&path).await.err().unwrap();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
