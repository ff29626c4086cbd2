use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    conflict_message, matches, Document, DocumentStore, Filter, StoreError, UNIQUE_FIELDS,
};

type Collection = HashMap<Uuid, Document>;

/// In-process store with the same semantics as [`super::PgDocumentStore`].
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_unique(
    collection_name: &str,
    docs: &Collection,
    body: &Value,
    except: Option<Uuid>,
) -> Result<(), StoreError> {
    for (_, field) in UNIQUE_FIELDS.iter().filter(|(c, _)| *c == collection_name) {
        let Some(value) = body.get(*field) else {
            continue;
        };
        let taken = docs
            .values()
            .any(|doc| Some(doc.id) != except && doc.body.get(*field) == Some(value));
        if taken {
            return Err(StoreError::Conflict(conflict_message(collection_name, field)));
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: &str, body: Value) -> Result<Document, StoreError> {
        if !body.is_object() {
            return Err(StoreError::NotAnObject);
        }

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        check_unique(collection, docs, &body, None)?;

        let now = Utc::now();
        let doc = Document {
            id: Uuid::new_v4(),
            body,
            created_at: now,
            updated_at: now,
        };
        docs.insert(doc.id, doc.clone());
        Ok(doc)
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(&id))
            .cloned())
    }

    async fn find(&self, collection: &str, filter: Filter) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let mut found: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| matches(&doc.body, &filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn replace(
        &self,
        collection: &str,
        id: Uuid,
        body: Value,
    ) -> Result<Option<Document>, StoreError> {
        if !body.is_object() {
            return Err(StoreError::NotAnObject);
        }

        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(None);
        };
        if !docs.contains_key(&id) {
            return Ok(None);
        }
        check_unique(collection, docs, &body, Some(id))?;

        Ok(docs.get_mut(&id).map(|doc| {
            doc.body = body;
            doc.updated_at = Utc::now();
            doc.clone()
        }))
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .map(|docs| docs.remove(&id).is_some())
            .unwrap_or(false))
    }

    async fn delete_many(&self, collection: &str, filter: Filter) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|_, doc| !matches(&doc.body, &filter));
        Ok((before - docs.len()) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(&self) {}
}
