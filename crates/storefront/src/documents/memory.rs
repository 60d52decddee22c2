//! In-process document store.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use shopfront_core::DocumentId;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{Direction, Document, DocumentStore, Query, StoredDocument, compare_values};
use crate::error::BackendError;

struct Entry {
    id: DocumentId,
    data: Document,
    /// Insertion sequence, used to break ties between equal sort keys.
    seq: u64,
}

#[derive(Default)]
struct MemoryInner {
    collections: RwLock<HashMap<String, Vec<Entry>>>,
    next_seq: AtomicU64,
    offline: AtomicBool,
    latency: RwLock<Option<Duration>>,
}

/// A [`DocumentStore`] that keeps every collection in memory.
///
/// Cheaply cloneable; clones share the same data. The store can be switched
/// offline to exercise the callers' failure paths, and given an artificial
/// round-trip latency to exercise their timeouts.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<MemoryInner>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with `BackendError::Unavailable`
    /// (`true`) or succeed again (`false`).
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay every subsequent operation by `latency`.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        *self.inner.latency.write().await = latency;
    }

    /// Number of documents in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.inner
            .collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }

    /// Returns `true` if `collection` holds no documents.
    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }

    async fn round_trip(&self) -> Result<(), BackendError> {
        let latency = *self.inner.latency.read().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable(
                "document store is offline".to_string(),
            ));
        }
        Ok(())
    }

    fn next_seq(&self) -> u64 {
        self.inner.next_seq.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    #[instrument(skip(self, data))]
    async fn create(&self, collection: &str, data: Document) -> Result<DocumentId, BackendError> {
        self.round_trip().await?;
        let id = DocumentId::new(Uuid::new_v4().simple().to_string());
        let seq = self.next_seq();
        self.inner
            .collections
            .write()
            .await
            .entry(collection.to_owned())
            .or_default()
            .push(Entry {
                id: id.clone(),
                data,
                seq,
            });
        debug!(%id, "Document created");
        Ok(id)
    }

    #[instrument(skip(self, data))]
    async fn set(
        &self,
        collection: &str,
        id: &DocumentId,
        data: Document,
    ) -> Result<(), BackendError> {
        self.round_trip().await?;
        let seq = self.next_seq();
        let mut collections = self.inner.collections.write().await;
        let entries = collections.entry(collection.to_owned()).or_default();
        if let Some(entry) = entries.iter_mut().find(|e| &e.id == id) {
            entry.data = data;
        } else {
            entries.push(Entry {
                id: id.clone(),
                data,
                seq,
            });
        }
        Ok(())
    }

    #[instrument(skip(self, changes))]
    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        changes: Document,
    ) -> Result<(), BackendError> {
        self.round_trip().await?;
        let mut collections = self.inner.collections.write().await;
        let entry = collections
            .get_mut(collection)
            .and_then(|entries| entries.iter_mut().find(|e| &e.id == id))
            .ok_or_else(|| BackendError::DocumentNotFound {
                collection: collection.to_owned(),
                id: id.to_string(),
            })?;
        entry.data.extend(changes);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<StoredDocument>, BackendError> {
        self.round_trip().await?;
        let collections = self.inner.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|entries| entries.iter().find(|e| &e.id == id))
            .map(|e| StoredDocument {
                id: e.id.clone(),
                data: e.data.clone(),
            }))
    }

    #[instrument(skip(self))]
    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool, BackendError> {
        self.round_trip().await?;
        let mut collections = self.inner.collections.write().await;
        let Some(entries) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = entries.len();
        entries.retain(|e| &e.id != id);
        Ok(entries.len() < before)
    }

    #[instrument(skip(self), fields(collection = %query.collection))]
    async fn query(&self, query: &Query) -> Result<Vec<StoredDocument>, BackendError> {
        self.round_trip().await?;
        let collections = self.inner.collections.read().await;
        let Some(entries) = collections.get(&query.collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&Entry> = entries.iter().filter(|e| query.matches(&e.data)).collect();

        if let Some((field, direction)) = &query.order_by {
            matched.sort_by(|a, b| {
                let by_field = match (a.data.get(field), b.data.get(field)) {
                    (Some(x), Some(y)) => compare_values(x, y),
                    _ => std::cmp::Ordering::Equal,
                };
                let ordering = by_field.then(a.seq.cmp(&b.seq));
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(matched
            .into_iter()
            .take(limit)
            .map(|e| StoredDocument {
                id: e.id.clone(),
                data: e.data.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = MemoryDocumentStore::new();
        let id = store
            .create("products", doc(json!({ "title": "Backpack" })))
            .await
            .unwrap();

        let found = store.get("products", &id).await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.data.get("title"), Some(&json!("Backpack")));
        assert!(store.get("products", &DocumentId::new("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_merges_and_requires_existing() {
        let store = MemoryDocumentStore::new();
        let id = store
            .create("users", doc(json!({ "name": "Ann", "email": "ann@x.io" })))
            .await
            .unwrap();

        store
            .update("users", &id, doc(json!({ "name": "Annie" })))
            .await
            .unwrap();
        let found = store.get("users", &id).await.unwrap().unwrap();
        assert_eq!(found.data.get("name"), Some(&json!("Annie")));
        assert_eq!(found.data.get("email"), Some(&json!("ann@x.io")));

        let missing = store
            .update("users", &DocumentId::new("ghost"), doc(json!({ "name": "x" })))
            .await;
        assert!(matches!(missing, Err(BackendError::DocumentNotFound { .. })));
    }

    #[tokio::test]
    async fn test_query_orders_descending_with_limit() {
        let store = MemoryDocumentStore::new();
        for (user, at) in [("u1", 10), ("u2", 20), ("u1", 30), ("u1", 20)] {
            store
                .create("orders", doc(json!({ "userId": user, "createdAt": at })))
                .await
                .unwrap();
        }

        let query = Query::collection("orders")
            .where_eq("userId", "u1")
            .order_by("createdAt", Direction::Descending);
        let all = store.query(&query).await.unwrap();
        let stamps: Vec<_> = all.iter().map(|d| d.data["createdAt"].clone()).collect();
        assert_eq!(stamps, vec![json!(30), json!(20), json!(10)]);

        let latest = store.query(&query.clone().limit(1)).await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].data["createdAt"], json!(30));
    }

    #[tokio::test]
    async fn test_equal_keys_newest_insert_first_when_descending() {
        let store = MemoryDocumentStore::new();
        let first = store
            .create("orders", doc(json!({ "createdAt": 5 })))
            .await
            .unwrap();
        let second = store
            .create("orders", doc(json!({ "createdAt": 5 })))
            .await
            .unwrap();

        let query = Query::collection("orders").order_by("createdAt", Direction::Descending);
        let ids: Vec<_> = store
            .query(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryDocumentStore::new();
        let id = store.create("products", Document::new()).await.unwrap();
        assert!(store.delete("products", &id).await.unwrap());
        assert!(!store.delete("products", &id).await.unwrap());
        assert!(store.is_empty("products").await);
    }

    #[tokio::test]
    async fn test_offline_store_fails_every_operation() {
        let store = MemoryDocumentStore::new();
        store.set_offline(true);
        let err = store.create("orders", Document::new()).await.unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(_)));
        assert!(store.query(&Query::collection("orders")).await.is_err());

        store.set_offline(false);
        assert!(store.create("orders", Document::new()).await.is_ok());
        assert_eq!(store.len("orders").await, 1);
    }
}
