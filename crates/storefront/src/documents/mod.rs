//! Durable document store port.
//!
//! The storefront persists everything (orders, products, categories, user
//! profiles) in a managed document database. This module defines the narrow
//! contract the services rely on:
//!
//! - documents are JSON objects grouped into named collections
//! - `create` assigns a fresh document id
//! - queries support equality filters, a single order-by field and a limit
//!
//! Adapters implement [`DocumentStore`]; [`MemoryDocumentStore`] keeps
//! everything in process and backs the tests and the CLI demo.

mod memory;

pub use memory::MemoryDocumentStore;

use std::cmp::Ordering;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use shopfront_core::DocumentId;

use crate::error::BackendError;

/// Raw document body.
pub type Document = Map<String, Value>;

/// A document read back from a collection, with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Store-assigned document id.
    pub id: DocumentId,
    /// Document body.
    pub data: Document,
}

impl StoredDocument {
    /// Deserialize the body into a typed value.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Serialization` if the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, BackendError> {
        Ok(serde_json::from_value(Value::Object(self.data.clone()))?)
    }
}

/// Serialize a typed value into a document body.
///
/// # Errors
///
/// Returns `BackendError::Serialization` if `value` does not serialize to a
/// JSON object.
pub fn encode<T: Serialize>(value: &T) -> Result<Document, BackendError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(BackendError::Serialization(serde::ser::Error::custom(
            format!("expected a JSON object, got {other}"),
        ))),
    }
}

/// Sort direction for [`Query::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A collection query: equality filters, optional ordering, optional limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Collection to search.
    pub collection: String,
    /// `(field, value)` pairs that must all match exactly.
    pub filters: Vec<(String, Value)>,
    /// Field and direction to order by. Documents missing the field are excluded.
    pub order_by: Option<(String, Direction)>,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
}

impl Query {
    /// Start a query over `collection`.
    #[must_use]
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    /// Require `field == value`.
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// Order results by `field`.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    /// Return at most `limit` documents.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns `true` if `data` satisfies every filter and has the order-by field.
    #[must_use]
    pub fn matches(&self, data: &Document) -> bool {
        let filters_match = self
            .filters
            .iter()
            .all(|(field, value)| data.get(field) == Some(value));
        let has_order_field = self
            .order_by
            .as_ref()
            .is_none_or(|(field, _)| data.contains_key(field));
        filters_match && has_order_field
    }
}

/// Total order over the JSON values the store sorts on.
///
/// Numbers compare numerically and strings lexicographically. Values of
/// different kinds compare equal, leaving their relative order to the caller.
#[must_use]
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .unwrap_or_default()
                .total_cmp(&y.as_f64().unwrap_or_default()),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Durable document store abstraction.
///
/// Implementations must be safe to share between tasks. Every method may fail
/// with a [`BackendError`]; callers decide whether that is fatal.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document and return its generated id.
    async fn create(&self, collection: &str, data: Document) -> Result<DocumentId, BackendError>;

    /// Create or overwrite the document at `id`.
    async fn set(&self, collection: &str, id: &DocumentId, data: Document)
    -> Result<(), BackendError>;

    /// Merge `changes` into the existing document at `id`.
    ///
    /// Fails with `BackendError::DocumentNotFound` if the document does not exist.
    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        changes: Document,
    ) -> Result<(), BackendError>;

    /// Read the document at `id`.
    async fn get(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<StoredDocument>, BackendError>;

    /// Delete the document at `id`, returning whether it existed.
    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool, BackendError>;

    /// Run a query.
    async fn query(&self, query: &Query) -> Result<Vec<StoredDocument>, BackendError>;
}
