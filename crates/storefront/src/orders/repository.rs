//! Order persistence in the `orders` collection.

use std::sync::Arc;

use shopfront_core::{OrderId, UserId};
use tracing::instrument;

use super::{OrderRecord, OrderSnapshot};
use crate::documents::{Direction, DocumentStore, Query, StoredDocument, encode};
use crate::error::BackendError;

const ORDERS: &str = "orders";

/// Reads and writes order documents.
#[derive(Clone)]
pub struct OrderRepository {
    store: Arc<dyn DocumentStore>,
}

impl OrderRepository {
    /// Create a repository over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn by_user(user_id: &UserId) -> Query {
        Query::collection(ORDERS)
            .where_eq("userId", user_id.as_str())
            .order_by("createdAt", Direction::Descending)
    }

    fn decode(doc: &StoredDocument) -> Result<OrderRecord, BackendError> {
        Ok(OrderRecord {
            id: OrderId::from(doc.id.clone()),
            order: doc.decode()?,
        })
    }

    /// Write a new order document.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the write fails.
    #[instrument(skip(self, order), fields(order_number = %order.order_number))]
    pub async fn insert(&self, order: OrderSnapshot) -> Result<OrderRecord, BackendError> {
        let id = self.store.create(ORDERS, encode(&order)?).await?;
        Ok(OrderRecord {
            id: OrderId::from(id),
            order,
        })
    }

    /// The user's most recent order, if any.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the query fails or a document is malformed.
    #[instrument(skip(self))]
    pub async fn latest_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<OrderRecord>, BackendError> {
        self.store
            .query(&Self::by_user(user_id).limit(1))
            .await?
            .first()
            .map(Self::decode)
            .transpose()
    }

    /// Every order for the user, newest first.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the query fails or a document is malformed.
    #[instrument(skip(self))]
    pub async fn all_for_user(&self, user_id: &UserId) -> Result<Vec<OrderRecord>, BackendError> {
        self.store
            .query(&Self::by_user(user_id))
            .await?
            .iter()
            .map(Self::decode)
            .collect()
    }

    /// Delete every order for the user, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the query or a delete fails. Orders
    /// deleted before the failure stay deleted.
    #[instrument(skip(self))]
    pub async fn delete_all_for_user(&self, user_id: &UserId) -> Result<usize, BackendError> {
        let query = Query::collection(ORDERS).where_eq("userId", user_id.as_str());
        let mut deleted = 0;
        for doc in self.store.query(&query).await? {
            if self.store.delete(ORDERS, &doc.id).await? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, Utc};
    use shopfront_core::{Email, Price, ProductId};

    use super::*;
    use crate::cart::{CartProduct, CartState};
    use crate::documents::MemoryDocumentStore;
    use crate::identity::CurrentUser;

    fn user(id: &str) -> CurrentUser {
        CurrentUser {
            id: UserId::new(id),
            email: Email::parse(&format!("{id}@example.com")).unwrap(),
        }
    }

    fn snapshot(user_id: &str, minutes_ago: i64) -> OrderSnapshot {
        let mut cart = CartState::default();
        cart.add_item(CartProduct {
            product_id: ProductId::new("p"),
            title: "P".to_string(),
            unit_price: Price::from_cents(100).unwrap(),
            image_url: String::new(),
        });
        OrderSnapshot::capture(&cart, &user(user_id), Utc::now() - Duration::minutes(minutes_ago))
            .unwrap()
    }

    #[tokio::test]
    async fn test_history_is_per_user_newest_first() {
        let repo = OrderRepository::new(Arc::new(MemoryDocumentStore::new()));
        let old = repo.insert(snapshot("u1", 30)).await.unwrap();
        let new = repo.insert(snapshot("u1", 5)).await.unwrap();
        repo.insert(snapshot("u2", 1)).await.unwrap();

        let history = repo.all_for_user(&UserId::new("u1")).await.unwrap();
        assert_eq!(history, vec![new.clone(), old]);

        let latest = repo.latest_for_user(&UserId::new("u1")).await.unwrap();
        assert_eq!(latest, Some(new));
        assert!(repo
            .latest_for_user(&UserId::new("nobody"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_all_for_user() {
        let store = MemoryDocumentStore::new();
        let repo = OrderRepository::new(Arc::new(store.clone()));
        repo.insert(snapshot("u1", 2)).await.unwrap();
        repo.insert(snapshot("u1", 1)).await.unwrap();
        repo.insert(snapshot("u2", 1)).await.unwrap();

        assert_eq!(repo.delete_all_for_user(&UserId::new("u1")).await.unwrap(), 2);
        assert!(repo.all_for_user(&UserId::new("u1")).await.unwrap().is_empty());
        assert_eq!(store.len(ORDERS).await, 1);
    }
}
