//! Catalog backed by the document store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use shopfront_core::ProductId;
use tracing::{debug, info, instrument};

use super::cache::{self, CacheKey, CacheValue, CatalogCache};
use super::{CatalogSource, CategoryFilter, Product, ProductDraft};
use crate::config::CatalogConfig;
use crate::documents::{Direction, DocumentStore, Query, StoredDocument, encode};
use crate::error::{Result, StoreError};

const PRODUCTS: &str = "products";
const CATEGORIES: &str = "categories";

/// Products and categories stored in the `products` and `categories`
/// collections.
///
/// Reads are cached; every write invalidates the cached listings. Cheaply
/// cloneable; clones share the store handle and cache.
#[derive(Clone)]
pub struct DocumentCatalog {
    store: Arc<dyn DocumentStore>,
    cache: CatalogCache,
}

impl DocumentCatalog {
    /// Create a catalog over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, config: &CatalogConfig) -> Self {
        Self {
            store,
            cache: cache::build(config.cache_capacity, config.cache_ttl),
        }
    }

    fn decode(doc: &StoredDocument) -> Result<Product> {
        let draft: ProductDraft = doc.decode()?;
        Ok(Product::from_draft(ProductId::from(doc.id.clone()), draft))
    }

    /// Drop every cached listing. Point lookups for untouched products are
    /// dropped too and simply refill on the next read.
    async fn invalidate(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    // =========================================================================
    // Administration
    // =========================================================================

    /// Add a product and return it with its new id.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailure` for an invalid draft and
    /// `PersistenceFailure` if the write fails.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn add_product(&self, draft: ProductDraft) -> Result<Product> {
        draft.validate()?;
        let mut data = encode(&draft)?;
        data.insert(
            "createdAt".to_string(),
            Value::from(Utc::now().timestamp_micros()),
        );

        let id = self.store.create(PRODUCTS, data).await?;
        self.invalidate().await;

        info!(product_id = %id, "Product added");
        Ok(Product::from_draft(ProductId::from(id), draft))
    }

    /// Replace the editable fields of an existing product.
    ///
    /// The remote write happens first; the cached copy is replaced only after
    /// it succeeds, so a failed update leaves every reader on the old product.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailure` for an invalid draft, `NotFound` if the
    /// product does not exist, and `PersistenceFailure` if the write fails.
    #[instrument(skip(self, draft), fields(product_id = %id))]
    pub async fn update_product(&self, id: &ProductId, draft: ProductDraft) -> Result<Product> {
        draft.validate()?;
        let changes = encode(&draft)?;
        self.store.update(PRODUCTS, &id.as_str().into(), changes).await?;

        let product = Product::from_draft(id.clone(), draft);
        self.invalidate().await;
        self.cache
            .insert(
                CacheKey::Product(id.clone()),
                CacheValue::Product(Box::new(product.clone())),
            )
            .await;

        info!("Product updated");
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist and
    /// `PersistenceFailure` if the delete fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<()> {
        let existed = self.store.delete(PRODUCTS, &id.as_str().into()).await?;
        self.invalidate().await;
        if !existed {
            return Err(StoreError::NotFound(format!("product {id}")));
        }
        info!("Product deleted");
        Ok(())
    }

    /// Bulk-load products, returning how many were written.
    ///
    /// Every draft is validated before anything is written.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailure` if any draft is invalid and
    /// `PersistenceFailure` if a write fails. Products written before a
    /// failing write are kept.
    pub async fn seed_products(&self, drafts: Vec<ProductDraft>) -> Result<usize> {
        for draft in &drafts {
            draft.validate()?;
        }
        let count = drafts.len();
        for draft in drafts {
            self.add_product(draft).await?;
        }
        info!(count, "Seeded products");
        Ok(count)
    }

    /// Bulk-load category names, returning how many were written.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailure` for a blank name and `PersistenceFailure`
    /// if a write fails.
    pub async fn seed_categories(&self, names: &[String]) -> Result<usize> {
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err(StoreError::ValidationFailure(
                "category name is required".to_string(),
            ));
        }
        for name in names {
            let mut data = crate::documents::Document::new();
            data.insert("name".to_string(), Value::from(name.trim()));
            self.store.create(CATEGORIES, data).await?;
        }
        self.invalidate().await;
        info!(count = names.len(), "Seeded categories");
        Ok(names.len())
    }
}

#[async_trait]
impl CatalogSource for DocumentCatalog {
    #[instrument(skip(self), fields(category = %filter))]
    async fn list_products(&self, filter: &CategoryFilter) -> Result<Vec<Product>> {
        let key = CacheKey::Products(filter.clone());
        if let Some(CacheValue::Products(products)) = self.cache.get(&key).await {
            debug!("Cache hit for product listing");
            return Ok(products.as_ref().clone());
        }
        if matches!(filter, CategoryFilter::Named(_)) {
            let all = self.cache.get(&CacheKey::Products(CategoryFilter::All)).await;
            if let Some(CacheValue::Products(products)) = all {
                debug!("Filtering cached full listing");
                return Ok(products
                    .iter()
                    .filter(|p| filter.accepts(&p.category))
                    .cloned()
                    .collect());
            }
        }

        let mut query = Query::collection(PRODUCTS).order_by("createdAt", Direction::Ascending);
        if let CategoryFilter::Named(name) = filter {
            query = query.where_eq("category", name.as_str());
        }
        let products = self
            .store
            .query(&query)
            .await?
            .iter()
            .map(Self::decode)
            .collect::<Result<Vec<_>>>()?;

        self.cache
            .insert(key, CacheValue::Products(Arc::new(products.clone())))
            .await;
        Ok(products)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: &ProductId) -> Result<Product> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let doc = self
            .store
            .get(PRODUCTS, &id.as_str().into())
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("product {id}")))?;
        let product = Self::decode(&doc)?;

        self.cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<String>> {
        if let Some(CacheValue::Categories(names)) = self.cache.get(&CacheKey::Categories).await {
            return Ok(names.as_ref().clone());
        }

        let query = Query::collection(CATEGORIES).order_by("name", Direction::Ascending);
        let mut names: Vec<String> = self
            .store
            .query(&query)
            .await?
            .into_iter()
            .filter_map(|doc| doc.data.get("name").and_then(Value::as_str).map(str::to_owned))
            .collect();
        names.dedup();

        self.cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::new(names.clone())),
            )
            .await;
        Ok(names)
    }
}
