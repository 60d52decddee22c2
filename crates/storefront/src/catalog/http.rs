//! Catalog client for the public product-catalog HTTP API.
//!
//! Speaks the fakestoreapi.com dialect:
//!
//! - `GET /products`
//! - `GET /products/{id}`
//! - `GET /products/category/{name}`
//! - `GET /products/categories`
//!
//! Responses are cached using `moka`. Unknown product ids come back as a
//! 404 or as a 200 with an empty or `null` body; both map to `NotFound`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use shopfront_core::{Price, ProductId};
use tracing::{debug, instrument};
use url::Url;

use super::cache::{self, CacheKey, CacheValue, CatalogCache};
use super::{CatalogSource, CategoryFilter, Product, Rating};
use crate::config::CatalogConfig;
use crate::error::{BackendError, Result, StoreError};

/// Product as returned by the API. Ids are numeric on the wire.
#[derive(Debug, Deserialize)]
struct ApiProduct {
    id: u64,
    title: String,
    price: Price,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    image: String,
    #[serde(default)]
    rating: Rating,
}

impl From<ApiProduct> for Product {
    fn from(api: ApiProduct) -> Self {
        Self {
            id: ProductId::new(api.id.to_string()),
            title: api.title,
            price: api.price,
            description: api.description,
            category: api.category,
            image: api.image,
            rating: api.rating,
        }
    }
}

/// Client for the product-catalog API.
///
/// Cheaply cloneable; clones share the HTTP connection pool and cache.
#[derive(Clone)]
pub struct HttpCatalog {
    inner: Arc<HttpCatalogInner>,
}

struct HttpCatalogInner {
    client: reqwest::Client,
    base_url: Url,
    cache: CatalogCache,
}

impl HttpCatalog {
    /// Create a client for the API at `config.base_url`.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            inner: Arc::new(HttpCatalogInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                cache: cache::build(config.cache_capacity, config.cache_ttl),
            }),
        }
    }

    /// Build an endpoint URL from path segments. Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> std::result::Result<Url, BackendError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                BackendError::Unavailable(format!(
                    "catalog base URL cannot take a path: {}",
                    self.inner.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET `url` and decode the body. Returns `Ok(None)` for a 404 or an
    /// empty/`null` body.
    async fn fetch<T: DeserializeOwned>(&self, url: Url) -> std::result::Result<Option<T>, BackendError> {
        debug!(%url, "Catalog request");
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::Unavailable(format!(
                "rate limited, retry after {retry_after}s"
            )));
        }

        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Catalog API returned non-success status"
            );
            return Err(BackendError::Unavailable(format!(
                "HTTP {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        decode_body(&body)
    }
}

/// Decode a response body, treating an empty or `null` body as absent.
fn decode_body<T: DeserializeOwned>(body: &str) -> std::result::Result<Option<T>, BackendError> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    match serde_json::from_str(trimmed) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::error!(
                error = %e,
                body = %trimmed.chars().take(500).collect::<String>(),
                "Failed to parse catalog response"
            );
            Err(BackendError::Serialization(e))
        }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    #[instrument(skip(self), fields(category = %filter))]
    async fn list_products(&self, filter: &CategoryFilter) -> Result<Vec<Product>> {
        let key = CacheKey::Products(filter.clone());
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product listing");
            return Ok(products.as_ref().clone());
        }

        let url = match filter {
            CategoryFilter::All => self.endpoint(&["products"])?,
            CategoryFilter::Named(name) => self.endpoint(&["products", "category", name.as_str()])?,
        };
        let products: Vec<Product> = self
            .fetch::<Vec<ApiProduct>>(url)
            .await?
            .unwrap_or_default()
            .into_iter()
            .map(Product::from)
            .collect();

        self.inner
            .cache
            .insert(key, CacheValue::Products(Arc::new(products.clone())))
            .await;
        Ok(products)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: &ProductId) -> Result<Product> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&["products", id.as_str()])?;
        let product: Product = self
            .fetch::<ApiProduct>(url)
            .await?
            .map(Product::from)
            .ok_or_else(|| StoreError::NotFound(format!("product {id}")))?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<String>> {
        if let Some(CacheValue::Categories(names)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            return Ok(names.as_ref().clone());
        }

        let url = self.endpoint(&["products", "categories"])?;
        let mut names: Vec<String> = self.fetch(url).await?.unwrap_or_default();
        names.sort();
        names.dedup();

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::new(names.clone())),
            )
            .await;
        Ok(names)
    }
}
