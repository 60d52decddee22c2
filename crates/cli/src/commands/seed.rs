//! Catalog seed files.
//!
//! A seed file is YAML with a list of category names and a list of products:
//!
//! ```yaml
//! categories:
//!   - electronics
//! products:
//!   - title: WD 2TB Elements Portable External Hard Drive
//!     price: "64.00"
//!     category: electronics
//!     rating: { rate: 3.3, count: 203 }
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use shopfront::catalog::{DocumentCatalog, ProductDraft};
use shopfront::config::ShopConfig;
use shopfront::documents::MemoryDocumentStore;
use tracing::{error, info};

use super::CommandError;

/// Catalog bundled with the binary, used when no seed file is given.
pub const BUNDLED_CATALOG: &str = include_str!("../../data/catalog.yaml");

/// Parsed seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub products: Vec<ProductDraft>,
}

impl SeedFile {
    /// Parse seed YAML.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Yaml` if the content is not a valid seed file.
    pub fn parse(content: &str) -> Result<Self, CommandError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Read and parse a seed file from disk.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Io` if the file cannot be read and
    /// `CommandError::Yaml` if it does not parse.
    pub async fn read(path: &Path) -> Result<Self, CommandError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CommandError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Self::parse(&content)
    }

    /// Every problem with the file, one message per offending entry.
    #[must_use]
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (i, name) in self.categories.iter().enumerate() {
            if name.trim().is_empty() {
                problems.push(format!("categories[{i}]: category name is required"));
            }
        }
        for (i, product) in self.products.iter().enumerate() {
            if let Err(e) = product.validate() {
                problems.push(format!("products[{i}]: {e}"));
            }
            if !product.category.is_empty() && !self.categories.contains(&product.category) {
                problems.push(format!(
                    "products[{i}]: category '{}' is not listed under categories",
                    product.category
                ));
            }
        }
        problems
    }

    /// Write the categories and products to `catalog`.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Store` if a write fails.
    pub async fn load(self, catalog: &DocumentCatalog) -> Result<(usize, usize), CommandError> {
        let categories = catalog.seed_categories(&self.categories).await?;
        let products = catalog.seed_products(self.products).await?;
        Ok((categories, products))
    }
}

/// Validate a seed file and dry-run it against an in-memory catalog.
///
/// # Errors
///
/// Returns an error if the file cannot be read, does not parse, fails
/// validation, or cannot be loaded.
pub async fn check(file_path: &str, config: &ShopConfig) -> Result<(), CommandError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading seed file");

    let seed = SeedFile::read(path).await?;
    info!(
        categories = seed.categories.len(),
        products = seed.products.len(),
        "Parsed seed file"
    );

    let problems = seed.problems();
    if !problems.is_empty() {
        error!("Seed file validation failed:");
        for problem in &problems {
            error!("  - {problem}");
        }
        return Err(CommandError::Validation(problems.len()));
    }

    let store = MemoryDocumentStore::new();
    let catalog = DocumentCatalog::new(Arc::new(store), &config.catalog);
    let (categories, products) = seed.load(&catalog).await?;

    info!("Seed file is valid");
    info!("  Categories: {categories}");
    info!("  Products: {products}");
    Ok(())
}
