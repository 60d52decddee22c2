//! Shopfront storefront library.
//!
//! The cart store, the order capture workflow, and the catalog and account
//! services around them. External collaborators (document database,
//! identity provider, product-catalog API) sit behind traits in
//! [`documents`], [`identity`] and [`catalog`].
//!
//! A typical session:
//!
//! ```no_run
//! # async fn demo() -> shopfront::error::Result<()> {
//! use std::sync::Arc;
//!
//! use shopfront::config::ShopConfig;
//! use shopfront::documents::MemoryDocumentStore;
//! use shopfront::identity::LocalIdentity;
//! use shopfront::session::ShopSession;
//!
//! let identity = Arc::new(LocalIdentity::signed_out());
//! let store = Arc::new(MemoryDocumentStore::new());
//! let session = ShopSession::start(&ShopConfig::default(), identity, store);
//!
//! let order = session.place_order().await?;
//! println!("placed {}", order.order_number);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod account;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod documents;
pub mod error;
pub mod identity;
pub mod orders;
pub mod session;
pub mod telemetry;

pub use error::{Result, StoreError};
