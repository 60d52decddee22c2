//! Shopfront Core - Shared domain types.
//!
//! This crate provides the value types used across all Shopfront components:
//! - `shopfront` - Cart store, order capture workflow, catalog and account services
//! - `shopfront-cli` - Command-line tools for seeding and exercising the workflow
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no HTTP
//! clients. Every invariant that can be checked at construction time (a
//! non-negative price, a tax rate within `[0, 1]`, a well-formed email) is
//! checked here so the services above can rely on it.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, tax rates, emails and order numbers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
