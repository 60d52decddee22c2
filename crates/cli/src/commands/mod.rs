//! CLI command implementations.

pub mod catalog;
pub mod demo;
pub mod seed;

use shopfront::StoreError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A storefront operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A seed file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A seed file is not valid YAML for a catalog.
    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A seed file parsed but failed validation.
    #[error("{0} validation errors found")]
    Validation(usize),
}
