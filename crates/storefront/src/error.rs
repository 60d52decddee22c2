//! Unified error handling with Sentry integration.
//!
//! Every fallible storefront operation returns [`StoreError`]. The variants are
//! the failure reasons a view has to tell apart: nobody is signed in, the thing
//! asked for does not exist, the backend could not be reached, or the input was
//! rejected. Cart mutations never fail and do not appear here.

use std::time::Duration;

use shopfront_core::{EmailError, PriceError};
use thiserror::Error;

use crate::identity::IdentityError;

/// Errors raised by a remote backend (document store or catalog API).
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend could not be reached or rejected the request.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the operation for the current identity.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The operation did not complete within the configured bound.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// A document targeted by an update does not exist.
    #[error("document {collection}/{id} does not exist")]
    DocumentNotFound {
        /// Collection that was searched.
        collection: String,
        /// Document id that was missing.
        id: String,
    },

    /// A document could not be converted to or from its typed form.
    #[error("malformed document: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No user identity has been established.
    #[error("not authenticated")]
    Unauthenticated,

    /// The requested order, product or profile does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A durable read or write failed (network, permission, timeout).
    #[error("persistence failure: {0}")]
    PersistenceFailure(BackendError),

    /// Input to a mutation was rejected.
    #[error("validation failed: {0}")]
    ValidationFailure(String),

    /// A checkout for this session is already awaiting persistence.
    #[error("a checkout is already in progress")]
    CheckoutInProgress,

    /// The identity provider rejected an operation.
    #[error("identity provider error: {0}")]
    Identity(#[from] IdentityError),
}

impl StoreError {
    /// Returns `true` if retrying the same operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::PersistenceFailure(_) | Self::CheckoutInProgress)
    }
}

impl From<BackendError> for StoreError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::DocumentNotFound { collection, id } => {
                Self::NotFound(format!("{collection}/{id}"))
            }
            other => Self::PersistenceFailure(other),
        }
    }
}

impl From<PriceError> for StoreError {
    fn from(err: PriceError) -> Self {
        Self::ValidationFailure(err.to_string())
    }
}

impl From<EmailError> for StoreError {
    fn from(err: EmailError) -> Self {
        Self::ValidationFailure(err.to_string())
    }
}

/// Result type alias for `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Capture a failure to Sentry if it is one an operator should see.
///
/// Persistence failures are reported; authentication, not-found and
/// validation failures are expected user-facing outcomes and are only logged.
pub fn report(err: &StoreError, operation: &str) {
    if matches!(err, StoreError::PersistenceFailure(_)) {
        let event_id = sentry::capture_error(err);
        tracing::error!(
            error = %err,
            operation,
            sentry_event_id = %event_id,
            "Storefront operation failed"
        );
    } else {
        tracing::debug!(error = %err, operation, "Storefront operation rejected");
    }
}

/// Set the Sentry user context from a user ID.
///
/// Call this after the identity provider reports a signed-in user.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::NotFound("orders for user u1".to_string());
        assert_eq!(err.to_string(), "not found: orders for user u1");

        let err = StoreError::ValidationFailure("price cannot be negative".to_string());
        assert_eq!(err.to_string(), "validation failed: price cannot be negative");
    }

    #[test]
    fn test_missing_document_maps_to_not_found() {
        let err: StoreError = BackendError::DocumentNotFound {
            collection: "products".to_string(),
            id: "p1".to_string(),
        }
        .into();
        assert!(matches!(err, StoreError::NotFound(ref what) if what == "products/p1"));
    }

    #[test]
    fn test_backend_errors_are_persistence_failures() {
        let err: StoreError = BackendError::Timeout(Duration::from_secs(10)).into();
        assert!(matches!(
            err,
            StoreError::PersistenceFailure(BackendError::Timeout(_))
        ));
        assert!(err.is_retryable());
        assert!(!StoreError::Unauthenticated.is_retryable());
    }

    #[test]
    fn test_price_error_is_validation_failure() {
        let err: StoreError = PriceError::Negative(rust_decimal::Decimal::NEGATIVE_ONE).into();
        assert!(matches!(err, StoreError::ValidationFailure(_)));
    }
}
