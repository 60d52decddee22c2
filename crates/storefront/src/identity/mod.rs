//! Identity provider port.
//!
//! The authentication service is an external collaborator. The storefront
//! only needs three things from it:
//!
//! - the current identity (opaque user id and email), published as a
//!   [`watch`] channel whose first value is [`AuthState::Resolving`]
//! - a way to sign out
//! - a way to delete the identity when the user deletes their account
//!
//! Anything that needs "the current user" must go through
//! [`resolved_user`], which waits for the provider to finish resolving
//! instead of treating "not resolved yet" as "nobody signed in".

mod local;

pub use local::LocalIdentity;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shopfront_core::{Email, UserId};
use thiserror::Error;
use tokio::sync::watch;

use crate::error::{Result, StoreError};

/// Errors reported by an identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The provider requires the user to sign in again before this operation.
    #[error("recent sign-in required")]
    RequiresRecentLogin,

    /// The provider could not be reached or failed internally.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// The signed-in user, as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Opaque user id.
    pub id: UserId,
    /// Email address on the account.
    pub email: Email,
}

/// Authentication state published by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// The provider has not yet determined whether a user is signed in.
    #[default]
    Resolving,
    /// Resolution finished and nobody is signed in.
    SignedOut,
    /// Resolution finished and this user is signed in.
    SignedIn(CurrentUser),
}

impl AuthState {
    /// Returns `true` once the provider has finished resolving.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, Self::Resolving)
    }

    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&CurrentUser> {
        match self {
            Self::SignedIn(user) => Some(user),
            Self::Resolving | Self::SignedOut => None,
        }
    }
}

/// Identity provider abstraction.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Subscribe to authentication state changes.
    fn subscribe(&self) -> watch::Receiver<AuthState>;

    /// End the current session.
    async fn sign_out(&self) -> std::result::Result<(), IdentityError>;

    /// Permanently delete the identity for `user`.
    async fn delete_identity(&self, user: &UserId) -> std::result::Result<(), IdentityError>;
}

/// Wait for the provider to resolve, then return the signed-in user.
///
/// Returns `None` if resolution finished with nobody signed in, or if the
/// provider went away before resolving.
pub async fn resolved_user(provider: &dyn IdentityProvider) -> Option<CurrentUser> {
    let mut rx = provider.subscribe();
    let state = rx.wait_for(AuthState::is_resolved).await.ok()?;
    state.user().cloned()
}

/// Like [`resolved_user`], but fails with `StoreError::Unauthenticated` when
/// nobody is signed in.
///
/// # Errors
///
/// Returns `StoreError::Unauthenticated` if no user is signed in once the
/// provider has resolved.
pub async fn require_user(provider: &dyn IdentityProvider) -> Result<CurrentUser> {
    resolved_user(provider)
        .await
        .ok_or(StoreError::Unauthenticated)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn shopper() -> CurrentUser {
        CurrentUser {
            id: UserId::new("u1"),
            email: Email::parse("shopper@example.com").unwrap(),
        }
    }

    #[test]
    fn test_auth_state_accessors() {
        assert!(!AuthState::Resolving.is_resolved());
        assert!(AuthState::SignedOut.is_resolved());
        assert!(AuthState::SignedOut.user().is_none());
        assert_eq!(AuthState::SignedIn(shopper()).user(), Some(&shopper()));
    }

    #[tokio::test]
    async fn test_require_user_signed_out() {
        let identity = LocalIdentity::signed_out();
        assert!(matches!(
            require_user(&identity).await,
            Err(StoreError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_resolved_user_waits_for_resolution() {
        let identity = LocalIdentity::new();
        let waiter = {
            let identity = identity.clone();
            tokio::spawn(async move { resolved_user(&identity).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        identity.sign_in(shopper());
        let user = waiter.await.unwrap();
        assert_eq!(user, Some(shopper()));
    }
}
