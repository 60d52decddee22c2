//! In-process identity provider.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use shopfront_core::UserId;
use tokio::sync::watch;
use tracing::info;

use super::{AuthState, CurrentUser, IdentityError, IdentityProvider};

struct LocalInner {
    state: watch::Sender<AuthState>,
    requires_recent_login: AtomicBool,
}

/// An [`IdentityProvider`] whose state is driven directly by the caller.
///
/// Starts in [`AuthState::Resolving`]; call [`sign_in`](Self::sign_in) or
/// [`resolve_signed_out`](Self::resolve_signed_out) to finish resolution.
/// Cheaply cloneable; clones share state.
#[derive(Clone)]
pub struct LocalIdentity {
    inner: Arc<LocalInner>,
}

impl LocalIdentity {
    /// Create a provider that has not resolved yet.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(AuthState::Resolving);
        Self {
            inner: Arc::new(LocalInner {
                state,
                requires_recent_login: AtomicBool::new(false),
            }),
        }
    }

    /// Create a provider that has already resolved with nobody signed in.
    #[must_use]
    pub fn signed_out() -> Self {
        let identity = Self::new();
        identity.resolve_signed_out();
        identity
    }

    /// Create a provider that has already resolved with `user` signed in.
    #[must_use]
    pub fn signed_in(user: CurrentUser) -> Self {
        let identity = Self::new();
        identity.sign_in(user);
        identity
    }

    /// Finish resolution with `user` signed in.
    pub fn sign_in(&self, user: CurrentUser) {
        info!(user_id = %user.id, "User signed in");
        self.inner.state.send_replace(AuthState::SignedIn(user));
    }

    /// Finish resolution with nobody signed in.
    pub fn resolve_signed_out(&self) {
        self.inner.state.send_replace(AuthState::SignedOut);
    }

    /// Make `delete_identity` fail until cleared, as real providers do for
    /// stale sessions.
    pub fn set_requires_recent_login(&self, required: bool) {
        self.inner
            .requires_recent_login
            .store(required, Ordering::SeqCst);
    }

    /// Current state, without waiting.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }
}

impl Default for LocalIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        info!("User signed out");
        self.inner.state.send_replace(AuthState::SignedOut);
        Ok(())
    }

    async fn delete_identity(&self, user: &UserId) -> Result<(), IdentityError> {
        if self.inner.requires_recent_login.load(Ordering::SeqCst) {
            return Err(IdentityError::RequiresRecentLogin);
        }
        let is_current = self
            .inner
            .state
            .borrow()
            .user()
            .is_some_and(|current| &current.id == user);
        if is_current {
            self.inner.state.send_replace(AuthState::SignedOut);
        }
        info!(user_id = %user, "Identity deleted");
        Ok(())
    }
}
