//! User profiles and account deletion.
//!
//! Profiles live in the `users` collection under the user's id. Edits are
//! two-phase: the document is written first and the locally cached profile
//! is replaced only once that write succeeds.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shopfront_core::{DocumentId, Email, UserId};
use tokio::sync::watch;
use tracing::{info, instrument};

use crate::cart::CartStore;
use crate::documents::{Document, DocumentStore, encode};
use crate::error::{Result, StoreError, report};
use crate::identity::{CurrentUser, IdentityProvider, require_user};
use crate::orders::OrderRepository;

const USERS: &str = "users";

/// A user's profile document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: UserId,
    pub email: Email,
    pub name: String,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub created_at: DateTime<Utc>,
}

/// Fields to change on a profile. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<Email>,
}

impl ProfileChanges {
    fn into_document(self) -> Result<Document> {
        let mut doc = Document::new();
        if let Some(name) = self.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(StoreError::ValidationFailure("name cannot be blank".to_string()));
            }
            doc.insert("name".to_string(), Value::from(name));
        }
        if let Some(email) = self.email {
            doc.insert("email".to_string(), Value::from(email.as_str()));
        }
        if doc.is_empty() {
            return Err(StoreError::ValidationFailure("nothing to update".to_string()));
        }
        Ok(doc)
    }

    fn apply(&self, profile: &mut UserProfile) {
        if let Some(name) = &self.name {
            name.trim().clone_into(&mut profile.name);
        }
        if let Some(email) = &self.email {
            profile.email = email.clone();
        }
    }
}

/// Profile and account operations for the signed-in user.
#[derive(Clone)]
pub struct AccountService {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    orders: OrderRepository,
    profile: Arc<watch::Sender<Option<UserProfile>>>,
}

impl AccountService {
    /// Create an account service. `orders` must write to the same store.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
        orders: OrderRepository,
    ) -> Self {
        let (profile, _) = watch::channel(None);
        Self {
            identity,
            store,
            orders,
            profile: Arc::new(profile),
        }
    }

    fn doc_id(user: &CurrentUser) -> DocumentId {
        DocumentId::new(user.id.as_str())
    }

    /// The locally cached profile, if one has been loaded.
    #[must_use]
    pub fn profile(&self) -> Option<UserProfile> {
        self.profile.borrow().clone()
    }

    /// Subscribe to changes of the cached profile.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<UserProfile>> {
        self.profile.subscribe()
    }

    /// Drop the cached profile.
    pub fn forget_profile(&self) {
        self.profile.send_replace(None);
    }

    /// Write the profile document for a newly registered user.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` if nobody is signed in, `ValidationFailure` for a
    /// blank name, `PersistenceFailure` if the write fails.
    #[instrument(skip(self, name))]
    pub async fn create_profile(&self, name: &str) -> Result<UserProfile> {
        let result: Result<UserProfile> = async {
            let user = require_user(self.identity.as_ref()).await?;
            let name = name.trim();
            if name.is_empty() {
                return Err(StoreError::ValidationFailure("name cannot be blank".to_string()));
            }
            let profile = UserProfile {
                uid: user.id.clone(),
                email: user.email.clone(),
                name: name.to_owned(),
                created_at: Utc::now().trunc_subsecs(6),
            };
            self.store
                .set(USERS, &Self::doc_id(&user), encode(&profile)?)
                .await?;
            self.profile.send_replace(Some(profile.clone()));
            info!(user_id = %user.id, "Profile created");
            Ok(profile)
        }
        .await;
        if let Err(err) = &result {
            report(err, "create_profile");
        }
        result
    }

    /// Read the signed-in user's profile and cache it.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` if nobody is signed in, `NotFound` if no profile
    /// document exists, `PersistenceFailure` if the read fails.
    #[instrument(skip(self))]
    pub async fn load_profile(&self) -> Result<UserProfile> {
        let result: Result<UserProfile> = async {
            let user = require_user(self.identity.as_ref()).await?;
            let profile: UserProfile = self
                .store
                .get(USERS, &Self::doc_id(&user))
                .await?
                .ok_or_else(|| StoreError::NotFound(format!("profile for user {}", user.id)))?
                .decode()?;
            self.profile.send_replace(Some(profile.clone()));
            Ok(profile)
        }
        .await;
        if let Err(err) = &result {
            report(err, "load_profile");
        }
        result
    }

    /// Apply `changes` to the signed-in user's profile.
    ///
    /// The profile document is updated first. The cached profile changes only
    /// after that write is confirmed; on failure it is left untouched.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` if nobody is signed in, `ValidationFailure` for an
    /// empty or blank change, `NotFound` if no profile document exists,
    /// `PersistenceFailure` if the write fails.
    #[instrument(skip(self, changes))]
    pub async fn update_profile(&self, changes: ProfileChanges) -> Result<UserProfile> {
        let result: Result<UserProfile> = async {
            let user = require_user(self.identity.as_ref()).await?;
            let doc = changes.clone().into_document()?;
            self.store.update(USERS, &Self::doc_id(&user), doc).await?;

            let cached = self.profile().filter(|p| p.uid == user.id);
            let Some(mut profile) = cached else {
                return self.load_profile().await;
            };
            changes.apply(&mut profile);
            self.profile.send_replace(Some(profile.clone()));
            info!(user_id = %user.id, "Profile updated");
            Ok(profile)
        }
        .await;
        if let Err(err) = &result {
            report(err, "update_profile");
        }
        result
    }

    /// Permanently delete the signed-in user's account.
    ///
    /// Deletes every order for the user, empties `cart`, deletes the profile
    /// document, and finally deletes the identity. Returns how many orders
    /// were removed.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` if nobody is signed in, `PersistenceFailure` if a
    /// delete fails, `Identity` if the identity provider refuses (for
    /// example when a recent sign-in is required). Steps completed before a
    /// failure are not rolled back.
    #[instrument(skip(self, cart))]
    pub async fn delete_account(&self, cart: &CartStore) -> Result<usize> {
        let result: Result<usize> = async {
            let user = require_user(self.identity.as_ref()).await?;

            let orders = self.orders.delete_all_for_user(&user.id).await?;
            cart.clear();
            self.store.delete(USERS, &Self::doc_id(&user)).await?;
            self.forget_profile();
            self.identity.delete_identity(&user.id).await?;

            info!(user_id = %user.id, orders, "Account deleted");
            Ok(orders)
        }
        .await;
        if let Err(err) = &result {
            report(err, "delete_account");
        }
        result
    }
}
