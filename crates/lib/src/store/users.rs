//! User store operations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::{StoreError, required};
use crate::Result;
use crate::crypto::{Argon2Hasher, CredentialHasher, RandomTokens, TokenSource};
use crate::engine::RowEngine;
use crate::model::{LockoutInfo, LoginInfo, ModelError, PhoneInfo, TokenInfo, User, UserId};
use crate::row::{RowError, UserRow, schema};

/// Persistence operations for [`User`] aggregates.
///
/// Holds the storage engine plus the two collaborators the identity
/// contract consumes: a credential hasher and a token source. All
/// cross-row guarantees (unique names/emails, login lookup, role index)
/// are built here on top of the engine's conditional insert.
pub struct UserStore {
    engine: Arc<dyn RowEngine>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn TokenSource>,
}

impl UserStore {
    /// Creates a store with the default collaborators (Argon2 hashing,
    /// random token source).
    pub fn new(engine: Arc<dyn RowEngine>) -> Self {
        Self::with_collaborators(engine, Arc::new(Argon2Hasher), Arc::new(RandomTokens))
    }

    /// Creates a store with explicit collaborators.
    pub fn with_collaborators(
        engine: Arc<dyn RowEngine>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            engine,
            hasher,
            tokens,
        }
    }

    // === Create / update / delete ===

    /// Creates a new user.
    ///
    /// The normalized user name marker is claimed first, then the email
    /// marker (when an email is present) and a lookup marker per login the
    /// user already carries; only then is the main row written. A failed
    /// conditional insert fails the call before the main row exists, and
    /// releases any markers this call claimed. A fresh security stamp is
    /// filled in when the user has none.
    ///
    /// # Errors
    /// * `ModelError::MissingValue` when the normalized user name is absent
    /// * `StoreError::DuplicateUser` when the name or email marker is
    ///   already held by another user
    /// * `ModelError::DuplicateLogin` when a carried login pair is already
    ///   linked elsewhere
    pub async fn create_user(&self, user: &mut User) -> Result<()> {
        let name = required(user.normalized_user_name(), "normalized user name")?;
        if user.security_stamp().is_none() {
            user.set_security_stamp(self.tokens.security_stamp());
        }
        user.normalize();

        let id = user.id().to_string();
        let encoded = UserRow::from_user(user).encode()?;
        let mut claimed: Vec<(&'static str, String)> = Vec::new();

        if !self
            .engine
            .insert_if_absent(schema::USERS_BY_NAME, &name, id.clone().into_bytes())
            .await?
        {
            return Err(StoreError::DuplicateUser {
                field: "user name",
                value: name,
            }
            .into());
        }
        claimed.push((schema::USERS_BY_NAME, name));

        if let Some(email) = user
            .normalized_email()
            .filter(|e| !e.is_empty())
            .map(str::to_owned)
        {
            if !self
                .engine
                .insert_if_absent(schema::USERS_BY_EMAIL, &email, id.clone().into_bytes())
                .await?
            {
                self.release_markers(&claimed).await;
                return Err(StoreError::DuplicateUser {
                    field: "email",
                    value: email,
                }
                .into());
            }
            claimed.push((schema::USERS_BY_EMAIL, email));
        }

        for login in user.logins() {
            let key = schema::login_key(&login.login_provider, &login.provider_key);
            if !self
                .engine
                .insert_if_absent(schema::USERS_BY_LOGIN, &key, id.clone().into_bytes())
                .await?
            {
                self.release_markers(&claimed).await;
                return Err(ModelError::DuplicateLogin {
                    provider: login.login_provider.clone(),
                    key: login.provider_key.clone(),
                }
                .into());
            }
            claimed.push((schema::USERS_BY_LOGIN, key));
        }

        if let Err(err) = self.engine.put_row(schema::USERS, &id, encoded).await {
            // No main row was written; release the claims so the values
            // don't stay blocked by a user that never came to exist.
            self.release_markers(&claimed).await;
            return Err(err);
        }

        for role in user.roles() {
            self.engine
                .index_insert(schema::USERS_BY_ROLE, role, &id)
                .await?;
        }

        info!(user = %user.id(), "created user");
        Ok(())
    }

    /// Updates an existing user.
    ///
    /// When the normalized user name or email changed relative to the
    /// stored row, the marker dance runs again for the new values: claim
    /// new markers conditionally, write the row, then release the old
    /// markers. A lost claim fails the call with the row unmodified and
    /// any markers claimed by this call released. Login lookup markers and
    /// role-index entries are reconciled against the stored row the same
    /// way.
    ///
    /// # Errors
    /// * `StoreError::UserNotFound` when no row exists for the identifier
    /// * `StoreError::DuplicateUser` / `ModelError::DuplicateLogin` when a
    ///   new marker claim is lost
    pub async fn update_user(&self, user: &mut User) -> Result<()> {
        let new_name = required(user.normalized_user_name(), "normalized user name")?;
        user.normalize();

        let id = user.id().to_string();
        let stored_bytes = self
            .engine
            .get_row(schema::USERS, &id)
            .await?
            .ok_or_else(|| {
                crate::Error::from(StoreError::UserNotFound {
                    id: user.id().clone(),
                })
            })?;
        let stored = UserRow::decode(&stored_bytes)?;
        let encoded = UserRow::from_user(user).encode()?;

        let new_email = user
            .normalized_email()
            .filter(|e| !e.is_empty())
            .map(str::to_owned);

        let mut claimed: Vec<(&'static str, String)> = Vec::new();

        let name_changed = stored.normalized_user_name.as_deref() != Some(new_name.as_str());
        if name_changed {
            if !self
                .engine
                .insert_if_absent(schema::USERS_BY_NAME, &new_name, id.clone().into_bytes())
                .await?
            {
                return Err(StoreError::DuplicateUser {
                    field: "user name",
                    value: new_name,
                }
                .into());
            }
            claimed.push((schema::USERS_BY_NAME, new_name.clone()));
        }

        let email_changed = stored.normalized_email != new_email;
        if email_changed && let Some(email) = new_email.clone() {
            if !self
                .engine
                .insert_if_absent(schema::USERS_BY_EMAIL, &email, id.clone().into_bytes())
                .await?
            {
                self.release_markers(&claimed).await;
                return Err(StoreError::DuplicateUser {
                    field: "email",
                    value: email,
                }
                .into());
            }
            claimed.push((schema::USERS_BY_EMAIL, email));
        }

        let added_logins: Vec<LoginInfo> = user
            .logins()
            .iter()
            .filter(|l| find_login(&stored.logins, l).is_none())
            .cloned()
            .collect();
        for login in &added_logins {
            let key = schema::login_key(&login.login_provider, &login.provider_key);
            if !self
                .engine
                .insert_if_absent(schema::USERS_BY_LOGIN, &key, id.clone().into_bytes())
                .await?
            {
                self.release_markers(&claimed).await;
                return Err(ModelError::DuplicateLogin {
                    provider: login.login_provider.clone(),
                    key: login.provider_key.clone(),
                }
                .into());
            }
            claimed.push((schema::USERS_BY_LOGIN, key));
        }

        if let Err(err) = self.engine.put_row(schema::USERS, &id, encoded).await {
            // The stored row is untouched, so its markers stay valid; only
            // the claims made by this call are given back.
            self.release_markers(&claimed).await;
            return Err(err);
        }

        // Release markers the stored row owned but the updated row no longer does.
        let mut released: Vec<(&'static str, String)> = Vec::new();
        if name_changed && let Some(old) = stored.normalized_user_name {
            released.push((schema::USERS_BY_NAME, old));
        }
        if email_changed && let Some(old) = stored.normalized_email {
            released.push((schema::USERS_BY_EMAIL, old));
        }
        for login in &stored.logins {
            if user
                .find_login(&login.login_provider, &login.provider_key)
                .is_none()
            {
                released.push((
                    schema::USERS_BY_LOGIN,
                    schema::login_key(&login.login_provider, &login.provider_key),
                ));
            }
        }
        self.release_markers(&released).await;

        // Reconcile the role index with the embedded list.
        for role in user.roles() {
            if !stored.roles.iter().any(|r| r == role) {
                self.engine
                    .index_insert(schema::USERS_BY_ROLE, role, &id)
                    .await?;
            }
        }
        for role in &stored.roles {
            if !user.has_role(role) {
                self.engine
                    .index_remove(schema::USERS_BY_ROLE, role, &id)
                    .await?;
            }
        }

        debug!(user = %user.id(), "updated user");
        Ok(())
    }

    /// Deletes a user along with every marker and index entry the row owns.
    ///
    /// Deleting a non-existent user is a no-op. The main row goes last, so
    /// an interrupted delete can be re-run.
    pub async fn delete_user(&self, id: &UserId) -> Result<()> {
        let key = id.to_string();
        let Some(bytes) = self.engine.get_row(schema::USERS, &key).await? else {
            return Ok(());
        };
        let stored = UserRow::decode(&bytes)?;

        if let Some(name) = &stored.normalized_user_name {
            self.engine.delete_row(schema::USERS_BY_NAME, name).await?;
        }
        if let Some(email) = &stored.normalized_email {
            self.engine
                .delete_row(schema::USERS_BY_EMAIL, email)
                .await?;
        }
        for login in &stored.logins {
            self.engine
                .delete_row(
                    schema::USERS_BY_LOGIN,
                    &schema::login_key(&login.login_provider, &login.provider_key),
                )
                .await?;
        }
        for role in &stored.roles {
            self.engine
                .index_remove(schema::USERS_BY_ROLE, role, &key)
                .await?;
        }
        self.engine.delete_row(schema::USERS, &key).await?;

        info!(user = %id, "deleted user");
        Ok(())
    }

    // === Finders ===

    /// Looks up a user by identifier.
    pub async fn find_by_id(&self, id: &UserId) -> Result<Option<User>> {
        match self.engine.get_row(schema::USERS, &id.to_string()).await? {
            Some(bytes) => Ok(Some(UserRow::decode(&bytes)?.into_user()?)),
            None => Ok(None),
        }
    }

    /// Looks up a user by normalized user name.
    pub async fn find_by_name(&self, normalized_user_name: &str) -> Result<Option<User>> {
        self.find_by_marker(schema::USERS_BY_NAME, normalized_user_name)
            .await
    }

    /// Looks up a user by normalized email.
    pub async fn find_by_email(&self, normalized_email: &str) -> Result<Option<User>> {
        self.find_by_marker(schema::USERS_BY_EMAIL, normalized_email)
            .await
    }

    /// Looks up the user linked to an external login.
    pub async fn find_by_login(&self, provider: &str, key: &str) -> Result<Option<User>> {
        self.find_by_marker(schema::USERS_BY_LOGIN, &schema::login_key(provider, key))
            .await
    }

    /// Finds all members of a role via the secondary index.
    ///
    /// Order is unspecified. Index entries pointing at missing rows (the
    /// crash window of the non-atomic dual write) are skipped.
    pub async fn find_by_role(&self, role: &str) -> Result<Vec<User>> {
        let keys = self.engine.index_read(schema::USERS_BY_ROLE, role).await?;

        let mut users = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(id) = UserId::parse(&key) else {
                warn!(role, key = %key, "skipping unparseable role index entry");
                continue;
            };
            if let Some(user) = self.find_by_id(&id).await? {
                users.push(user);
            }
        }
        Ok(users)
    }

    // === Logins ===

    /// Links an external login and claims its global lookup marker.
    ///
    /// # Errors
    /// `ModelError::DuplicateLogin` when the pair is already linked, either
    /// on this user or (via the lookup marker) on any other.
    pub async fn add_login(&self, id: &UserId, login: LoginInfo) -> Result<()> {
        let mut user = self.load(id).await?;
        user.add_login(login.clone())?;

        let marker = schema::login_key(&login.login_provider, &login.provider_key);
        if !self
            .engine
            .insert_if_absent(schema::USERS_BY_LOGIN, &marker, id.to_string().into_bytes())
            .await?
        {
            return Err(ModelError::DuplicateLogin {
                provider: login.login_provider,
                key: login.provider_key,
            }
            .into());
        }

        if let Err(err) = self.persist(&mut user).await {
            // The row write failed; give the marker back so the pair stays claimable.
            self.release_markers(&[(schema::USERS_BY_LOGIN, marker)])
                .await;
            return Err(err);
        }
        Ok(())
    }

    /// Unlinks a login and releases its lookup marker.
    ///
    /// Removing a login the user never had is a no-op; in particular, the
    /// marker is left alone so another user's claim cannot be clobbered.
    pub async fn remove_login(&self, id: &UserId, provider: &str, key: &str) -> Result<()> {
        let mut user = self.load(id).await?;
        let had_login = user.find_login(provider, key).is_some();
        user.remove_login(provider, key);
        self.persist(&mut user).await?;

        if had_login {
            self.engine
                .delete_row(schema::USERS_BY_LOGIN, &schema::login_key(provider, key))
                .await?;
        }
        Ok(())
    }

    // === Tokens ===

    /// Stores a new token.
    pub async fn add_token(&self, id: &UserId, token: TokenInfo) -> Result<()> {
        self.mutate(id, |user| user.add_token(token)).await
    }

    /// Stores a token, replacing the value when the pair already exists.
    pub async fn set_token(&self, id: &UserId, token: TokenInfo) -> Result<()> {
        self.mutate(id, |user| user.set_token(token)).await
    }

    /// Removes a token. Removing an absent token is a no-op.
    pub async fn remove_token(&self, id: &UserId, provider: &str, name: &str) -> Result<()> {
        self.mutate(id, |user| {
            user.remove_token(provider, name);
            Ok(())
        })
        .await
    }

    // === Roles ===

    /// Adds a role membership and its secondary-index entry.
    ///
    /// The row is written first, so the index can lag but never lead the
    /// embedded list.
    ///
    /// # Errors
    /// `ModelError::DuplicateRole` when the role is already assigned —
    /// re-adding is an error, not a silent success.
    pub async fn add_role(&self, id: &UserId, role: impl Into<String>) -> Result<()> {
        let role = role.into();
        let mut user = self.load(id).await?;
        user.add_role(role.clone())?;
        self.persist(&mut user).await?;

        self.engine
            .index_insert(schema::USERS_BY_ROLE, &role, &id.to_string())
            .await?;
        debug!(user = %id, role = %role, "added role");
        Ok(())
    }

    /// Removes a role membership and its secondary-index entry.
    ///
    /// Removing a role the user does not have is a no-op.
    pub async fn remove_role(&self, id: &UserId, role: &str) -> Result<()> {
        let mut user = self.load(id).await?;
        user.remove_role(role);
        self.persist(&mut user).await?;

        self.engine
            .index_remove(schema::USERS_BY_ROLE, role, &id.to_string())
            .await?;
        debug!(user = %id, role, "removed role");
        Ok(())
    }

    // === Credential and state updates ===

    /// Stores an already-computed password hash.
    pub async fn set_password_hash(&self, id: &UserId, hash: impl Into<String>) -> Result<()> {
        let hash = hash.into();
        self.mutate(id, |user| {
            user.set_password_hash(hash);
            Ok(())
        })
        .await
    }

    /// Hashes a plaintext password, stores the hash, and renews the
    /// security stamp — existing sessions relying on the old stamp become
    /// invalid.
    pub async fn set_password(&self, id: &UserId, password: &str) -> Result<()> {
        let hash = self.hasher.hash(password)?;
        let stamp = self.tokens.security_stamp();
        self.mutate(id, |user| {
            user.set_password_hash(hash);
            user.set_security_stamp(stamp);
            Ok(())
        })
        .await
    }

    /// Verifies a plaintext password against the user's stored hash.
    ///
    /// A user without a password hash never verifies.
    pub fn verify_password(&self, user: &User, password: &str) -> Result<bool> {
        match user.password_hash() {
            Some(hash) => self.hasher.verify(hash, password),
            None => Ok(false),
        }
    }

    /// Stores an explicit security stamp.
    pub async fn set_security_stamp(&self, id: &UserId, stamp: impl Into<String>) -> Result<()> {
        let stamp = stamp.into();
        self.mutate(id, |user| {
            user.set_security_stamp(stamp);
            Ok(())
        })
        .await
    }

    /// Draws a fresh security stamp from the token source and stores it.
    pub async fn renew_security_stamp(&self, id: &UserId) -> Result<String> {
        let stamp = self.tokens.security_stamp();
        let stored = stamp.clone();
        self.mutate(id, move |user| {
            user.set_security_stamp(stored);
            Ok(())
        })
        .await?;
        Ok(stamp)
    }

    /// Sets the two-factor flag.
    pub async fn set_two_factor_enabled(&self, id: &UserId, enabled: bool) -> Result<()> {
        self.mutate(id, |user| {
            user.set_two_factor_enabled(enabled);
            Ok(())
        })
        .await
    }

    /// Records the email confirmation timestamp.
    pub async fn confirm_email(&self, id: &UserId, at: DateTime<Utc>) -> Result<()> {
        self.mutate(id, |user| {
            user.confirm_email(at);
            Ok(())
        })
        .await
    }

    /// Replaces the whole lockout state.
    pub async fn set_lockout(&self, id: &UserId, lockout: LockoutInfo) -> Result<()> {
        self.mutate(id, |user| {
            user.set_lockout(lockout);
            Ok(())
        })
        .await
    }

    /// Enables or disables lockout for the account.
    pub async fn set_lockout_enabled(&self, id: &UserId, enabled: bool) -> Result<()> {
        self.mutate(id, |user| {
            user.set_lockout_enabled(enabled);
            Ok(())
        })
        .await
    }

    /// Records a failed access attempt; returns the new count.
    pub async fn record_access_failure(&self, id: &UserId) -> Result<i32> {
        let mut count = 0;
        self.mutate(id, |user| {
            count = user.record_access_failure();
            Ok(())
        })
        .await?;
        Ok(count)
    }

    /// Resets the failed-access counter.
    pub async fn reset_access_failures(&self, id: &UserId) -> Result<()> {
        self.mutate(id, |user| {
            user.reset_access_failures();
            Ok(())
        })
        .await
    }

    /// Replaces the whole phone state.
    pub async fn set_phone(&self, id: &UserId, phone: PhoneInfo) -> Result<()> {
        self.mutate(id, |user| {
            user.set_phone(phone);
            Ok(())
        })
        .await
    }

    // === Internals ===

    /// Loads a user that must exist.
    async fn load(&self, id: &UserId) -> Result<User> {
        self.find_by_id(id).await?.ok_or_else(|| {
            crate::Error::from(StoreError::UserNotFound { id: id.clone() })
        })
    }

    /// Normalizes and writes the user's row.
    async fn persist(&self, user: &mut User) -> Result<()> {
        user.normalize();
        let row = UserRow::from_user(user);
        self.engine
            .put_row(schema::USERS, &user.id().to_string(), row.encode()?)
            .await
    }

    /// Load, mutate through the entity's contract, persist.
    async fn mutate<F>(&self, id: &UserId, op: F) -> Result<()>
    where
        F: FnOnce(&mut User) -> Result<()>,
    {
        let mut user = self.load(id).await?;
        op(&mut user)?;
        self.persist(&mut user).await
    }

    /// Follows a marker row to the user it points at.
    ///
    /// A marker pointing at a missing row is a crash leftover and reads as
    /// absent.
    async fn find_by_marker(&self, table: &'static str, key: &str) -> Result<Option<User>> {
        let Some(bytes) = self.engine.get_row(table, key).await? else {
            return Ok(None);
        };
        let id = marker_target(table, &bytes)?;
        self.find_by_id(&id).await
    }

    /// Best-effort release of uniqueness markers on a failure path. The
    /// primary error is already on its way to the caller; a failed release
    /// only widens the documented orphaned-marker window.
    async fn release_markers(&self, markers: &[(&'static str, String)]) {
        for (table, key) in markers {
            if let Err(err) = self.engine.delete_row(table, key).await {
                warn!(table, key = key.as_str(), error = %err, "failed to release marker");
            }
        }
    }
}

/// Decodes the user identifier a marker row points at.
fn marker_target(table: &'static str, bytes: &[u8]) -> Result<UserId> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(UserId::parse)
        .ok_or_else(|| {
            RowError::CorruptMarker {
                table: table.to_string(),
            }
            .into()
        })
}

/// Scans a login list for a matching (provider, key) pair.
fn find_login<'a>(logins: &'a [LoginInfo], login: &LoginInfo) -> Option<&'a LoginInfo> {
    logins.iter().find(|l| {
        l.login_provider == login.login_provider && l.provider_key == login.provider_key
    })
}
