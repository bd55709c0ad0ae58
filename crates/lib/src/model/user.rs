//! The user aggregate root.

use chrono::{DateTime, Utc};

use super::{LockoutInfo, LoginInfo, ModelError, PhoneInfo, TokenInfo, UserId};
use crate::Result;

/// A user identity record.
///
/// All fields are private: scalars are read through accessors and written
/// through named setters, and the login/token/role collections are owned
/// exclusively by the entity. External code receives read-only views and
/// cannot bypass the uniqueness checks the add operations enforce.
///
/// The identifier is the storage partition key. It is assigned at
/// construction and there is deliberately no way to change it afterward.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserId,
    user_name: Option<String>,
    normalized_user_name: Option<String>,
    email: Option<String>,
    normalized_email: Option<String>,
    email_confirmation_time: Option<DateTime<Utc>>,
    password_hash: Option<String>,
    security_stamp: Option<String>,
    two_factor_enabled: bool,
    lockout: Option<LockoutInfo>,
    phone: Option<PhoneInfo>,
    logins: Vec<LoginInfo>,
    tokens: Vec<TokenInfo>,
    roles: Vec<String>,
}

impl User {
    /// Creates a user with a fresh identifier and empty collections.
    pub fn new() -> Self {
        Self::with_id(UserId::new())
    }

    /// Creates a user with a known identifier.
    ///
    /// Only the mapping layer reconstructs users this way; everyone else
    /// gets a generated identifier through [`User::new`].
    pub(crate) fn with_id(id: UserId) -> Self {
        Self {
            id,
            user_name: None,
            normalized_user_name: None,
            email: None,
            normalized_email: None,
            email_confirmation_time: None,
            password_hash: None,
            security_stamp: None,
            two_factor_enabled: false,
            lockout: None,
            phone: None,
            logins: Vec::new(),
            tokens: Vec::new(),
            roles: Vec::new(),
        }
    }

    // === Scalar accessors ===

    /// The immutable identifier (storage partition key).
    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn normalized_user_name(&self) -> Option<&str> {
        self.normalized_user_name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn normalized_email(&self) -> Option<&str> {
        self.normalized_email.as_deref()
    }

    pub fn email_confirmation_time(&self) -> Option<DateTime<Utc>> {
        self.email_confirmation_time
    }

    /// Whether the email has been confirmed.
    ///
    /// Derived from the presence of the confirmation timestamp; never stored
    /// independently, so the two can't disagree.
    pub fn email_confirmed(&self) -> bool {
        self.email_confirmation_time.is_some()
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    pub fn security_stamp(&self) -> Option<&str> {
        self.security_stamp.as_deref()
    }

    pub fn two_factor_enabled(&self) -> bool {
        self.two_factor_enabled
    }

    // === Scalar setters ===

    pub fn set_user_name(&mut self, user_name: impl Into<Option<String>>) {
        self.user_name = user_name.into();
    }

    pub fn set_normalized_user_name(&mut self, value: impl Into<Option<String>>) {
        self.normalized_user_name = value.into();
    }

    pub fn set_email(&mut self, email: impl Into<Option<String>>) {
        self.email = email.into();
    }

    pub fn set_normalized_email(&mut self, value: impl Into<Option<String>>) {
        self.normalized_email = value.into();
    }

    /// Records the moment the email was confirmed.
    pub fn confirm_email(&mut self, at: DateTime<Utc>) {
        self.email_confirmation_time = Some(at);
    }

    /// Clears the confirmation, e.g. after the address changes.
    pub fn clear_email_confirmation(&mut self) {
        self.email_confirmation_time = None;
    }

    pub fn set_password_hash(&mut self, hash: impl Into<Option<String>>) {
        self.password_hash = hash.into();
    }

    pub fn set_security_stamp(&mut self, stamp: impl Into<Option<String>>) {
        self.security_stamp = stamp.into();
    }

    pub fn set_two_factor_enabled(&mut self, enabled: bool) {
        self.two_factor_enabled = enabled;
    }

    // === Lockout ===

    /// The lockout state, defaulted when none has been recorded.
    pub fn lockout(&self) -> LockoutInfo {
        self.lockout.clone().unwrap_or_default()
    }

    pub fn set_lockout(&mut self, lockout: LockoutInfo) {
        self.lockout = Some(lockout);
    }

    pub fn set_lockout_enabled(&mut self, enabled: bool) {
        self.lockout.get_or_insert_with(Default::default).enabled = enabled;
    }

    pub fn set_lockout_end(&mut self, end_time: Option<DateTime<Utc>>) {
        self.lockout.get_or_insert_with(Default::default).end_time = end_time;
    }

    /// Records a failed access attempt and returns the new count.
    pub fn record_access_failure(&mut self) -> i32 {
        let lockout = self.lockout.get_or_insert_with(Default::default);
        lockout.access_failed_count += 1;
        lockout.access_failed_count
    }

    /// Resets the failed-access counter.
    pub fn reset_access_failures(&mut self) {
        if let Some(lockout) = self.lockout.as_mut() {
            lockout.access_failed_count = 0;
        }
    }

    pub fn access_failed_count(&self) -> i32 {
        self.lockout.as_ref().map_or(0, |l| l.access_failed_count)
    }

    // === Phone ===

    /// The phone state, defaulted when none has been recorded.
    pub fn phone(&self) -> PhoneInfo {
        self.phone.clone().unwrap_or_default()
    }

    pub fn set_phone(&mut self, phone: PhoneInfo) {
        self.phone = Some(phone);
    }

    /// Replaces the phone number. Any previous confirmation is dropped,
    /// since it applied to the old number.
    pub fn set_phone_number(&mut self, number: impl Into<Option<String>>) {
        let phone = self.phone.get_or_insert_with(Default::default);
        phone.number = number.into();
        phone.confirmation_time = None;
    }

    /// Records the moment the phone number was confirmed.
    pub fn confirm_phone(&mut self, at: DateTime<Utc>) {
        self.phone.get_or_insert_with(Default::default).confirmation_time = Some(at);
    }

    pub fn phone_confirmed(&self) -> bool {
        self.phone.as_ref().is_some_and(PhoneInfo::confirmed)
    }

    // === Logins ===

    /// Read-only view of the user's external logins.
    pub fn logins(&self) -> &[LoginInfo] {
        &self.logins
    }

    /// Looks up a login by its (provider, key) pair.
    pub fn find_login(&self, provider: &str, key: &str) -> Option<&LoginInfo> {
        self.logins
            .iter()
            .find(|l| l.login_provider == provider && l.provider_key == key)
    }

    /// Links an external login.
    ///
    /// # Errors
    /// * `ModelError::MissingValue` when the provider or key is empty
    /// * `ModelError::DuplicateLogin` when the (provider, key) pair is
    ///   already linked — adds are intentionally not idempotent
    pub fn add_login(&mut self, login: LoginInfo) -> Result<()> {
        if login.login_provider.is_empty() {
            return Err(ModelError::MissingValue {
                field: "login provider",
            }
            .into());
        }
        if login.provider_key.is_empty() {
            return Err(ModelError::MissingValue {
                field: "provider key",
            }
            .into());
        }
        if self
            .find_login(&login.login_provider, &login.provider_key)
            .is_some()
        {
            return Err(ModelError::DuplicateLogin {
                provider: login.login_provider,
                key: login.provider_key,
            }
            .into());
        }

        self.logins.push(login);
        Ok(())
    }

    /// Unlinks a login. Removing a login that was never added is a no-op.
    pub fn remove_login(&mut self, provider: &str, key: &str) {
        self.logins
            .retain(|l| !(l.login_provider == provider && l.provider_key == key));
    }

    // === Tokens ===

    /// Read-only view of the user's stored tokens.
    pub fn tokens(&self) -> &[TokenInfo] {
        &self.tokens
    }

    /// Looks up a token by its (provider, name) pair.
    pub fn find_token(&self, provider: &str, name: &str) -> Option<&TokenInfo> {
        self.tokens
            .iter()
            .find(|t| t.login_provider == provider && t.name == name)
    }

    /// Stores a new token.
    ///
    /// # Errors
    /// * `ModelError::MissingValue` when the provider or name is empty
    /// * `ModelError::DuplicateToken` when the (provider, name) pair already
    ///   exists — use [`User::set_token`] to replace a value
    pub fn add_token(&mut self, token: TokenInfo) -> Result<()> {
        if token.login_provider.is_empty() {
            return Err(ModelError::MissingValue {
                field: "login provider",
            }
            .into());
        }
        if token.name.is_empty() {
            return Err(ModelError::MissingValue {
                field: "token name",
            }
            .into());
        }
        if self.find_token(&token.login_provider, &token.name).is_some() {
            return Err(ModelError::DuplicateToken {
                provider: token.login_provider,
                name: token.name,
            }
            .into());
        }

        self.tokens.push(token);
        Ok(())
    }

    /// Stores a token, replacing the value if the (provider, name) pair is
    /// already present.
    pub fn set_token(&mut self, token: TokenInfo) -> Result<()> {
        if let Some(existing) = self
            .tokens
            .iter_mut()
            .find(|t| t.login_provider == token.login_provider && t.name == token.name)
        {
            existing.value = token.value;
            return Ok(());
        }
        self.add_token(token)
    }

    /// Removes a token. Removing an absent token is a no-op.
    pub fn remove_token(&mut self, provider: &str, name: &str) {
        self.tokens
            .retain(|t| !(t.login_provider == provider && t.name == name));
    }

    // === Roles ===

    /// Read-only view of the user's role names.
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Adds a role membership.
    ///
    /// # Errors
    /// * `ModelError::MissingValue` when the role name is empty
    /// * `ModelError::DuplicateRole` when the role is already assigned
    pub fn add_role(&mut self, role: impl Into<String>) -> Result<()> {
        let role = role.into();
        if role.is_empty() {
            return Err(ModelError::MissingValue { field: "role name" }.into());
        }
        if self.has_role(&role) {
            return Err(ModelError::DuplicateRole { role }.into());
        }

        self.roles.push(role);
        Ok(())
    }

    /// Removes a role membership. Removing an absent role is a no-op.
    pub fn remove_role(&mut self, role: &str) {
        self.roles.retain(|r| r != role);
    }

    // === Normalization ===

    /// Collapses all-default nested value objects to absent.
    ///
    /// Run before every persist so storage never carries empty sub-records.
    /// Idempotent: a second call never changes an already-normalized user.
    pub fn normalize(&mut self) {
        if self.lockout.as_ref().is_some_and(LockoutInfo::is_default) {
            self.lockout = None;
        }
        if self.phone.as_ref().is_some_and(PhoneInfo::is_default) {
            self.phone = None;
        }
    }

    /// The lockout state exactly as held, absent when never recorded or
    /// collapsed by [`User::normalize`].
    pub(crate) fn lockout_raw(&self) -> Option<&LockoutInfo> {
        self.lockout.as_ref()
    }

    /// The phone state exactly as held.
    pub(crate) fn phone_raw(&self) -> Option<&PhoneInfo> {
        self.phone.as_ref()
    }
}

impl Default for User {
    fn default() -> Self {
        Self::new()
    }
}
