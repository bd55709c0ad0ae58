//! Nested value objects carried by a [`User`](crate::model::User).
//!
//! Lockout and phone state are plain data holders with no identity of their
//! own. They are read and written as a single atomic unit at the storage
//! layer, and an instance whose fields are all at their defaults collapses
//! to "absent" during normalization so storage never carries meaningless
//! empty sub-records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account lockout state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutInfo {
    /// Number of consecutive failed access attempts.
    pub access_failed_count: i32,

    /// When the current lockout ends, if the account is locked out.
    pub end_time: Option<DateTime<Utc>>,

    /// Whether lockout is enabled for this account at all.
    pub enabled: bool,
}

impl LockoutInfo {
    /// True when every field holds its default value.
    ///
    /// Used by normalization to decide whether the object needs storing.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Phone number state, including its role in two-factor sign-in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneInfo {
    /// The phone number on record.
    pub number: Option<String>,

    /// When the number was confirmed, if it has been.
    pub confirmation_time: Option<DateTime<Utc>>,

    /// Whether this number participates in two-factor sign-in.
    pub two_factor: bool,
}

impl PhoneInfo {
    /// True when every field holds its default value.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// True when the number has been confirmed.
    ///
    /// Derived from the presence of the confirmation timestamp; there is no
    /// separately stored flag that could disagree with it.
    pub fn confirmed(&self) -> bool {
        self.confirmation_time.is_some()
    }
}

/// An external login linked to a user.
///
/// Identified by the (provider, provider key) pair; no two logins on one
/// user may share it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginInfo {
    /// The external provider, e.g. an OAuth issuer name.
    pub login_provider: String,

    /// The provider's key for this user.
    pub provider_key: String,

    /// Display name for the provider, if any.
    pub provider_display_name: Option<String>,
}

impl LoginInfo {
    /// Creates a login descriptor without a display name.
    pub fn new(login_provider: impl Into<String>, provider_key: impl Into<String>) -> Self {
        Self {
            login_provider: login_provider.into(),
            provider_key: provider_key.into(),
            provider_display_name: None,
        }
    }
}

/// An authentication token stored for a user.
///
/// Identified by the (provider, name) pair; no two tokens on one user may
/// share it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// The provider the token belongs to.
    pub login_provider: String,

    /// The token's name within that provider.
    pub name: String,

    /// The opaque token value.
    pub value: String,
}

impl TokenInfo {
    /// Creates a token descriptor.
    pub fn new(
        login_provider: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            login_provider: login_provider.into(),
            name: name.into(),
            value: value.into(),
        }
    }
}
