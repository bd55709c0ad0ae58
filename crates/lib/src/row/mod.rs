//! Mapping layer between entities and their wide-row representation.
//!
//! The row types here are the denormalized shapes that actually reach the
//! storage engine. The mapping designates the identifier as the partition
//! key, writes the lockout and phone sub-structures as single frozen blobs
//! (never updated field-by-field), and mirrors role membership into a
//! secondary index so "find all users with role R" needs no scan.
//!
//! Reconstruction routes every collection member back through the entity's
//! own add operations, so a corrupted row surfaces a duplicate-entry error
//! instead of silently resurrecting the duplicate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{LockoutInfo, LoginInfo, PhoneInfo, Role, RoleId, TokenInfo, User, UserId};
use crate::Result;

mod errors;
pub use errors::RowError;


/// Table, marker, and index names of the wide-row schema.
pub mod schema {
    /// Main user rows, partitioned by user identifier.
    pub const USERS: &str = "users";

    /// Main role rows, partitioned by role identifier.
    pub const ROLES: &str = "roles";

    /// Uniqueness markers: normalized user name -> user identifier.
    pub const USERS_BY_NAME: &str = "users_by_name";

    /// Uniqueness markers: normalized email -> user identifier.
    pub const USERS_BY_EMAIL: &str = "users_by_email";

    /// Login lookup markers: (provider, provider key) -> user identifier.
    pub const USERS_BY_LOGIN: &str = "users_by_login";

    /// Uniqueness markers: normalized role name -> role identifier.
    pub const ROLES_BY_NAME: &str = "roles_by_name";

    /// Secondary index: role name -> member user identifiers.
    pub const USERS_BY_ROLE: &str = "users_by_role";

    /// Composite key for a login marker row.
    pub fn login_key(provider: &str, key: &str) -> String {
        let mut s = String::with_capacity(provider.len() + 1 + key.len());
        s.push_str(provider);
        s.push(':');
        s.push_str(key);
        s
    }
}

/// The stored shape of a [`User`].
///
/// The identifier is the partition key. `lockout` and `phone` are frozen
/// sub-structures: absent entirely rather than stored as empty records, and
/// written as one unit with the rest of the row. `roles` additionally feeds
/// the [`schema::USERS_BY_ROLE`] index maintained by the store operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRow {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_confirmation_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_stamp: Option<String>,
    #[serde(default)]
    pub two_factor_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lockout: Option<LockoutInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<PhoneInfo>,
    #[serde(default)]
    pub logins: Vec<LoginInfo>,
    #[serde(default)]
    pub tokens: Vec<TokenInfo>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl UserRow {
    /// Maps an entity to its stored shape.
    ///
    /// Normalization is applied on the way out: an all-default lockout or
    /// phone never reaches storage, regardless of what the entity holds.
    pub fn from_user(user: &User) -> Self {
        let lockout = user.lockout_raw().filter(|l| !l.is_default()).cloned();
        let phone = user.phone_raw().filter(|p| !p.is_default()).cloned();

        Self {
            id: user.id().clone(),
            user_name: user.user_name().map(str::to_owned),
            normalized_user_name: user.normalized_user_name().map(str::to_owned),
            email: user.email().map(str::to_owned),
            normalized_email: user.normalized_email().map(str::to_owned),
            email_confirmation_time: user.email_confirmation_time(),
            password_hash: user.password_hash().map(str::to_owned),
            security_stamp: user.security_stamp().map(str::to_owned),
            two_factor_enabled: user.two_factor_enabled(),
            lockout,
            phone,
            logins: user.logins().to_vec(),
            tokens: user.tokens().to_vec(),
            roles: user.roles().to_vec(),
        }
    }

    /// Reconstructs the entity from its stored shape.
    ///
    /// Absent lockout/phone reconstruct as default-valued objects through
    /// the entity's accessors. Collection members are re-added through the
    /// invariant-checked operations, so a row carrying duplicates fails
    /// with the corresponding duplicate-entry error.
    pub fn into_user(self) -> Result<User> {
        let mut user = User::with_id(self.id);
        user.set_user_name(self.user_name);
        user.set_normalized_user_name(self.normalized_user_name);
        user.set_email(self.email);
        user.set_normalized_email(self.normalized_email);
        if let Some(at) = self.email_confirmation_time {
            user.confirm_email(at);
        }
        user.set_password_hash(self.password_hash);
        user.set_security_stamp(self.security_stamp);
        user.set_two_factor_enabled(self.two_factor_enabled);
        if let Some(lockout) = self.lockout {
            user.set_lockout(lockout);
        }
        if let Some(phone) = self.phone {
            user.set_phone(phone);
        }

        for login in self.logins {
            user.add_login(login)?;
        }
        for token in self.tokens {
            user.add_token(token)?;
        }
        for role in self.roles {
            user.add_role(role)?;
        }

        Ok(user)
    }

    /// Serializes the row for storage.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|source| {
            RowError::SerializationFailed {
                table: schema::USERS,
                source,
            }
            .into()
        })
    }

    /// Deserializes a stored row.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|source| {
            RowError::DeserializationFailed {
                table: schema::USERS,
                source,
            }
            .into()
        })
    }
}

/// The stored shape of a [`Role`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRow {
    pub id: RoleId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_name: Option<String>,
}

impl RoleRow {
    /// Maps a role to its stored shape.
    pub fn from_role(role: &Role) -> Self {
        Self {
            id: role.id().clone(),
            name: role.name().map(str::to_owned),
            normalized_name: role.normalized_name().map(str::to_owned),
        }
    }

    /// Reconstructs the role from its stored shape.
    pub fn into_role(self) -> Role {
        let mut role = Role::with_id(self.id);
        role.set_name(self.name);
        role.set_normalized_name(self.normalized_name);
        role
    }

    /// Serializes the row for storage.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|source| {
            RowError::SerializationFailed {
                table: schema::ROLES,
                source,
            }
            .into()
        })
    }

    /// Deserializes a stored row.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|source| {
            RowError::DeserializationFailed {
                table: schema::ROLES,
                source,
            }
            .into()
        })
    }
}
