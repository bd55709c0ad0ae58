//! Opaque identifier types for users and roles.
//!
//! Identifiers double as the partition key at the storage layer: the value
//! determines where the row physically lives, so it is assigned once at
//! creation and never changes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a [`User`](crate::model::User).
///
/// Wraps a UUIDv4 and serializes as its hyphenated string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an identifier from its string form.
    pub fn parse(s: impl AsRef<str>) -> Option<Self> {
        Uuid::parse_str(s.as_ref()).ok().map(Self)
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a [`Role`](crate::model::Role).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an identifier from its string form.
    pub fn parse(s: impl AsRef<str>) -> Option<Self> {
        Uuid::parse_str(s.as_ref()).ok().map(Self)
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
