//! The role entity.

use super::RoleId;

/// A role that users can be members of.
///
/// Same identifier and uniqueness pattern as [`User`](crate::model::User) at
/// a much smaller scale: the normalized name is globally unique, enforced by
/// the role store's marker rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    id: RoleId,
    name: Option<String>,
    normalized_name: Option<String>,
}

impl Role {
    /// Creates a role with a fresh identifier.
    pub fn new() -> Self {
        Self::with_id(RoleId::new())
    }

    pub(crate) fn with_id(id: RoleId) -> Self {
        Self {
            id,
            name: None,
            normalized_name: None,
        }
    }

    /// The immutable identifier (storage partition key).
    pub fn id(&self) -> &RoleId {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn normalized_name(&self) -> Option<&str> {
        self.normalized_name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<Option<String>>) {
        self.name = name.into();
    }

    pub fn set_normalized_name(&mut self, value: impl Into<Option<String>>) {
        self.normalized_name = value.into();
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::new()
    }
}
