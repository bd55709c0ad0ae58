//! Role store operations.
//!
//! Mirrors the user pattern at a much smaller scale: one marker table
//! enforcing uniqueness of the normalized role name, and no collections.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{StoreError, required};
use crate::Result;
use crate::engine::RowEngine;
use crate::model::{Role, RoleId};
use crate::row::{RoleRow, RowError, schema};

/// Persistence operations for [`Role`] entities.
pub struct RoleStore {
    engine: Arc<dyn RowEngine>,
}

impl RoleStore {
    /// Creates a role store over the given engine.
    pub fn new(engine: Arc<dyn RowEngine>) -> Self {
        Self { engine }
    }

    /// Creates a new role.
    ///
    /// The normalized-name marker is claimed first; losing the conditional
    /// insert fails the call before the main row is written.
    ///
    /// # Errors
    /// * `ModelError::MissingValue` when the normalized name is absent
    /// * `StoreError::DuplicateRoleName` when the marker is already held
    pub async fn create_role(&self, role: &Role) -> Result<()> {
        let name = required(role.normalized_name(), "normalized role name")?;
        let id = role.id().to_string();

        if !self
            .engine
            .insert_if_absent(schema::ROLES_BY_NAME, &name, id.clone().into_bytes())
            .await?
        {
            return Err(StoreError::DuplicateRoleName { value: name }.into());
        }

        let row = RoleRow::from_role(role);
        self.engine
            .put_row(schema::ROLES, &id, row.encode()?)
            .await?;

        info!(role = %role.id(), "created role");
        Ok(())
    }

    /// Updates an existing role, re-running the marker dance when the
    /// normalized name changed.
    ///
    /// # Errors
    /// * `StoreError::RoleNotFound` when no row exists for the identifier
    /// * `StoreError::DuplicateRoleName` when the new name's marker is held
    pub async fn update_role(&self, role: &Role) -> Result<()> {
        let new_name = required(role.normalized_name(), "normalized role name")?;
        let id = role.id().to_string();

        let stored_bytes = self
            .engine
            .get_row(schema::ROLES, &id)
            .await?
            .ok_or_else(|| {
                crate::Error::from(StoreError::RoleNotFound {
                    id: role.id().clone(),
                })
            })?;
        let stored = RoleRow::decode(&stored_bytes)?;

        let name_changed = stored.normalized_name.as_deref() != Some(new_name.as_str());
        if name_changed
            && !self
                .engine
                .insert_if_absent(schema::ROLES_BY_NAME, &new_name, id.clone().into_bytes())
                .await?
        {
            return Err(StoreError::DuplicateRoleName { value: new_name }.into());
        }

        let row = RoleRow::from_role(role);
        self.engine
            .put_row(schema::ROLES, &id, row.encode()?)
            .await?;

        if name_changed && let Some(old) = stored.normalized_name {
            if let Err(err) = self.engine.delete_row(schema::ROLES_BY_NAME, &old).await {
                warn!(role = %role.id(), error = %err, "failed to release old role name marker");
            }
        }

        debug!(role = %role.id(), "updated role");
        Ok(())
    }

    /// Deletes a role and its name marker. Deleting a non-existent role is
    /// a no-op.
    pub async fn delete_role(&self, id: &RoleId) -> Result<()> {
        let key = id.to_string();
        let Some(bytes) = self.engine.get_row(schema::ROLES, &key).await? else {
            return Ok(());
        };
        let stored = RoleRow::decode(&bytes)?;

        if let Some(name) = &stored.normalized_name {
            self.engine.delete_row(schema::ROLES_BY_NAME, name).await?;
        }
        self.engine.delete_row(schema::ROLES, &key).await?;

        info!(role = %id, "deleted role");
        Ok(())
    }

    /// Looks up a role by identifier.
    pub async fn find_by_id(&self, id: &RoleId) -> Result<Option<Role>> {
        match self.engine.get_row(schema::ROLES, &id.to_string()).await? {
            Some(bytes) => Ok(Some(RoleRow::decode(&bytes)?.into_role())),
            None => Ok(None),
        }
    }

    /// Looks up a role by normalized name.
    ///
    /// A marker pointing at a missing row is a crash leftover and reads as
    /// absent.
    pub async fn find_by_name(&self, normalized_name: &str) -> Result<Option<Role>> {
        let Some(bytes) = self
            .engine
            .get_row(schema::ROLES_BY_NAME, normalized_name)
            .await?
        else {
            return Ok(None);
        };

        let id = std::str::from_utf8(&bytes)
            .ok()
            .and_then(RoleId::parse)
            .ok_or_else(|| {
                crate::Error::from(RowError::CorruptMarker {
                    table: schema::ROLES_BY_NAME.to_string(),
                })
            })?;
        self.find_by_id(&id).await
    }
}
