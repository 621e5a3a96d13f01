//! Catalog service: the list of services a booking can reference.

use std::sync::Arc;

use crate::domain::{
    Action, Actor, Authorizer, CatalogEntry, CatalogEntryId, CatalogPatch, Decision,
    NewCatalogEntry, Resource,
};
use crate::error::AppError;
use crate::persistence::CatalogStore;

/// Add, list, edit and remove catalog entries.
#[derive(Debug, Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    authorizer: Arc<dyn Authorizer>,
}

impl CatalogService {
    /// Creates a new `CatalogService`.
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self { store, authorizer }
    }

    fn authorize(&self, actor: &Actor, action: Action) -> Result<(), AppError> {
        match self.authorizer.authorize(actor, action, Resource::Catalog) {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => {
                tracing::warn!(user_id = %actor.user_id, role = %actor.role, %action, "denied");
                Err(AppError::PermissionDenied(reason))
            }
        }
    }

    /// Adds an entry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidRequest`] for blank fields and
    /// [`AppError::DuplicateCatalogValue`] if the value is taken.
    pub async fn add_entry(
        &self,
        actor: &Actor,
        new: NewCatalogEntry,
    ) -> Result<CatalogEntry, AppError> {
        self.authorize(actor, Action::AddCatalogEntry)?;
        let entry = self.store.insert_entry(CatalogEntry::create(new)?).await?;
        tracing::info!(entry_id = %entry.id, value = %entry.value, "catalog entry added");
        Ok(entry)
    }

    /// Lists all entries ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a persistence error on storage failure.
    pub async fn list_entries(&self, actor: &Actor) -> Result<Vec<CatalogEntry>, AppError> {
        self.authorize(actor, Action::ViewCatalog)?;
        self.store.list_entries().await
    }

    /// Edits an entry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PermissionDenied`] below full access,
    /// [`AppError::CatalogEntryNotFound`], or a validation error.
    pub async fn update_entry(
        &self,
        actor: &Actor,
        id: CatalogEntryId,
        patch: CatalogPatch,
    ) -> Result<CatalogEntry, AppError> {
        self.authorize(actor, Action::EditCatalogEntry)?;
        let mut entry = self.store.get_entry(id).await?;
        entry.apply(patch)?;
        let entry = self.store.update_entry(entry).await?;
        tracing::info!(entry_id = %id, "catalog entry updated");
        Ok(entry)
    }

    /// Removes an entry. Bookings that already reference its value keep it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PermissionDenied`] below full access or
    /// [`AppError::CatalogEntryNotFound`].
    pub async fn delete_entry(&self, actor: &Actor, id: CatalogEntryId) -> Result<(), AppError> {
        self.authorize(actor, Action::RemoveCatalogEntry)?;
        self.store.delete_entry(id).await?;
        tracing::info!(entry_id = %id, "catalog entry deleted");
        Ok(())
    }
}
