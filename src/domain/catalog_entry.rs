//! Service catalog entries.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::CatalogEntryId;
use crate::error::AppError;

/// A service that can be assigned to bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CatalogEntry {
    /// Unique entry identifier.
    pub id: CatalogEntryId,
    /// Display name.
    pub name: String,
    /// Machine value stored in `Booking::services`; unique.
    pub value: String,
    /// Whether the service is currently offered.
    pub active: bool,
}

/// Submitted fields for a new catalog entry.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewCatalogEntry {
    /// Display name.
    pub name: String,
    /// Unique machine value.
    pub value: String,
    /// Whether the service is offered; defaults to `true`.
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

/// Partial update for a catalog entry.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CatalogPatch {
    /// New display name.
    pub name: Option<String>,
    /// New machine value.
    pub value: Option<String>,
    /// New offered flag.
    pub active: Option<bool>,
}

impl CatalogEntry {
    /// Validates a submission and assigns a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidRequest`] if `name` or `value` is blank.
    pub fn create(new: NewCatalogEntry) -> Result<Self, AppError> {
        let name = non_blank(new.name, "name")?;
        let value = non_blank(new.value, "value")?;
        Ok(Self {
            id: CatalogEntryId::new(),
            name,
            value,
            active: new.active,
        })
    }

    /// Applies a patch in place.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidRequest`] if the patch is empty or sets a
    /// blank `name`/`value`.
    pub fn apply(&mut self, patch: CatalogPatch) -> Result<(), AppError> {
        if patch.name.is_none() && patch.value.is_none() && patch.active.is_none() {
            return Err(AppError::InvalidRequest(
                "no fields provided for update".to_string(),
            ));
        }
        if let Some(name) = patch.name {
            self.name = non_blank(name, "name")?;
        }
        if let Some(value) = patch.value {
            self.value = non_blank(value, "value")?;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        Ok(())
    }
}

fn non_blank(raw: String, field: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(AppError::InvalidRequest(format!("{field} must not be empty")))
    } else {
        Ok(trimmed.to_string())
    }
}
