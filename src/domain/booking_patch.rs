//! Partial booking updates and field-level diffing.
//!
//! An update body is a flat JSON object. Attribution metadata (`updated_by`,
//! `note`, `expected_version`) is split off first; every other key must name
//! a [`BookingField`]. The diff compares each proposed value with the stored
//! one and yields only the fields that actually change.

use std::collections::BTreeMap;

use super::change_entry::{FieldChange, FieldChanges};
use super::{Booking, BookingField, FieldValue, Role};
use crate::error::AppError;

const ACTOR_KEYS: [&str; 3] = ["updated_by", "updatedBy", "actor"];
const NOTE_KEY: &str = "note";
const VERSION_KEY: &str = "expected_version";

/// Proposed values keyed by field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingPatch {
    fields: BTreeMap<BookingField, FieldValue>,
}

impl BookingPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a proposed value.
    #[must_use]
    pub fn with(mut self, field: BookingField, value: FieldValue) -> Self {
        self.fields.insert(field, value);
        self
    }

    /// Number of proposed fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when nothing is proposed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns `true` if the patch proposes a value for `field`.
    #[must_use]
    pub fn contains(&self, field: BookingField) -> bool {
        self.fields.contains_key(&field)
    }

    /// Silently drops every field `role` may not change.
    ///
    /// Returns the dropped field names so callers can log them.
    pub fn retain_editable_by(&mut self, role: Role) -> Vec<BookingField> {
        let mut dropped = Vec::new();
        self.fields.retain(|field, _| {
            let keep = role.may_edit_field(*field);
            if !keep {
                dropped.push(*field);
            }
            keep
        });
        dropped
    }

    /// Compares every proposed value with the stored one.
    ///
    /// Lists compare as whole ordered sequences; scalars compare by value.
    #[must_use]
    pub fn diff(&self, stored: &Booking) -> FieldChanges {
        self.fields
            .iter()
            .filter_map(|(field, proposed)| {
                let current = stored.get(*field);
                (current != *proposed).then(|| {
                    (
                        *field,
                        FieldChange {
                            old: current,
                            new: proposed.clone(),
                        },
                    )
                })
            })
            .collect()
    }

    /// Writes every proposed value into `booking`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidRequest`] if a value does not fit its field.
    pub fn apply_to(self, booking: &mut Booking) -> Result<(), AppError> {
        for (field, value) in self.fields {
            booking.set(field, value)?;
        }
        Ok(())
    }
}

/// A parsed update request: the patch plus its attribution metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingUpdate {
    /// Claimed author of the change; `None` records `"Unknown"`.
    pub actor: Option<String>,
    /// Optional note stored with the change entry.
    pub note: Option<String>,
    /// Version the client last read; checked before writing when present.
    pub expected_version: Option<u64>,
    /// Proposed field values.
    pub patch: BookingPatch,
}

impl BookingUpdate {
    /// Parses a JSON update body.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidRequest`] if the body is not an object,
    /// names an unknown or read-only field, or carries a badly typed value.
    pub fn from_json(body: serde_json::Value) -> Result<Self, AppError> {
        let serde_json::Value::Object(mut map) = body else {
            return Err(AppError::InvalidRequest(
                "update body must be a JSON object".to_string(),
            ));
        };

        let mut actor = None;
        for key in ACTOR_KEYS {
            if let Some(value) = map.remove(key) {
                actor = actor.or_else(|| value.as_str().map(str::to_string));
            }
        }
        let note = map
            .remove(NOTE_KEY)
            .and_then(|v| v.as_str().map(str::to_string));
        let expected_version = match map.remove(VERSION_KEY) {
            None | Some(serde_json::Value::Null) => None,
            Some(v) => Some(v.as_u64().ok_or_else(|| {
                AppError::InvalidRequest(format!("{VERSION_KEY} must be a positive integer"))
            })?),
        };

        let mut patch = BookingPatch::new();
        for (key, raw) in &map {
            let field = BookingField::from_name(key).ok_or_else(|| {
                AppError::InvalidRequest(format!("unknown or read-only field: {key}"))
            })?;
            let value = field.parse_value(raw).map_err(AppError::InvalidRequest)?;
            patch = patch.with(field, value);
        }

        Ok(Self {
            actor,
            note,
            expected_version,
            patch,
        })
    }
}
