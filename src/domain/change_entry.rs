//! Audit entries appended to a booking's change history.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{BookingField, FieldValue};

/// Actor recorded when an update carries no attribution.
pub const UNKNOWN_ACTOR: &str = "Unknown";

/// Before/after pair for one changed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Stored value before the update.
    pub old: FieldValue,
    /// Value written by the update.
    pub new: FieldValue,
}

/// Field name to before/after pair. Only fields whose value differs appear.
pub type FieldChanges = BTreeMap<BookingField, FieldChange>;

/// One audit event: who changed what, when, and from/to which values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChangeEntry {
    /// Identity that made the change.
    pub actor: String,
    /// Server time the entry was appended.
    pub timestamp: DateTime<Utc>,
    /// Optional free-text note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Changed fields keyed by wire name.
    #[schema(value_type = Object)]
    pub field_changes: FieldChanges,
}

impl ChangeEntry {
    /// Builds an entry, attributing it to [`UNKNOWN_ACTOR`] when `actor` is
    /// missing or blank and dropping a blank note.
    #[must_use]
    pub fn new(
        actor: Option<&str>,
        timestamp: DateTime<Utc>,
        note: Option<&str>,
        field_changes: FieldChanges,
    ) -> Self {
        let actor = actor
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(UNKNOWN_ACTOR)
            .to_string();
        let note = note
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        Self {
            actor,
            timestamp,
            note,
            field_changes,
        }
    }

    /// Names of the fields this entry touched.
    pub fn fields(&self) -> impl Iterator<Item = BookingField> + '_ {
        self.field_changes.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_actor_becomes_unknown() {
        let entry = ChangeEntry::new(Some("  "), Utc::now(), None, FieldChanges::new());
        assert_eq!(entry.actor, UNKNOWN_ACTOR);
        let entry = ChangeEntry::new(None, Utc::now(), Some(""), FieldChanges::new());
        assert_eq!(entry.actor, UNKNOWN_ACTOR);
        assert_eq!(entry.note, None);
    }

    #[test]
    fn field_changes_serialize_under_wire_names() {
        let mut changes = FieldChanges::new();
        changes.insert(
            BookingField::Term1,
            FieldChange {
                old: FieldValue::Null,
                new: FieldValue::Number(500.0),
            },
        );
        let entry = ChangeEntry::new(Some("alice"), Utc::now(), Some("first term"), changes);
        let json = serde_json::to_value(&entry).unwrap_or_default();
        assert_eq!(
            json["field_changes"]["term_1"]["new"],
            serde_json::json!({"type": "number", "value": 500.0})
        );
        assert_eq!(json["note"], "first term");
    }
}
