//! Closed value type for booking fields.
//!
//! Every mutable booking field reads and writes through [`FieldValue`], so
//! the change history can record `{old, new}` pairs without falling back
//! to untyped JSON.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One booking field value.
///
/// Serialized adjacently tagged so that a stored history entry round-trips
/// with its original type, e.g. `{"type": "text", "value": "Pending"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Absent optional value.
    Null,
    /// Free text.
    Text(String),
    /// Whole number (phone numbers).
    Integer(i64),
    /// Monetary or other decimal amount.
    Number(f64),
    /// Point in time.
    Timestamp(DateTime<Utc>),
    /// Ordered list of strings; compared element by element.
    TextList(Vec<String>),
}

impl FieldValue {
    /// Wraps an optional string, mapping `None` to [`FieldValue::Null`].
    #[must_use]
    pub fn from_opt_text(value: Option<&String>) -> Self {
        value.map_or(Self::Null, |s| Self::Text(s.clone()))
    }

    /// Wraps an optional amount, mapping `None` to [`FieldValue::Null`].
    #[must_use]
    pub fn from_opt_number(value: Option<f64>) -> Self {
        value.map_or(Self::Null, Self::Number)
    }

    /// Wraps an optional timestamp, mapping `None` to [`FieldValue::Null`].
    #[must_use]
    pub fn from_opt_timestamp(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(Self::Null, Self::Timestamp)
    }

    /// Returns `true` for [`FieldValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Text(s) => write!(f, "\"{s}\""),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Self::TextList(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// Parses a client-supplied timestamp.
///
/// Accepts RFC 3339 (`2024-05-01T10:00:00Z`) or a bare calendar date
/// (`2024-05-01`), which is read as midnight UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Keeps `n` only if it is finite. NaN and infinities have no JSON form
/// and never compare equal to themselves.
#[must_use]
pub fn finite(n: f64) -> Option<f64> {
    n.is_finite().then_some(n)
}

/// Drops blank entries from a list of names.
#[must_use]
pub fn non_blank_items(items: Vec<String>) -> Vec<String> {
    items.into_iter().filter(|s| !s.trim().is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn non_finite_numbers_are_refused() {
        assert_eq!(finite(2.5), Some(2.5));
        assert_eq!(finite(f64::NAN), None);
        assert_eq!(finite(f64::NEG_INFINITY), None);
    }

    #[test]
    fn lists_compare_in_order() {
        let a = FieldValue::TextList(vec!["gst".to_string(), "audit".to_string()]);
        let b = FieldValue::TextList(vec!["audit".to_string(), "gst".to_string()]);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn amounts_compare_by_value() {
        assert_eq!(FieldValue::Number(1000.0), FieldValue::Number(1e3));
    }

    #[test]
    fn parse_timestamp_accepts_date_and_rfc3339() {
        let midnight = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).single();
        assert_eq!(parse_timestamp("2024-05-01"), midnight);
        assert_eq!(parse_timestamp("2024-05-01T00:00:00+00:00"), midnight);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn serialized_form_keeps_type_tag() {
        let json = serde_json::to_value(FieldValue::Text("Pending".to_string())).ok();
        assert_eq!(
            json,
            Some(serde_json::json!({"type": "text", "value": "Pending"}))
        );
        let null = serde_json::to_value(FieldValue::Null).ok();
        assert_eq!(null, Some(serde_json::json!({"type": "null"})));
    }
}
