//! Names and value kinds of the mutable booking fields.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::field_value::{FieldValue, finite, non_blank_items, parse_timestamp};

/// Expected shape of a field's value on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Non-empty string.
    RequiredText,
    /// String or `null`.
    OptionalText,
    /// Integer or `null`.
    OptionalInteger,
    /// Number (or numeric string).
    RequiredNumber,
    /// Number, numeric string, or `null`.
    OptionalNumber,
    /// Date or RFC 3339 timestamp.
    RequiredTimestamp,
    /// Date, RFC 3339 timestamp, or `null`.
    OptionalTimestamp,
    /// Non-empty array of strings.
    TextList,
}

/// A mutable field of a [`super::Booking`].
///
/// Lifecycle flags, history, and bookkeeping columns have no variant, so a
/// field update cannot reach them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingField {
    /// Owning user.
    UserId,
    /// Business development manager.
    Bdm,
    /// Branch that took the booking.
    BranchName,
    /// Client company.
    CompanyName,
    /// Client contact person.
    ContactPerson,
    /// Client email.
    Email,
    /// Client phone number.
    ContactNo,
    /// Assigned catalog services.
    Services,
    /// Who closed the deal.
    ClosedBy,
    /// Total contract amount.
    TotalAmount,
    /// First installment.
    #[serde(rename = "term_1")]
    Term1,
    /// Second installment.
    #[serde(rename = "term_2")]
    Term2,
    /// Third installment.
    #[serde(rename = "term_3")]
    Term3,
    /// Date payment was received.
    PaymentDate,
    /// PAN number.
    Pan,
    /// GST number.
    Gst,
    /// Free-text remark.
    Remark,
    /// Booking date.
    Date,
    /// Post-disbursement note.
    AfterDisbursement,
    /// Payment mode / receiving bank.
    Bank,
    /// Client state.
    State,
    /// Workflow status.
    Status,
}

impl BookingField {
    /// Every mutable field, in wire order.
    pub const ALL: [Self; 22] = [
        Self::UserId,
        Self::Bdm,
        Self::BranchName,
        Self::CompanyName,
        Self::ContactPerson,
        Self::Email,
        Self::ContactNo,
        Self::Services,
        Self::ClosedBy,
        Self::TotalAmount,
        Self::Term1,
        Self::Term2,
        Self::Term3,
        Self::PaymentDate,
        Self::Pan,
        Self::Gst,
        Self::Remark,
        Self::Date,
        Self::AfterDisbursement,
        Self::Bank,
        Self::State,
        Self::Status,
    ];

    /// Wire name of the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserId => "user_id",
            Self::Bdm => "bdm",
            Self::BranchName => "branch_name",
            Self::CompanyName => "company_name",
            Self::ContactPerson => "contact_person",
            Self::Email => "email",
            Self::ContactNo => "contact_no",
            Self::Services => "services",
            Self::ClosedBy => "closed_by",
            Self::TotalAmount => "total_amount",
            Self::Term1 => "term_1",
            Self::Term2 => "term_2",
            Self::Term3 => "term_3",
            Self::PaymentDate => "payment_date",
            Self::Pan => "pan",
            Self::Gst => "gst",
            Self::Remark => "remark",
            Self::Date => "date",
            Self::AfterDisbursement => "after_disbursement",
            Self::Bank => "bank",
            Self::State => "state",
            Self::Status => "status",
        }
    }

    /// Looks a field up by wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    /// Value shape accepted for this field.
    #[must_use]
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::UserId
            | Self::Bdm
            | Self::BranchName
            | Self::ContactPerson
            | Self::Email
            | Self::Pan
            | Self::State => FieldKind::RequiredText,
            Self::CompanyName
            | Self::ClosedBy
            | Self::Gst
            | Self::Remark
            | Self::AfterDisbursement
            | Self::Bank
            | Self::Status => FieldKind::OptionalText,
            Self::ContactNo => FieldKind::OptionalInteger,
            Self::TotalAmount => FieldKind::RequiredNumber,
            Self::Term1 | Self::Term2 | Self::Term3 => FieldKind::OptionalNumber,
            Self::Date => FieldKind::RequiredTimestamp,
            Self::PaymentDate => FieldKind::OptionalTimestamp,
            Self::Services => FieldKind::TextList,
        }
    }

    /// Only full-access roles may change this field.
    #[must_use]
    pub const fn is_privileged(self) -> bool {
        matches!(self, Self::Services)
    }

    /// Restricted roles may change this field on their own bookings.
    #[must_use]
    pub const fn is_restricted_editable(self) -> bool {
        matches!(
            self,
            Self::CompanyName | Self::ContactPerson | Self::Email | Self::ContactNo | Self::Remark
        )
    }

    /// Converts a raw JSON value into a [`FieldValue`] of this field's kind.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the value has the wrong shape.
    pub fn parse_value(self, raw: &serde_json::Value) -> Result<FieldValue, String> {
        use serde_json::Value;

        let name = self.as_str();
        match (self.kind(), raw) {
            (
                FieldKind::OptionalText
                | FieldKind::OptionalInteger
                | FieldKind::OptionalNumber
                | FieldKind::OptionalTimestamp,
                Value::Null,
            ) => Ok(FieldValue::Null),
            (FieldKind::RequiredText, Value::String(s)) => {
                if s.trim().is_empty() {
                    Err(format!("{name} must not be empty"))
                } else {
                    Ok(FieldValue::Text(s.clone()))
                }
            }
            (FieldKind::OptionalText, Value::String(s)) => Ok(FieldValue::Text(s.clone())),
            (FieldKind::OptionalInteger, Value::Number(n)) => n
                .as_i64()
                .map(FieldValue::Integer)
                .ok_or_else(|| format!("{name} must be a whole number")),
            (FieldKind::OptionalInteger, Value::String(s)) => s
                .trim()
                .parse()
                .map(FieldValue::Integer)
                .map_err(|_| format!("{name} must be a whole number")),
            (FieldKind::RequiredNumber | FieldKind::OptionalNumber, Value::Number(n)) => n
                .as_f64()
                .and_then(finite)
                .map(FieldValue::Number)
                .ok_or_else(|| format!("{name} must be a finite number")),
            (FieldKind::RequiredNumber | FieldKind::OptionalNumber, Value::String(s)) => s
                .trim()
                .parse()
                .ok()
                .and_then(finite)
                .map(FieldValue::Number)
                .ok_or_else(|| format!("{name} must be a finite number")),
            (FieldKind::RequiredTimestamp | FieldKind::OptionalTimestamp, Value::String(s)) => {
                parse_timestamp(s)
                    .map(FieldValue::Timestamp)
                    .ok_or_else(|| format!("{name} must be a date (YYYY-MM-DD) or RFC 3339 timestamp"))
            }
            (FieldKind::TextList, Value::Array(items)) => {
                let services = items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .map(non_blank_items)
                    .ok_or_else(|| format!("{name} must be an array of strings"))?;
                if services.is_empty() {
                    Err(format!("{name} must not be empty"))
                } else {
                    Ok(FieldValue::TextList(services))
                }
            }
            (_, Value::Null) => Err(format!("{name} cannot be cleared")),
            _ => Err(format!("{name} has the wrong type")),
        }
    }
}

impl fmt::Display for BookingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_names_round_trip() {
        for field in BookingField::ALL {
            assert_eq!(BookingField::from_name(field.as_str()), Some(field));
            let serialized = serde_json::to_value(field).ok();
            assert_eq!(serialized, Some(json!(field.as_str())));
        }
        assert_eq!(BookingField::from_name("is_deleted"), None);
    }

    #[test]
    fn only_services_is_privileged() {
        let privileged: Vec<_> = BookingField::ALL
            .into_iter()
            .filter(|f| f.is_privileged())
            .collect();
        assert_eq!(privileged, vec![BookingField::Services]);
    }

    #[test]
    fn required_text_rejects_blank_and_null() {
        assert!(BookingField::Email.parse_value(&json!("  ")).is_err());
        assert!(BookingField::Email.parse_value(&json!(null)).is_err());
        assert_eq!(
            BookingField::Email.parse_value(&json!("a@b.c")),
            Ok(FieldValue::Text("a@b.c".to_string()))
        );
    }

    #[test]
    fn optional_fields_accept_null() {
        assert_eq!(
            BookingField::Remark.parse_value(&json!(null)),
            Ok(FieldValue::Null)
        );
        assert_eq!(
            BookingField::Term2.parse_value(&json!(null)),
            Ok(FieldValue::Null)
        );
    }

    #[test]
    fn numbers_accept_numeric_strings() {
        assert_eq!(
            BookingField::TotalAmount.parse_value(&json!("2500.5")),
            Ok(FieldValue::Number(2500.5))
        );
        assert_eq!(
            BookingField::ContactNo.parse_value(&json!(9876543210_i64)),
            Ok(FieldValue::Integer(9_876_543_210))
        );
        assert!(BookingField::ContactNo.parse_value(&json!(12.5)).is_err());
    }

    #[test]
    fn numbers_must_be_finite() {
        for raw in [json!("NaN"), json!("inf"), json!("-infinity")] {
            assert!(BookingField::TotalAmount.parse_value(&raw).is_err(), "{raw}");
            assert!(BookingField::Term1.parse_value(&raw).is_err(), "{raw}");
        }
    }

    #[test]
    fn blank_service_names_are_dropped() {
        assert!(BookingField::Services.parse_value(&json!([""])).is_err());
        assert!(BookingField::Services.parse_value(&json!(["  ", ""])).is_err());
        assert_eq!(
            BookingField::Services.parse_value(&json!(["gst", " "])),
            Ok(FieldValue::TextList(vec!["gst".to_string()]))
        );
    }

    #[test]
    fn services_must_be_non_empty_strings() {
        assert!(BookingField::Services.parse_value(&json!([])).is_err());
        assert!(BookingField::Services.parse_value(&json!(["gst", 3])).is_err());
        assert_eq!(
            BookingField::Services.parse_value(&json!(["gst"])),
            Ok(FieldValue::TextList(vec!["gst".to_string()]))
        );
    }
}
