//! The booking record and its soft-delete lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use utoipa::ToSchema;

use super::change_entry::{ChangeEntry, UNKNOWN_ACTOR};
use super::field_value::{finite, non_blank_items, parse_timestamp};
use super::{BookingField, BookingId, FieldValue};
use crate::error::AppError;

/// Where a booking sits in the soft-delete state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingState {
    /// Visible in listings and editable.
    Active,
    /// In the trash; only full-access roles can see, restore, or destroy it.
    Trashed,
}

/// One client engagement.
///
/// `change_history` is append-only. `deleted_at` and `deleted_by` are set
/// exactly when `is_deleted` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    /// Unique booking identifier.
    pub id: BookingId,
    /// Optimistic-concurrency version, bumped on every write.
    pub version: u64,
    /// Owning user.
    pub user_id: String,
    /// Business development manager.
    pub bdm: String,
    /// Branch that took the booking.
    pub branch_name: String,
    /// Client company.
    pub company_name: Option<String>,
    /// Client contact person.
    pub contact_person: String,
    /// Client email.
    pub email: String,
    /// Client phone number.
    pub contact_no: Option<i64>,
    /// Assigned catalog services (never empty).
    pub services: Vec<String>,
    /// Who closed the deal.
    pub closed_by: Option<String>,
    /// Total contract amount.
    pub total_amount: f64,
    /// First installment.
    pub term_1: Option<f64>,
    /// Second installment.
    pub term_2: Option<f64>,
    /// Third installment.
    pub term_3: Option<f64>,
    /// Date payment was received.
    pub payment_date: Option<DateTime<Utc>>,
    /// PAN number.
    pub pan: String,
    /// GST number.
    pub gst: Option<String>,
    /// Free-text remark.
    pub remark: Option<String>,
    /// Booking date.
    pub date: DateTime<Utc>,
    /// Post-disbursement note.
    pub after_disbursement: Option<String>,
    /// Payment mode / receiving bank.
    pub bank: Option<String>,
    /// Client state.
    pub state: String,
    /// Workflow status.
    pub status: Option<String>,
    /// Audit trail, oldest first.
    #[serde(default)]
    pub change_history: Vec<ChangeEntry>,
    /// Soft-delete flag.
    #[serde(default)]
    pub is_deleted: bool,
    /// When the booking was moved to trash.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Who moved the booking to trash.
    pub deleted_by: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last write timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Submitted fields for a new booking.
///
/// Everything is optional at the type level so that all missing required
/// fields can be reported in one response.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NewBooking {
    /// Owning user (required).
    pub user_id: Option<String>,
    /// Business development manager (required).
    pub bdm: Option<String>,
    /// Branch (required).
    pub branch_name: Option<String>,
    /// Client company; defaults to an empty string.
    pub company_name: Option<String>,
    /// Contact person (required).
    pub contact_person: Option<String>,
    /// Email (required).
    pub email: Option<String>,
    /// Phone number.
    #[serde(default, deserialize_with = "lenient_i64")]
    pub contact_no: Option<i64>,
    /// Services (required, non-empty).
    #[serde(default)]
    pub services: Vec<String>,
    /// Who closed the deal.
    pub closed_by: Option<String>,
    /// Total amount (required).
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_amount: Option<f64>,
    /// First installment.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub term_1: Option<f64>,
    /// Second installment.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub term_2: Option<f64>,
    /// Third installment.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub term_3: Option<f64>,
    /// Payment date (`YYYY-MM-DD` or RFC 3339).
    pub payment_date: Option<String>,
    /// PAN number (required).
    pub pan: Option<String>,
    /// GST number; defaults to `"N/A"`.
    pub gst: Option<String>,
    /// Remark.
    pub remark: Option<String>,
    /// Booking date (required, `YYYY-MM-DD` or RFC 3339).
    pub date: Option<String>,
    /// Workflow status.
    pub status: Option<String>,
    /// Payment mode / bank.
    pub bank: Option<String>,
    /// Post-disbursement note.
    #[serde(alias = "funddisbursement")]
    pub after_disbursement: Option<String>,
    /// Client state (required).
    pub state: Option<String>,
}

/// A number as clients send it: JSON number or numeric string.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Number(T),
    Text(String),
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + std::str::FromStr,
{
    match Option::<Lenient<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Lenient::Number(n)) => Ok(Some(n)),
        Some(Lenient::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Lenient::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid number: {s}"))),
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    lenient(deserializer)
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    lenient(deserializer)
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn parse_date_field(raw: Option<String>, field: &str) -> Result<Option<DateTime<Utc>>, AppError> {
    match present(raw) {
        None => Ok(None),
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| AppError::InvalidRequest(format!("invalid {field} format: {s}"))),
    }
}

impl Booking {
    /// Validates a submission and builds the stored record at version 1.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MissingFields`] listing every absent required
    /// field, or [`AppError::InvalidRequest`] for an unparseable date or a
    /// non-finite amount.
    pub fn create(new: NewBooking, id: BookingId, now: DateTime<Utc>) -> Result<Self, AppError> {
        let branch_name = present(new.branch_name);
        let contact_person = present(new.contact_person);
        let user_id = present(new.user_id);
        let bdm = present(new.bdm);
        let email = present(new.email);
        let services = non_blank_items(new.services);
        for (name, amount) in [
            ("total_amount", new.total_amount),
            ("term_1", new.term_1),
            ("term_2", new.term_2),
            ("term_3", new.term_3),
        ] {
            if amount.is_some_and(|n| finite(n).is_none()) {
                return Err(AppError::InvalidRequest(format!(
                    "{name} must be a finite number"
                )));
            }
        }
        let pan = present(new.pan);
        let state = present(new.state);
        let date = parse_date_field(new.date, "date")?;
        let payment_date = parse_date_field(new.payment_date, "payment_date")?;

        let mut missing = Vec::new();
        let mut require = |name: &str, ok: bool| {
            if !ok {
                missing.push(name.to_string());
            }
        };
        require("branch_name", branch_name.is_some());
        require("contact_person", contact_person.is_some());
        require("user_id", user_id.is_some());
        require("bdm", bdm.is_some());
        require("email", email.is_some());
        require("services", !services.is_empty());
        require("total_amount", new.total_amount.is_some());
        require("pan", pan.is_some());
        require("state", state.is_some());
        require("date", date.is_some());

        let (
            Some(branch_name),
            Some(contact_person),
            Some(user_id),
            Some(bdm),
            Some(email),
            Some(total_amount),
            Some(pan),
            Some(state),
            Some(date),
        ) = (
            branch_name,
            contact_person,
            user_id,
            bdm,
            email,
            new.total_amount,
            pan,
            state,
            date,
        )
        else {
            return Err(AppError::MissingFields(missing));
        };
        if !missing.is_empty() {
            return Err(AppError::MissingFields(missing));
        }

        Ok(Self {
            id,
            version: 1,
            user_id,
            bdm,
            branch_name,
            company_name: Some(new.company_name.unwrap_or_default()),
            contact_person,
            email,
            contact_no: new.contact_no,
            services,
            closed_by: new.closed_by,
            total_amount,
            term_1: new.term_1,
            term_2: new.term_2,
            term_3: new.term_3,
            payment_date,
            pan,
            gst: Some(present(new.gst).unwrap_or_else(|| "N/A".to_string())),
            remark: new.remark,
            date,
            after_disbursement: new.after_disbursement,
            bank: new.bank,
            state,
            status: new.status,
            change_history: Vec::new(),
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Current soft-delete state.
    #[must_use]
    pub const fn lifecycle_state(&self) -> BookingState {
        if self.is_deleted {
            BookingState::Trashed
        } else {
            BookingState::Active
        }
    }

    /// Reads a mutable field as a [`FieldValue`].
    #[must_use]
    pub fn get(&self, field: BookingField) -> FieldValue {
        match field {
            BookingField::UserId => FieldValue::Text(self.user_id.clone()),
            BookingField::Bdm => FieldValue::Text(self.bdm.clone()),
            BookingField::BranchName => FieldValue::Text(self.branch_name.clone()),
            BookingField::CompanyName => FieldValue::from_opt_text(self.company_name.as_ref()),
            BookingField::ContactPerson => FieldValue::Text(self.contact_person.clone()),
            BookingField::Email => FieldValue::Text(self.email.clone()),
            BookingField::ContactNo => self.contact_no.map_or(FieldValue::Null, FieldValue::Integer),
            BookingField::Services => FieldValue::TextList(self.services.clone()),
            BookingField::ClosedBy => FieldValue::from_opt_text(self.closed_by.as_ref()),
            BookingField::TotalAmount => FieldValue::Number(self.total_amount),
            BookingField::Term1 => FieldValue::from_opt_number(self.term_1),
            BookingField::Term2 => FieldValue::from_opt_number(self.term_2),
            BookingField::Term3 => FieldValue::from_opt_number(self.term_3),
            BookingField::PaymentDate => FieldValue::from_opt_timestamp(self.payment_date),
            BookingField::Pan => FieldValue::Text(self.pan.clone()),
            BookingField::Gst => FieldValue::from_opt_text(self.gst.as_ref()),
            BookingField::Remark => FieldValue::from_opt_text(self.remark.as_ref()),
            BookingField::Date => FieldValue::Timestamp(self.date),
            BookingField::AfterDisbursement => {
                FieldValue::from_opt_text(self.after_disbursement.as_ref())
            }
            BookingField::Bank => FieldValue::from_opt_text(self.bank.as_ref()),
            BookingField::State => FieldValue::Text(self.state.clone()),
            BookingField::Status => FieldValue::from_opt_text(self.status.as_ref()),
        }
    }

    /// Writes a mutable field.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidRequest`] if `value` does not match the
    /// field's kind.
    pub fn set(&mut self, field: BookingField, value: FieldValue) -> Result<(), AppError> {
        let mismatch = || AppError::InvalidRequest(format!("{field} has the wrong type"));
        match field {
            BookingField::UserId => self.user_id = text(value).ok_or_else(mismatch)?,
            BookingField::Bdm => self.bdm = text(value).ok_or_else(mismatch)?,
            BookingField::BranchName => self.branch_name = text(value).ok_or_else(mismatch)?,
            BookingField::CompanyName => self.company_name = opt_text(value).ok_or_else(mismatch)?,
            BookingField::ContactPerson => {
                self.contact_person = text(value).ok_or_else(mismatch)?;
            }
            BookingField::Email => self.email = text(value).ok_or_else(mismatch)?,
            BookingField::ContactNo => {
                self.contact_no = match value {
                    FieldValue::Null => None,
                    FieldValue::Integer(n) => Some(n),
                    _ => return Err(mismatch()),
                };
            }
            BookingField::Services => match value {
                FieldValue::TextList(items) if !items.is_empty() => self.services = items,
                _ => return Err(mismatch()),
            },
            BookingField::ClosedBy => self.closed_by = opt_text(value).ok_or_else(mismatch)?,
            BookingField::TotalAmount => match value {
                FieldValue::Number(n) => self.total_amount = n,
                _ => return Err(mismatch()),
            },
            BookingField::Term1 => self.term_1 = opt_number(value).ok_or_else(mismatch)?,
            BookingField::Term2 => self.term_2 = opt_number(value).ok_or_else(mismatch)?,
            BookingField::Term3 => self.term_3 = opt_number(value).ok_or_else(mismatch)?,
            BookingField::PaymentDate => {
                self.payment_date = match value {
                    FieldValue::Null => None,
                    FieldValue::Timestamp(t) => Some(t),
                    _ => return Err(mismatch()),
                };
            }
            BookingField::Pan => self.pan = text(value).ok_or_else(mismatch)?,
            BookingField::Gst => self.gst = opt_text(value).ok_or_else(mismatch)?,
            BookingField::Remark => self.remark = opt_text(value).ok_or_else(mismatch)?,
            BookingField::Date => match value {
                FieldValue::Timestamp(t) => self.date = t,
                _ => return Err(mismatch()),
            },
            BookingField::AfterDisbursement => {
                self.after_disbursement = opt_text(value).ok_or_else(mismatch)?;
            }
            BookingField::Bank => self.bank = opt_text(value).ok_or_else(mismatch)?,
            BookingField::State => self.state = text(value).ok_or_else(mismatch)?,
            BookingField::Status => self.status = opt_text(value).ok_or_else(mismatch)?,
        }
        Ok(())
    }

    /// Moves an active booking to the trash.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidState`] if the booking is already trashed.
    pub fn move_to_trash(&mut self, actor: Option<&str>, now: DateTime<Utc>) -> Result<(), AppError> {
        if self.is_deleted {
            return Err(AppError::InvalidState(format!(
                "booking {} is already in trash",
                self.id
            )));
        }
        self.is_deleted = true;
        self.deleted_at = Some(now);
        self.deleted_by = Some(
            actor
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .unwrap_or(UNKNOWN_ACTOR)
                .to_string(),
        );
        self.updated_at = now;
        Ok(())
    }

    /// Returns a trashed booking to the active state.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidState`] if the booking is not trashed.
    pub fn restore(&mut self, now: DateTime<Utc>) -> Result<(), AppError> {
        if !self.is_deleted {
            return Err(AppError::InvalidState(format!(
                "booking {} is not in trash",
                self.id
            )));
        }
        self.is_deleted = false;
        self.deleted_at = None;
        self.deleted_by = None;
        self.updated_at = now;
        Ok(())
    }

    /// Checks that the booking may be destroyed permanently.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidState`] unless the booking is trashed.
    pub fn ensure_destroyable(&self) -> Result<(), AppError> {
        if self.is_deleted {
            Ok(())
        } else {
            Err(AppError::InvalidState(format!(
                "booking {} must be moved to trash before it can be deleted",
                self.id
            )))
        }
    }
}

fn text(value: FieldValue) -> Option<String> {
    match value {
        FieldValue::Text(s) => Some(s),
        _ => None,
    }
}

fn opt_text(value: FieldValue) -> Option<Option<String>> {
    match value {
        FieldValue::Null => Some(None),
        FieldValue::Text(s) => Some(Some(s)),
        _ => None,
    }
}

fn opt_number(value: FieldValue) -> Option<Option<f64>> {
    match value {
        FieldValue::Null => Some(None),
        FieldValue::Number(n) => Some(Some(n)),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_new_booking() -> NewBooking {
        NewBooking {
            user_id: Some("u-1".to_string()),
            bdm: Some("Ravi".to_string()),
            branch_name: Some("Pune".to_string()),
            contact_person: Some("Meera".to_string()),
            email: Some("meera@example.com".to_string()),
            contact_no: Some(9_876_543_210),
            services: vec!["gst".to_string(), "audit".to_string()],
            total_amount: Some(25_000.0),
            pan: Some("ABCDE1234F".to_string()),
            date: Some("2024-05-01".to_string()),
            state: Some("Maharashtra".to_string()),
            status: Some("Pending".to_string()),
            bank: Some("Cash".to_string()),
            ..NewBooking::default()
        }
    }

    pub(crate) fn sample_booking() -> Booking {
        let Ok(booking) = Booking::create(sample_new_booking(), BookingId::new(), Utc::now()) else {
            panic!("sample booking should be valid");
        };
        booking
    }

    #[test]
    fn create_applies_defaults() {
        let booking = sample_booking();
        assert_eq!(booking.version, 1);
        assert_eq!(booking.gst.as_deref(), Some("N/A"));
        assert_eq!(booking.company_name.as_deref(), Some(""));
        assert!(booking.change_history.is_empty());
        assert_eq!(booking.lifecycle_state(), BookingState::Active);
    }

    #[test]
    fn create_reports_all_missing_fields() {
        let new = NewBooking {
            user_id: Some("u-1".to_string()),
            bdm: Some("  ".to_string()),
            ..NewBooking::default()
        };
        let Err(AppError::MissingFields(missing)) = Booking::create(new, BookingId::new(), Utc::now())
        else {
            panic!("expected missing fields");
        };
        assert_eq!(
            missing,
            vec![
                "branch_name",
                "contact_person",
                "bdm",
                "email",
                "services",
                "total_amount",
                "pan",
                "state",
                "date"
            ]
        );
    }

    #[test]
    fn create_rejects_unparseable_date() {
        let new = NewBooking {
            date: Some("first of may".to_string()),
            ..sample_new_booking()
        };
        let result = Booking::create(new, BookingId::new(), Utc::now());
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn create_rejects_non_finite_amounts() {
        for new in [
            NewBooking {
                total_amount: Some(f64::NAN),
                ..sample_new_booking()
            },
            NewBooking {
                term_2: Some(f64::INFINITY),
                ..sample_new_booking()
            },
        ] {
            let result = Booking::create(new, BookingId::new(), Utc::now());
            assert!(matches!(result, Err(AppError::InvalidRequest(_))));
        }
    }

    #[test]
    fn create_drops_blank_service_names() {
        let new = NewBooking {
            services: vec![" ".to_string(), "gst".to_string(), String::new()],
            ..sample_new_booking()
        };
        let Ok(booking) = Booking::create(new, BookingId::new(), Utc::now()) else {
            panic!("booking should be valid");
        };
        assert_eq!(booking.services, vec!["gst".to_string()]);
    }

    #[test]
    fn numbers_may_arrive_as_strings() {
        let body = serde_json::json!({
            "total_amount": "25000",
            "term_1": 1000,
            "term_2": "",
            "contact_no": "9876543210",
        });
        let Ok(new) = serde_json::from_value::<NewBooking>(body) else {
            panic!("numeric strings should deserialize");
        };
        assert_eq!(new.total_amount, Some(25_000.0));
        assert_eq!(new.term_1, Some(1_000.0));
        assert_eq!(new.term_2, None);
        assert_eq!(new.term_3, None);
        assert_eq!(new.contact_no, Some(9_876_543_210));

        let bad = serde_json::json!({ "total_amount": "lots" });
        assert!(serde_json::from_value::<NewBooking>(bad).is_err());
    }

    #[test]
    fn nan_string_is_parsed_then_refused_by_create() {
        let Ok(parsed) =
            serde_json::from_value::<NewBooking>(serde_json::json!({ "total_amount": "NaN" }))
        else {
            panic!("NaN parses as a float");
        };
        let new = NewBooking {
            total_amount: parsed.total_amount,
            ..sample_new_booking()
        };
        let result = Booking::create(new, BookingId::new(), Utc::now());
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn get_then_set_is_identity_for_every_field() {
        let mut booking = sample_booking();
        let before = booking.clone();
        for field in BookingField::ALL {
            let value = booking.get(field);
            assert!(booking.set(field, value).is_ok(), "{field}");
        }
        assert_eq!(booking, before);
    }

    #[test]
    fn set_rejects_wrong_kind() {
        let mut booking = sample_booking();
        assert!(booking.set(BookingField::Email, FieldValue::Null).is_err());
        assert!(booking
            .set(BookingField::Services, FieldValue::TextList(Vec::new()))
            .is_err());
        assert!(booking
            .set(BookingField::TotalAmount, FieldValue::Text("10".to_string()))
            .is_err());
    }

    #[test]
    fn trash_sets_flags_and_restore_clears_them() {
        let mut booking = sample_booking();
        let now = Utc::now();
        assert!(booking.move_to_trash(Some("dev-1"), now).is_ok());
        assert!(booking.is_deleted);
        assert_eq!(booking.deleted_at, Some(now));
        assert_eq!(booking.deleted_by.as_deref(), Some("dev-1"));

        assert!(booking.restore(now).is_ok());
        assert!(!booking.is_deleted);
        assert_eq!(booking.deleted_at, None);
        assert_eq!(booking.deleted_by, None);
    }

    #[test]
    fn trash_twice_and_restore_active_are_state_errors() {
        let mut booking = sample_booking();
        assert!(matches!(booking.restore(Utc::now()), Err(AppError::InvalidState(_))));
        assert!(booking.ensure_destroyable().is_err());
        assert!(booking.move_to_trash(None, Utc::now()).is_ok());
        assert_eq!(booking.deleted_by.as_deref(), Some(UNKNOWN_ACTOR));
        assert!(booking.ensure_destroyable().is_ok());
        assert!(matches!(
            booking.move_to_trash(None, Utc::now()),
            Err(AppError::InvalidState(_))
        ));
    }
}
