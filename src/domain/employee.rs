//! Employee HR profiles and their audited edits.
//!
//! A profile is keyed by the user it belongs to and carries a generated
//! employee code (`SL250001`: department code, two-digit year, sequence).
//! HR edits are diffed key by key against the stored details; each accepted
//! edit appends one [`ProfileChange`].

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::contact;
use super::field_value::parse_timestamp;
use crate::error::AppError;

/// Departments and the code each contributes to an employee code.
pub const DEPARTMENTS: [(&str, &str); 5] = [
    ("Sales", "SL"),
    ("Digital", "DG"),
    ("Admin", "AD"),
    ("Legal", "LG"),
    ("Finance", "FN"),
];

/// Branches an employee can be posted to.
pub const BRANCHES: [&str; 8] = [
    "1206", "808", "1512", "Admin", "Digital", "407 AMD", "408 AMD", "906",
];

/// Accepted `gender` values.
pub const GENDERS: [&str; 3] = ["Male", "Female", "Other"];

/// Accepted `marital_status` values.
pub const MARITAL_STATUSES: [&str; 4] = ["Single", "Married", "Divorced", "Widowed"];

/// Accepted `emergency_contact_relationship` values.
pub const RELATIONSHIPS: [&str; 7] = [
    "Father", "Mother", "Spouse", "Brother", "Sister", "Friend", "Other",
];

/// Every key of [`ProfileDetails`].
pub const DETAIL_FIELDS: [&str; 28] = [
    "full_name",
    "designation",
    "department",
    "branch",
    "gender",
    "marital_status",
    "date_of_birth",
    "personal_contact_number",
    "personal_email",
    "work_email",
    "work_phone_number",
    "permanent_address",
    "current_address",
    "emergency_contact_name",
    "emergency_contact_number",
    "emergency_contact_relationship",
    "date_of_joining",
    "reporting_manager",
    "offered_salary",
    "date_of_last_promotion",
    "education_qualification",
    "previous_employer",
    "total_work_experience",
    "account_number",
    "bank_name",
    "ifsc_code",
    "pan_number",
    "aadhar_number",
];

const OPTIONAL_FIELDS: [&str; 2] = ["date_of_last_promotion", "previous_employer"];

/// Set at creation only; HR edits may not touch it.
const FIXED_FIELDS: [&str; 1] = ["offered_salary"];

/// Review state of a profile.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    /// Not yet submitted in full.
    Incomplete,
    /// Waiting for HR.
    #[default]
    PendingReview,
    /// Approved by HR.
    Approved,
    /// Sent back by HR.
    Rejected,
}

impl ProfileStatus {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Incomplete => "incomplete",
            Self::PendingReview => "pending_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a wire name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidRequest`] for anything else.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        [
            Self::Incomplete,
            Self::PendingReview,
            Self::Approved,
            Self::Rejected,
        ]
        .into_iter()
        .find(|s| s.as_str() == raw.trim())
        .ok_or_else(|| AppError::InvalidRequest(format!("unknown profile status '{raw}'")))
    }
}

fn calendar_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .map(|ts| ts.date_naive())
        .ok_or_else(|| de::Error::custom(format!("invalid date '{raw}'")))
}

fn optional_calendar_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(|ts| Some(ts.date_naive()))
            .ok_or_else(|| de::Error::custom(format!("invalid date '{raw}'"))),
    }
}

/// Personal, job, and bank details of an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProfileDetails {
    /// Full legal name.
    pub full_name: String,
    /// Job title.
    pub designation: String,
    /// One of [`DEPARTMENTS`].
    pub department: String,
    /// One of [`BRANCHES`].
    pub branch: String,
    /// One of [`GENDERS`].
    pub gender: String,
    /// One of [`MARITAL_STATUSES`].
    pub marital_status: String,
    /// Date of birth (`YYYY-MM-DD`).
    #[serde(deserialize_with = "calendar_date")]
    pub date_of_birth: NaiveDate,
    /// Ten-digit personal phone.
    pub personal_contact_number: String,
    /// Personal email, lowercased.
    pub personal_email: String,
    /// Work email, lowercased.
    pub work_email: String,
    /// Ten-digit work phone.
    pub work_phone_number: String,
    /// Permanent address.
    pub permanent_address: String,
    /// Current address.
    pub current_address: String,
    /// Emergency contact name.
    pub emergency_contact_name: String,
    /// Ten-digit emergency contact phone.
    pub emergency_contact_number: String,
    /// One of [`RELATIONSHIPS`].
    pub emergency_contact_relationship: String,
    /// Joining date (`YYYY-MM-DD`).
    #[serde(deserialize_with = "calendar_date")]
    pub date_of_joining: NaiveDate,
    /// Reporting manager.
    pub reporting_manager: String,
    /// Salary offered at joining.
    pub offered_salary: String,
    /// Last promotion, if any.
    #[serde(default, deserialize_with = "optional_calendar_date")]
    pub date_of_last_promotion: Option<NaiveDate>,
    /// Highest qualification.
    pub education_qualification: String,
    /// Previous employer, if any.
    #[serde(default)]
    pub previous_employer: Option<String>,
    /// Experience before joining, free text.
    pub total_work_experience: String,
    /// Salary account number.
    pub account_number: String,
    /// Salary bank.
    pub bank_name: String,
    /// Bank IFSC.
    pub ifsc_code: String,
    /// PAN, uppercased.
    pub pan_number: String,
    /// Twelve-digit Aadhaar number.
    pub aadhar_number: String,
}

fn one_of(value: &str, allowed: &[&str], field: &str) -> Result<(), AppError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(AppError::InvalidRequest(format!(
            "{field} must be one of: {}",
            allowed.join(", ")
        )))
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn reject_unknown_keys(body: &Map<String, Value>) -> Result<(), AppError> {
    match body.keys().find(|k| !DETAIL_FIELDS.contains(&k.as_str())) {
        Some(key) => Err(AppError::InvalidRequest(format!(
            "unknown profile field '{key}'"
        ))),
        None => Ok(()),
    }
}

impl ProfileDetails {
    /// Reads a full submission.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MissingFields`] for absent or blank required
    /// keys and [`AppError::InvalidRequest`] for unknown keys, bad types,
    /// values outside the allowed lists, or malformed contact numbers.
    pub fn from_json(body: Map<String, Value>) -> Result<Self, AppError> {
        reject_unknown_keys(&body)?;
        let missing: Vec<String> = DETAIL_FIELDS
            .iter()
            .copied()
            .filter(|f| !OPTIONAL_FIELDS.contains(f))
            .filter(|f| body.get(*f).is_none_or(is_blank))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(AppError::MissingFields(missing));
        }
        Self::from_map(body)
    }

    fn from_map(body: Map<String, Value>) -> Result<Self, AppError> {
        let details: Self = serde_json::from_value(Value::Object(body))
            .map_err(|e| AppError::InvalidRequest(format!("invalid profile: {e}")))?;
        details.normalized()
    }

    fn to_map(&self) -> Result<Map<String, Value>, AppError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(AppError::Internal("profile details are not an object".to_string())),
            Err(e) => Err(AppError::Internal(format!("serialize profile: {e}"))),
        }
    }

    /// Checks the enumerated fields and puts contact numbers in canonical
    /// form.
    fn normalized(mut self) -> Result<Self, AppError> {
        let departments: Vec<&str> = DEPARTMENTS.iter().map(|(name, _)| *name).collect();
        one_of(&self.department, &departments, "department")?;
        one_of(&self.branch, &BRANCHES, "branch")?;
        one_of(&self.gender, &GENDERS, "gender")?;
        one_of(&self.marital_status, &MARITAL_STATUSES, "marital_status")?;
        one_of(
            &self.emergency_contact_relationship,
            &RELATIONSHIPS,
            "emergency_contact_relationship",
        )?;
        self.personal_email = contact::email(&self.personal_email, "personal_email")?;
        self.work_email = contact::email(&self.work_email, "work_email")?;
        self.personal_contact_number =
            contact::phone(&self.personal_contact_number, "personal_contact_number")?;
        self.work_phone_number = contact::phone(&self.work_phone_number, "work_phone_number")?;
        self.emergency_contact_number =
            contact::phone(&self.emergency_contact_number, "emergency_contact_number")?;
        self.pan_number = contact::pan(&self.pan_number)?;
        self.aadhar_number = contact::aadhaar(&self.aadhar_number)?;
        self.previous_employer = self
            .previous_employer
            .filter(|s| !s.trim().is_empty());
        Ok(self)
    }

    /// Two-letter code of the department, or `EMP` if it has none.
    #[must_use]
    pub fn department_code(&self) -> &'static str {
        DEPARTMENTS
            .iter()
            .find(|(name, _)| *name == self.department)
            .map_or("EMP", |(_, code)| *code)
    }
}

/// Old and new value of one profile key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValueChange {
    /// Value before the edit.
    #[schema(value_type = Object)]
    pub old: Value,
    /// Value after the edit.
    #[schema(value_type = Object)]
    pub new: Value,
}

/// One audited edit of a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProfileChange {
    /// Who made the edit.
    pub updated_by: String,
    /// When.
    pub updated_at: DateTime<Utc>,
    /// Why, as given by HR or a default.
    pub reason: String,
    /// Changed keys only.
    pub changes: BTreeMap<String, ValueChange>,
}

/// A stored employee profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EmployeeProfile {
    /// The user the profile belongs to; one profile per user.
    pub user_id: String,
    /// Generated employee code, unique.
    pub employee_code: String,
    /// Optimistic-concurrency version.
    pub version: u64,
    /// Personal, job, and bank details.
    #[serde(flatten)]
    pub details: ProfileDetails,
    /// `false` once HR deactivates the profile.
    pub is_active: bool,
    /// Review state.
    pub status: ProfileStatus,
    /// Who submitted the profile.
    pub created_by: String,
    /// Who last changed it.
    pub updated_by: Option<String>,
    /// Who approved it.
    pub approved_by: Option<String>,
    /// When it was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// Audited edits, oldest first.
    pub update_history: Vec<ProfileChange>,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl EmployeeProfile {
    /// A new pending profile. The store assigns `employee_code`.
    #[must_use]
    pub fn create(owner: &str, details: ProfileDetails, now: DateTime<Utc>) -> Self {
        Self {
            user_id: owner.to_string(),
            employee_code: String::new(),
            version: 1,
            details,
            is_active: true,
            status: ProfileStatus::PendingReview,
            created_by: owner.to_string(),
            updated_by: None,
            approved_by: None,
            approved_at: None,
            update_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Prefix of this profile's employee code: department code plus the
    /// two-digit year of `now`.
    #[must_use]
    pub fn code_prefix(&self, now: DateTime<Utc>) -> String {
        format!("{}{:02}", self.details.department_code(), now.year() % 100)
    }

    fn record(
        &mut self,
        actor: &str,
        reason: String,
        changes: BTreeMap<String, ValueChange>,
        now: DateTime<Utc>,
    ) {
        self.update_history.push(ProfileChange {
            updated_by: actor.to_string(),
            updated_at: now,
            reason,
            changes,
        });
        self.updated_by = Some(actor.to_string());
        self.updated_at = now;
    }

    /// Applies an HR edit and returns how many keys changed.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidRequest`] for unknown or fixed keys and for
    ///   values that fail validation.
    /// - [`AppError::NoChangesDetected`] if every key already holds the
    ///   submitted value.
    pub fn update(
        &mut self,
        fields: Map<String, Value>,
        reason: Option<String>,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<usize, AppError> {
        reject_unknown_keys(&fields)?;
        if let Some(key) = fields.keys().find(|k| FIXED_FIELDS.contains(&k.as_str())) {
            return Err(AppError::InvalidRequest(format!("{key} cannot be edited")));
        }
        let before = self.details.to_map()?;
        let mut merged = before.clone();
        merged.extend(fields);
        let candidate = ProfileDetails::from_map(merged)?;
        let after = candidate.to_map()?;

        let changes: BTreeMap<String, ValueChange> = after
            .into_iter()
            .filter_map(|(key, new)| {
                let old = before.get(&key).cloned().unwrap_or(Value::Null);
                (old != new).then(|| (key, ValueChange { old, new }))
            })
            .collect();
        if changes.is_empty() {
            return Err(AppError::NoChangesDetected);
        }
        let count = changes.len();
        self.details = candidate;
        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "Profile update".to_string());
        self.record(actor, reason, changes, now);
        Ok(count)
    }

    /// Soft-deletes the profile.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidState`] if it is already inactive.
    pub fn deactivate(
        &mut self,
        reason: Option<String>,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if !self.is_active {
            return Err(AppError::InvalidState(format!(
                "profile of {} is already inactive",
                self.user_id
            )));
        }
        self.is_active = false;
        let changes = BTreeMap::from([(
            "is_active".to_string(),
            ValueChange {
                old: Value::Bool(true),
                new: Value::Bool(false),
            },
        )]);
        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "Profile deactivated".to_string());
        self.record(actor, reason, changes, now);
        Ok(())
    }

    /// Marks the profile approved by `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidState`] if it is already approved.
    pub fn approve(&mut self, actor: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        if self.status == ProfileStatus::Approved {
            return Err(AppError::InvalidState(format!(
                "profile of {} is already approved",
                self.user_id
            )));
        }
        let changes = BTreeMap::from([(
            "status".to_string(),
            ValueChange {
                old: Value::String(self.status.as_str().to_string()),
                new: Value::String(ProfileStatus::Approved.as_str().to_string()),
            },
        )]);
        self.status = ProfileStatus::Approved;
        self.approved_by = Some(actor.to_string());
        self.approved_at = Some(now);
        self.record(actor, "Profile approved by HR".to_string(), changes, now);
        Ok(())
    }
}

/// The code following the highest sequence among `existing` codes that
/// share `prefix`, or the first code for that prefix.
#[must_use]
pub fn next_employee_code<'a>(prefix: &str, existing: impl IntoIterator<Item = &'a str>) -> String {
    let sequence = existing
        .into_iter()
        .filter_map(|code| code.strip_prefix(prefix)?.parse::<u32>().ok())
        .max()
        .map_or(1, |n| n.saturating_add(1));
    format!("{prefix}{sequence:04}")
}
