//! Employee profile queries, edit bodies, and the export formats.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};

use super::PaginationMeta;
use crate::domain::{EmployeeProfile, Page, ProfileFilter, ProfileStatus};
use crate::error::AppError;

/// Default page size for the profile list.
const DEFAULT_PROFILE_PAGE: u32 = 50;

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Query parameters for `GET /api/v1/employees`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProfileListParams {
    /// Page number (1-indexed). Defaults to 1.
    pub page: Option<u32>,
    /// Items per page (max 100). Defaults to 50.
    pub limit: Option<u32>,
    /// Exact department.
    pub department: Option<String>,
    /// Exact branch.
    pub branch: Option<String>,
    /// `incomplete`, `pending_review`, `approved`, or `rejected`.
    pub status: Option<String>,
    /// Substring of the name, employee code, or an email.
    pub search: Option<String>,
}

impl ProfileListParams {
    /// Validates the parameters into a filter and page.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidRequest`] for an unknown status.
    pub fn into_query(self) -> Result<(ProfileFilter, Page), AppError> {
        let status = non_blank(self.status)
            .map(|s| ProfileStatus::parse(&s))
            .transpose()?;
        let filter = ProfileFilter {
            department: non_blank(self.department),
            branch: non_blank(self.branch),
            status,
            search: non_blank(self.search),
        };
        let page = Page::new(
            self.page.unwrap_or(1),
            self.limit.unwrap_or(DEFAULT_PROFILE_PAGE),
        );
        Ok((filter, page))
    }
}

/// Response for `GET /api/v1/employees`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileListResponse {
    /// Profiles on this page, newest first.
    pub data: Vec<EmployeeProfile>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Body of `PATCH /api/v1/employees/{user_id}`: profile keys to change,
/// plus an optional reason and version guard.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProfileUpdateRequest {
    /// Why the profile is edited; recorded in its history.
    #[serde(default, alias = "update_reason")]
    pub reason: Option<String>,
    /// Version the caller last read.
    #[serde(default)]
    pub expected_version: Option<u64>,
    /// Profile keys and their new values.
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub fields: Map<String, Value>,
}

/// Optional body of `DELETE /api/v1/employees/{user_id}`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DeactivateRequest {
    /// Why the profile is deactivated.
    pub reason: Option<String>,
}

/// Output format of the profile export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Spreadsheet-friendly text.
    #[default]
    Csv,
    /// The profiles as JSON.
    Json,
}

/// Query parameters for `GET /api/v1/employees/export`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportParams {
    /// `csv` (default) or `json`.
    pub format: Option<ExportFormat>,
    /// Exact department.
    pub department: Option<String>,
    /// Exact branch.
    pub branch: Option<String>,
}

impl ExportParams {
    /// Splits the parameters into a format and filter.
    #[must_use]
    pub fn into_query(self) -> (ExportFormat, ProfileFilter) {
        let filter = ProfileFilter {
            department: non_blank(self.department),
            branch: non_blank(self.branch),
            ..ProfileFilter::default()
        };
        (self.format.unwrap_or_default(), filter)
    }
}

/// JSON export body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExportResponse {
    /// Exported profiles, ordered by employee code.
    pub employees: Vec<EmployeeProfile>,
    /// Number of profiles.
    pub count: usize,
}

/// Column headers of the CSV export.
const CSV_HEADERS: [&str; 11] = [
    "Employee ID",
    "Full Name",
    "Designation",
    "Department",
    "Branch",
    "Personal Email",
    "Work Email",
    "Personal Phone",
    "Work Phone",
    "Date of Joining",
    "Reporting Manager",
];

fn csv_error(e: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("csv export: {e}"))
}

/// Renders profiles as CSV, one row per profile.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the writer fails.
pub fn to_csv(profiles: &[EmployeeProfile]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADERS).map_err(csv_error)?;
    for profile in profiles {
        let d = &profile.details;
        let joined = d.date_of_joining.to_string();
        writer
            .write_record([
                profile.employee_code.as_str(),
                d.full_name.as_str(),
                d.designation.as_str(),
                d.department.as_str(),
                d.branch.as_str(),
                d.personal_email.as_str(),
                d.work_email.as_str(),
                d.personal_contact_number.as_str(),
                d.work_phone_number.as_str(),
                joined.as_str(),
                d.reporting_manager.as_str(),
            ])
            .map_err(csv_error)?;
    }
    let bytes = writer.into_inner().map_err(csv_error)?;
    String::from_utf8(bytes).map_err(csv_error)
}
