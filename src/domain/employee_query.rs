//! Filtering and headcount statistics over employee profiles.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use super::{EmployeeProfile, ProfileStatus};

/// Criteria for listing or exporting profiles. Inactive profiles never
/// match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileFilter {
    /// Exact department.
    pub department: Option<String>,
    /// Exact branch.
    pub branch: Option<String>,
    /// Review state.
    pub status: Option<ProfileStatus>,
    /// Case-insensitive substring of the name, employee code, or either
    /// email.
    pub search: Option<String>,
}

impl ProfileFilter {
    /// Evaluates the filter in memory.
    #[must_use]
    pub fn matches(&self, profile: &EmployeeProfile) -> bool {
        let d = &profile.details;
        profile.is_active
            && self.department.as_ref().is_none_or(|dep| d.department == *dep)
            && self.branch.as_ref().is_none_or(|b| d.branch == *b)
            && self.status.is_none_or(|s| profile.status == s)
            && self.search.as_ref().is_none_or(|needle| {
                let needle = needle.to_lowercase();
                [
                    d.full_name.as_str(),
                    profile.employee_code.as_str(),
                    d.personal_email.as_str(),
                    d.work_email.as_str(),
                ]
                .iter()
                .any(|hay| hay.to_lowercase().contains(&needle))
            })
    }
}

/// Number of profiles sharing one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct GroupCount {
    /// The shared value (department, branch, or status).
    pub key: String,
    /// Profiles with that value.
    pub count: u64,
}

/// A recent joiner, as listed in [`EmployeeStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Joinee {
    /// Employee code.
    pub employee_code: String,
    /// Full name.
    pub full_name: String,
    /// Department.
    pub department: String,
    /// Joining date.
    pub date_of_joining: NaiveDate,
}

/// Headcount over active profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EmployeeStats {
    /// Active profiles.
    pub total_employees: u64,
    /// Per department, largest first.
    pub by_department: Vec<GroupCount>,
    /// Per branch, largest first.
    pub by_branch: Vec<GroupCount>,
    /// Per review state.
    pub by_status: Vec<GroupCount>,
    /// The five latest joiners.
    pub recent_joinees: Vec<Joinee>,
}

/// Number of joiners listed in [`EmployeeStats::recent_joinees`].
const RECENT_JOINEES: usize = 5;

fn grouped<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<GroupCount> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    let mut groups: Vec<GroupCount> = counts
        .into_iter()
        .map(|(key, count)| GroupCount {
            key: key.to_string(),
            count,
        })
        .collect();
    // Largest first; the BTreeMap order breaks ties alphabetically.
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups
}

impl EmployeeStats {
    /// Computes the statistics over the active profiles in `profiles`.
    #[must_use]
    pub fn from_profiles(profiles: &[EmployeeProfile]) -> Self {
        let active: Vec<&EmployeeProfile> = profiles.iter().filter(|p| p.is_active).collect();
        let mut joinees: Vec<&EmployeeProfile> = active.clone();
        joinees.sort_by(|a, b| b.details.date_of_joining.cmp(&a.details.date_of_joining));
        Self {
            total_employees: active.len() as u64,
            by_department: grouped(active.iter().map(|p| p.details.department.as_str())),
            by_branch: grouped(active.iter().map(|p| p.details.branch.as_str())),
            by_status: grouped(active.iter().map(|p| p.status.as_str())),
            recent_joinees: joinees
                .into_iter()
                .take(RECENT_JOINEES)
                .map(|p| Joinee {
                    employee_code: p.employee_code.clone(),
                    full_name: p.details.full_name.clone(),
                    department: p.details.department.clone(),
                    date_of_joining: p.details.date_of_joining,
                })
                .collect(),
        }
    }
}
