//! Filter and pagination over active bookings.

use chrono::{DateTime, Duration, Utc};

use super::Booking;
use super::field_value::parse_timestamp;
use crate::error::AppError;

/// Status values accepted by the status filter.
pub const VALID_STATUSES: [&str; 3] = ["Pending", "In Progress", "Completed"];

/// Payment modes accepted by the payment-mode filter.
pub const PAYMENT_MODES: [&str; 8] = [
    "Kotak Mahindra Bank",
    "HDFC Bank",
    "Razorpay",
    "HDFC Gateway",
    "CashFree Gateway",
    "Phonepe Gateway",
    "Enego Projects",
    "Cash",
];

/// Inclusive time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// First instant included.
    pub start: DateTime<Utc>,
    /// Last instant included.
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Builds a range covering whole days: `end` is extended to the last
    /// millisecond of its day.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidRequest`] naming `label` if either bound
    /// does not parse.
    pub fn whole_days(start: &str, end: &str, label: &str) -> Result<Self, AppError> {
        let invalid = || AppError::InvalidRequest(format!("invalid {label} date format"));
        let start = parse_timestamp(start).ok_or_else(invalid)?;
        let end = parse_timestamp(end).ok_or_else(invalid)?;
        let end = end
            .date_naive()
            .and_hms_milli_opt(23, 59, 59, 999)
            .map(|dt| dt.and_utc())
            .unwrap_or(end + Duration::days(1));
        Ok(Self { start, end })
    }

    /// Returns `true` if `instant` lies inside the range.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Criteria for listing active bookings. Empty criteria match everything
/// that is not trashed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    /// Booking date range.
    pub booking_date: Option<DateRange>,
    /// Payment date range.
    pub payment_date: Option<DateRange>,
    /// Status, matched case-insensitively.
    pub status: Option<String>,
    /// Service that must be among the booking's services.
    pub service: Option<String>,
    /// Exact payment mode.
    pub payment_mode: Option<String>,
    /// Case-insensitive substring of the BDM name.
    pub bdm_name: Option<String>,
    /// Owning user.
    pub owner: Option<String>,
}

impl BookingFilter {
    /// Checks a status value against [`VALID_STATUSES`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidRequest`] for an unknown status.
    pub fn validate_status(status: &str) -> Result<String, AppError> {
        let status = status.trim();
        if VALID_STATUSES.contains(&status) {
            Ok(status.to_string())
        } else {
            Err(AppError::InvalidRequest(format!("invalid status value: {status}")))
        }
    }

    /// Checks a payment mode against [`PAYMENT_MODES`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidRequest`] for an unknown payment mode.
    pub fn validate_payment_mode(mode: &str) -> Result<String, AppError> {
        if PAYMENT_MODES.contains(&mode) {
            Ok(mode.to_string())
        } else {
            Err(AppError::InvalidRequest(format!("invalid payment mode: {mode}")))
        }
    }

    /// Evaluates the filter in memory. Trashed bookings never match.
    #[must_use]
    pub fn matches(&self, booking: &Booking) -> bool {
        if booking.is_deleted {
            return false;
        }
        if let Some(range) = &self.booking_date
            && !range.contains(booking.date)
        {
            return false;
        }
        if let Some(range) = &self.payment_date
            && !booking.payment_date.is_some_and(|d| range.contains(d))
        {
            return false;
        }
        if let Some(status) = &self.status
            && !booking
                .status
                .as_deref()
                .is_some_and(|s| s.trim().eq_ignore_ascii_case(status))
        {
            return false;
        }
        if let Some(service) = &self.service
            && !booking.services.iter().any(|s| s == service)
        {
            return false;
        }
        if let Some(mode) = &self.payment_mode
            && booking.bank.as_deref() != Some(mode.as_str())
        {
            return false;
        }
        if let Some(needle) = &self.bdm_name
            && !booking
                .bdm
                .to_lowercase()
                .contains(&needle.to_lowercase())
        {
            return false;
        }
        if let Some(owner) = &self.owner
            && booking.user_id != *owner
        {
            return false;
        }
        true
    }
}

/// Requested page (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Page number, at least 1.
    pub page: u32,
    /// Items per page, 1..=100.
    pub per_page: u32,
}

impl Page {
    /// Largest accepted page size.
    pub const MAX_PER_PAGE: u32 = 100;

    /// Builds a page, clamping both values into range.
    #[must_use]
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, Self::MAX_PER_PAGE),
        }
    }

    /// Number of items to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64).saturating_sub(1) * self.per_page as u64
    }
}

/// One page of results plus the total match count.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Matches across all pages.
    pub total: u64,
}

impl<T> PageResult<T> {
    /// Number of pages needed for `total` at `per_page`.
    #[must_use]
    pub fn total_pages(&self, page: Page) -> u64 {
        self.total.div_ceil(u64::from(page.per_page))
    }
}
