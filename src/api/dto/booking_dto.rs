//! Booking list query and response envelopes.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::PaginationMeta;
use crate::domain::{Booking, BookingFilter, DateRange, Page};
use crate::error::AppError;

/// Query parameters for `GET /api/v1/bookings`.
///
/// Dates accept `YYYY-MM-DD` or RFC 3339. A range needs both ends; the
/// booking-date range is ignored when a payment-date range is given.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingFilterParams {
    /// Page number (1-indexed). Defaults to 1.
    pub page: Option<u32>,
    /// Items per page (max 100).
    pub per_page: Option<u32>,
    /// First booking date included.
    pub start_date: Option<String>,
    /// Last booking date included (whole day).
    pub end_date: Option<String>,
    /// First payment date included.
    pub payment_start_date: Option<String>,
    /// Last payment date included (whole day).
    pub payment_end_date: Option<String>,
    /// One of `Pending`, `In Progress`, `Completed`.
    pub status: Option<String>,
    /// Service value the booking must include.
    pub service: Option<String>,
    /// Exact payment mode (bank or gateway name).
    pub payment_mode: Option<String>,
    /// Case-insensitive substring of the BDM name.
    pub bdm_name: Option<String>,
    /// Owning user. Ignored for restricted roles, which always see their own.
    pub user_id: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn range(
    start: Option<&String>,
    end: Option<&String>,
    label: &str,
) -> Result<Option<DateRange>, AppError> {
    match (non_blank(start), non_blank(end)) {
        (Some(start), Some(end)) => DateRange::whole_days(start, end, label).map(Some),
        (None, None) => Ok(None),
        _ => Err(AppError::InvalidRequest(format!(
            "{label} range needs both a start and an end date"
        ))),
    }
}

impl BookingFilterParams {
    /// Validates the parameters into a filter and page.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidRequest`] for an unparsable date, a
    /// half-open range, an unknown status, or an unknown payment mode.
    pub fn into_query(self, default_page_size: u32) -> Result<(BookingFilter, Page), AppError> {
        let payment_date = range(
            self.payment_start_date.as_ref(),
            self.payment_end_date.as_ref(),
            "payment",
        )?;
        let booking_date = if payment_date.is_some() {
            None
        } else {
            range(self.start_date.as_ref(), self.end_date.as_ref(), "booking")?
        };
        let status = non_blank(self.status.as_ref())
            .map(BookingFilter::validate_status)
            .transpose()?;
        let payment_mode = non_blank(self.payment_mode.as_ref())
            .map(BookingFilter::validate_payment_mode)
            .transpose()?;

        let filter = BookingFilter {
            booking_date,
            payment_date,
            status,
            service: non_blank(self.service.as_ref()).map(str::to_string),
            payment_mode,
            bdm_name: non_blank(self.bdm_name.as_ref()).map(str::to_string),
            owner: non_blank(self.user_id.as_ref()).map(str::to_string),
        };
        let page = Page::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(default_page_size),
        );
        Ok((filter, page))
    }
}

/// Response for `GET /api/v1/bookings`.
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingListResponse {
    /// Bookings on this page, newest first.
    pub data: Vec<Booking>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
