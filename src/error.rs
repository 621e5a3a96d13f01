//! Application error types with HTTP status code mapping.
//!
//! [`AppError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{BookingId, UserId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1003,
///     "message": "no changes detected",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see [`AppError`] for ranges).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request              |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server          | 500 Internal Server Error    |
/// | 4000–4999 | Access          | 401 Unauthorized / 403 Forbidden |
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// One or more required fields were absent on creation.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// The submitted update matched the stored record exactly.
    #[error("no changes detected")]
    NoChangesDetected,

    /// Booking with the given ID was not found.
    #[error("booking not found: {0}")]
    BookingNotFound(BookingId),

    /// Catalog entry with the given ID was not found.
    #[error("catalog entry not found: {0}")]
    CatalogEntryNotFound(uuid::Uuid),

    /// User account with the given ID was not found.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// No active employee profile exists for the given user.
    #[error("employee profile not found for user {0}")]
    ProfileNotFound(String),

    /// The record is not in a state that allows the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The record was modified after it was read.
    #[error("{id} was modified concurrently (expected version {expected}, found {actual})")]
    VersionConflict {
        /// Record that failed the version check, e.g. `booking <uuid>`.
        id: String,
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// A catalog entry with the same `value` already exists.
    #[error("catalog value already exists: {0}")]
    DuplicateCatalogValue(String),

    /// A unique attribute (email, profile owner) is already taken.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// No usable actor identity was supplied with the request.
    #[error("authentication required: {0}")]
    Unauthenticated(String),

    /// The actor's role does not permit the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::MissingFields(_) => 1002,
            Self::NoChangesDetected => 1003,
            Self::BookingNotFound(_) => 2001,
            Self::CatalogEntryNotFound(_) => 2002,
            Self::UserNotFound(_) => 2003,
            Self::ProfileNotFound(_) => 2004,
            Self::InvalidState(_) => 2101,
            Self::VersionConflict { .. } => 2102,
            Self::DuplicateCatalogValue(_) => 2103,
            Self::AlreadyExists(_) => 2104,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::Unauthenticated(_) => 4001,
            Self::PermissionDenied(_) => 4003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::MissingFields(_) | Self::NoChangesDetected => {
                StatusCode::BAD_REQUEST
            }
            Self::BookingNotFound(_)
            | Self::CatalogEntryNotFound(_)
            | Self::UserNotFound(_)
            | Self::ProfileNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidState(_)
            | Self::VersionConflict { .. }
            | Self::DuplicateCatalogValue(_)
            | Self::AlreadyExists(_) => StatusCode::CONFLICT,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::MissingFields(fields) => Some(fields.join(",")),
            Self::VersionConflict { actual, .. } => Some(format!("current_version={actual}")),
            _ => None,
        }
    }
}

/// Malformed or mistyped JSON bodies get the same envelope as every other
/// validation failure.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
