//! Booking handlers: create, list, get, update, trash, restore, delete.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{BookingFilterParams, BookingListResponse, PaginationMeta};
use crate::app_state::AppState;
use crate::domain::{Actor, Booking, BookingId, BookingUpdate, NewBooking};
use crate::error::{AppError, ErrorResponse};

/// `POST /bookings` — Submit a new booking.
///
/// # Errors
///
/// Returns [`AppError::MissingFields`] listing every absent required field.
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    summary = "Create a booking",
    description = "Validates the submission, fills defaults for `company_name` and `gst`, and stores the booking with an empty change history.",
    request_body = NewBooking,
    responses(
        (status = 201, description = "Booking created", body = Booking),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 401, description = "Missing identity headers", body = ErrorResponse),
        (status = 403, description = "Booking owned by another user", body = ErrorResponse),
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    actor: Actor,
    body: Result<Json<NewBooking>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(new) = body?;
    let booking = state.booking_service.create_booking(&actor, new).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// `GET /bookings` — Filtered, paginated list of active bookings.
///
/// # Errors
///
/// Returns [`AppError::InvalidRequest`] for malformed filters.
#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    tag = "Bookings",
    summary = "List bookings",
    description = "Returns active bookings newest first. Members only ever see their own bookings.",
    params(BookingFilterParams),
    responses(
        (status = 200, description = "Paginated booking list", body = BookingListResponse),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
    )
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<BookingFilterParams>,
) -> Result<impl IntoResponse, AppError> {
    let (filter, page) = params.into_query(state.default_page_size)?;
    let result = state
        .booking_service
        .list_bookings(&actor, filter, page)
        .await?;
    let pagination = PaginationMeta::new(page, &result);
    Ok(Json(BookingListResponse {
        data: result.items,
        pagination,
    }))
}

/// `GET /bookings/trash` — List trashed bookings.
///
/// # Errors
///
/// Returns [`AppError::PermissionDenied`] below full access.
#[utoipa::path(
    get,
    path = "/api/v1/bookings/trash",
    tag = "Bookings",
    summary = "List trash",
    description = "Returns every trashed booking, most recently trashed first.",
    responses(
        (status = 200, description = "Trashed bookings", body = Vec<Booking>),
        (status = 403, description = "Role may not view trash", body = ErrorResponse),
    )
)]
pub async fn list_trash(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<impl IntoResponse, AppError> {
    let trashed = state.booking_service.list_trash(&actor).await?;
    Ok(Json(trashed))
}

/// `GET /bookings/:id` — Get one booking with its change history.
///
/// # Errors
///
/// Returns [`AppError::BookingNotFound`] if the booking does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    summary = "Get booking",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
    ),
    responses(
        (status = 200, description = "Booking details", body = Booking),
        (status = 404, description = "Booking not found", body = ErrorResponse),
    )
)]
pub async fn get_booking(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state
        .booking_service
        .get_booking(&actor, BookingId::from_uuid(id))
        .await?;
    Ok(Json(booking))
}

/// `PATCH /bookings/:id` — Apply a partial update.
///
/// The body is a flat object of field names to new values, optionally with
/// `updated_by`, `note` and `expected_version`.
///
/// # Errors
///
/// Returns [`AppError::NoChangesDetected`] when nothing differs, and
/// [`AppError::VersionConflict`] when a concurrent write won.
#[utoipa::path(
    patch,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    summary = "Update booking",
    description = "Diffs the submitted fields against the stored booking, applies the differences, and appends one change-history entry. Fields outside the caller's role are dropped.",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
    ),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Updated booking", body = Booking),
        (status = 400, description = "Invalid update or no changes", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
        (status = 409, description = "Trashed booking or concurrent modification", body = ErrorResponse),
    )
)]
pub async fn update_booking(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let update = BookingUpdate::from_json(body)?;
    let booking = state
        .booking_service
        .update_booking(&actor, BookingId::from_uuid(id), update)
        .await?;
    Ok(Json(booking))
}

/// `POST /bookings/:id/trash` — Move a booking to the trash.
///
/// # Errors
///
/// Returns [`AppError::InvalidState`] if the booking is already trashed.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/trash",
    tag = "Bookings",
    summary = "Move booking to trash",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
    ),
    responses(
        (status = 200, description = "Trashed booking", body = Booking),
        (status = 403, description = "Role may not trash bookings", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
        (status = 409, description = "Already in trash", body = ErrorResponse),
    )
)]
pub async fn trash_booking(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state
        .booking_service
        .trash_booking(&actor, BookingId::from_uuid(id))
        .await?;
    Ok(Json(booking))
}

/// `POST /bookings/:id/restore` — Restore a trashed booking.
///
/// # Errors
///
/// Returns [`AppError::InvalidState`] if the booking is not trashed.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/restore",
    tag = "Bookings",
    summary = "Restore booking",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
    ),
    responses(
        (status = 200, description = "Restored booking", body = Booking),
        (status = 403, description = "Role may not restore", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
        (status = 409, description = "Not in trash", body = ErrorResponse),
    )
)]
pub async fn restore_booking(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state
        .booking_service
        .restore_booking(&actor, BookingId::from_uuid(id))
        .await?;
    Ok(Json(booking))
}

/// `DELETE /bookings/:id` — Permanently delete a trashed booking.
///
/// # Errors
///
/// Returns [`AppError::InvalidState`] unless the booking is in the trash.
#[utoipa::path(
    delete,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    summary = "Delete booking permanently",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
    ),
    responses(
        (status = 204, description = "Booking deleted"),
        (status = 403, description = "Role may not delete", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
        (status = 409, description = "Booking not in trash", body = ErrorResponse),
    )
)]
pub async fn delete_booking(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .booking_service
        .delete_booking(&actor, BookingId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Booking routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking).get(list_bookings))
        .route("/bookings/trash", get(list_trash))
        .route(
            "/bookings/{id}",
            get(get_booking).patch(update_booking).delete(delete_booking),
        )
        .route("/bookings/{id}/trash", post(trash_booking))
        .route("/bookings/{id}/restore", post(restore_booking))
}
