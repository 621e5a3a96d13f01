//! User account handlers, including session status and a user's bookings.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::api::dto::{BookingFilterParams, BookingListResponse, PaginationMeta, SessionRequest};
use crate::app_state::AppState;
use crate::domain::{Actor, NewUser, User, UserId, UserPatch};
use crate::error::{AppError, ErrorResponse};

/// `GET /users` — List accounts.
///
/// # Errors
///
/// Returns [`AppError::PermissionDenied`] unless the caller is `srdev`.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    summary = "List users",
    responses(
        (status = 200, description = "Accounts, oldest first", body = Vec<User>),
        (status = 403, description = "Caller is not srdev", body = ErrorResponse),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.user_service.list_users(&actor).await?))
}

/// `POST /users` — Add an account.
///
/// # Errors
///
/// Returns [`AppError::MissingFields`] or [`AppError::AlreadyExists`].
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    summary = "Add user",
    request_body = NewUser,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 403, description = "Caller is not srdev", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
    )
)]
pub async fn add_user(
    State(state): State<AppState>,
    actor: Actor,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(new) = body?;
    let user = state.user_service.add_user(&actor, new).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /users/:id` — Get one account.
///
/// # Errors
///
/// Returns [`AppError::UserNotFound`] if the account does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    summary = "Get user",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "Account", body = User),
        (status = 403, description = "Another user's account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .user_service
        .get_user(&actor, UserId::from_uuid(id))
        .await?;
    Ok(Json(user))
}

/// `PATCH /users/:id` — Edit name, email, or role.
///
/// # Errors
///
/// Returns [`AppError::UserNotFound`] or a validation error.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    tag = "Users",
    summary = "Edit user",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    request_body = UserPatch,
    responses(
        (status = 200, description = "Updated account", body = User),
        (status = 400, description = "Empty or invalid patch", body = ErrorResponse),
        (status = 403, description = "Caller is not srdev", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
    )
)]
pub async fn edit_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
    body: Result<Json<UserPatch>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(patch) = body?;
    let user = state
        .user_service
        .edit_user(&actor, UserId::from_uuid(id), patch)
        .await?;
    Ok(Json(user))
}

/// `DELETE /users/:id` — Remove an account.
///
/// # Errors
///
/// Returns [`AppError::UserNotFound`] if the account does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    summary = "Delete user",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 403, description = "Caller is not srdev", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .user_service
        .delete_user(&actor, UserId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /users/:id/session` — Record sign-in or sign-out.
///
/// # Errors
///
/// Returns [`AppError::PermissionDenied`] for another user's account.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/session",
    tag = "Users",
    summary = "Set session status",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    request_body = SessionRequest,
    responses(
        (status = 200, description = "Account with the new status", body = User),
        (status = 403, description = "Another user's account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn set_session(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
    body: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = body?;
    let user = state
        .user_service
        .set_session(&actor, UserId::from_uuid(id), request.active)
        .await?;
    Ok(Json(user))
}

/// `GET /users/:id/bookings` — Active bookings owned by one user.
///
/// # Errors
///
/// Returns [`AppError::PermissionDenied`] or [`AppError::UserNotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/bookings",
    tag = "Users",
    summary = "List a user's bookings",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
        BookingFilterParams,
    ),
    responses(
        (status = 200, description = "Paginated booking list", body = BookingListResponse),
        (status = 403, description = "Another user's bookings", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn list_user_bookings(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<BookingFilterParams>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .user_service
        .get_user(&actor, UserId::from_uuid(id))
        .await?;
    let (mut filter, page) = params.into_query(state.default_page_size)?;
    filter.owner = Some(user.id.to_string());
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

/// User routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(add_user))
        .route(
            "/users/{id}",
            get(get_user).patch(edit_user).delete(delete_user),
        )
        .route("/users/{id}/session", put(set_session))
        .route("/users/{id}/bookings", get(list_user_bookings))
}
