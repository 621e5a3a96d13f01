//! Employee profile handlers: submission, HR review, stats, and export.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Map, Value};

use crate::api::dto::{
    DeactivateRequest, ExportFormat, ExportParams, ExportResponse, PaginationMeta,
    ProfileListParams, ProfileListResponse, ProfileUpdateRequest, to_csv,
};
use crate::app_state::AppState;
use crate::domain::{Actor, EmployeeProfile, EmployeeStats};
use crate::error::{AppError, ErrorResponse};

/// `POST /employees` — Submit the caller's own profile.
///
/// # Errors
///
/// Returns [`AppError::MissingFields`] listing every absent detail.
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    tag = "Employees",
    summary = "Submit employee profile",
    description = "Validates the caller's details, assigns an employee code from the department and year, and stores the profile pending HR review.",
    request_body = serde_json::Value,
    responses(
        (status = 201, description = "Profile created", body = EmployeeProfile),
        (status = 400, description = "Missing or invalid details", body = ErrorResponse),
        (status = 409, description = "Profile or email already exists", body = ErrorResponse),
    )
)]
pub async fn create_profile(
    State(state): State<AppState>,
    actor: Actor,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let profile = state.employee_service.create_profile(&actor, body).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// `GET /employees` — Filtered, paginated list of active profiles.
///
/// # Errors
///
/// Returns [`AppError::PermissionDenied`] unless the caller is HR.
#[utoipa::path(
    get,
    path = "/api/v1/employees",
    tag = "Employees",
    summary = "List employee profiles",
    params(ProfileListParams),
    responses(
        (status = 200, description = "Paginated profile list", body = ProfileListResponse),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 403, description = "Caller is not HR", body = ErrorResponse),
    )
)]
pub async fn list_profiles(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<ProfileListParams>,
) -> Result<impl IntoResponse, AppError> {
    let (filter, page) = params.into_query()?;
    let result = state
        .employee_service
        .list_profiles(&actor, &filter, page)
        .await?;
    let pagination = PaginationMeta::new(page, &result);
    Ok(Json(ProfileListResponse {
        data: result.items,
        pagination,
    }))
}

/// `GET /employees/stats` — Headcount by department, branch, and status.
///
/// # Errors
///
/// Returns [`AppError::PermissionDenied`] unless the caller is HR.
#[utoipa::path(
    get,
    path = "/api/v1/employees/stats",
    tag = "Employees",
    summary = "Employee statistics",
    responses(
        (status = 200, description = "Headcount", body = EmployeeStats),
        (status = 403, description = "Caller is not HR", body = ErrorResponse),
    )
)]
pub async fn stats(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.employee_service.stats(&actor).await?))
}

/// `GET /employees/export` — Download active profiles as CSV or JSON.
///
/// # Errors
///
/// Returns [`AppError::PermissionDenied`] unless the caller is HR.
#[utoipa::path(
    get,
    path = "/api/v1/employees/export",
    tag = "Employees",
    summary = "Export employee profiles",
    params(ExportParams),
    responses(
        (status = 200, description = "CSV attachment or JSON list", body = ExportResponse),
        (status = 403, description = "Caller is not HR", body = ErrorResponse),
    )
)]
pub async fn export(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<ExportParams>,
) -> Result<Response, AppError> {
    let (format, filter) = params.into_query();
    let employees = state.employee_service.export(&actor, &filter).await?;
    match format {
        ExportFormat::Json => Ok(Json(ExportResponse {
            count: employees.len(),
            employees,
        })
        .into_response()),
        ExportFormat::Csv => {
            let text = to_csv(&employees)?;
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"employees.csv\"",
                    ),
                ],
                text,
            )
                .into_response())
        }
    }
}

/// `GET /employees/:user_id` — Get one active profile.
///
/// # Errors
///
/// Returns [`AppError::ProfileNotFound`] for a missing or inactive profile.
#[utoipa::path(
    get,
    path = "/api/v1/employees/{user_id}",
    tag = "Employees",
    summary = "Get employee profile",
    params(
        ("user_id" = String, Path, description = "Owning user id"),
    ),
    responses(
        (status = 200, description = "Profile with its history", body = EmployeeProfile),
        (status = 403, description = "Neither the owner nor HR", body = ErrorResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse),
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(
        state.employee_service.get_profile(&actor, &user_id).await?,
    ))
}

/// `PATCH /employees/:user_id` — HR edit with an audited reason.
///
/// # Errors
///
/// Returns [`AppError::NoChangesDetected`] when nothing differs and
/// [`AppError::VersionConflict`] when a concurrent edit won.
#[utoipa::path(
    patch,
    path = "/api/v1/employees/{user_id}",
    tag = "Employees",
    summary = "Update employee profile",
    params(
        ("user_id" = String, Path, description = "Owning user id"),
    ),
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated profile", body = EmployeeProfile),
        (status = 400, description = "Invalid edit or no changes", body = ErrorResponse),
        (status = 403, description = "Caller is not HR", body = ErrorResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse),
        (status = 409, description = "Concurrent modification", body = ErrorResponse),
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<String>,
    body: Result<Json<ProfileUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = body?;
    let profile = state
        .employee_service
        .update_profile(
            &actor,
            &user_id,
            request.fields,
            request.reason,
            request.expected_version,
        )
        .await?;
    Ok(Json(profile))
}

/// `DELETE /employees/:user_id` — Deactivate a profile.
///
/// The body is optional; without one the default reason is recorded.
///
/// # Errors
///
/// Returns [`AppError::InvalidState`] if the profile is already inactive.
#[utoipa::path(
    delete,
    path = "/api/v1/employees/{user_id}",
    tag = "Employees",
    summary = "Deactivate employee profile",
    params(
        ("user_id" = String, Path, description = "Owning user id"),
    ),
    request_body(content = DeactivateRequest, description = "Optional reason"),
    responses(
        (status = 200, description = "Deactivated profile", body = EmployeeProfile),
        (status = 403, description = "Caller is not HR", body = ErrorResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse),
        (status = 409, description = "Already inactive", body = ErrorResponse),
    )
)]
pub async fn deactivate_profile(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<String>,
    body: Result<Json<DeactivateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => DeactivateRequest::default(),
        Err(rejection) => return Err(rejection.into()),
    };
    let profile = state
        .employee_service
        .deactivate_profile(&actor, &user_id, request.reason)
        .await?;
    Ok(Json(profile))
}

/// `POST /employees/:user_id/approve` — Approve a pending profile.
///
/// # Errors
///
/// Returns [`AppError::InvalidState`] if it is already approved.
#[utoipa::path(
    post,
    path = "/api/v1/employees/{user_id}/approve",
    tag = "Employees",
    summary = "Approve employee profile",
    params(
        ("user_id" = String, Path, description = "Owning user id"),
    ),
    responses(
        (status = 200, description = "Approved profile", body = EmployeeProfile),
        (status = 403, description = "Caller is not HR", body = ErrorResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse),
        (status = 409, description = "Already approved", body = ErrorResponse),
    )
)]
pub async fn approve_profile(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(
        state
            .employee_service
            .approve_profile(&actor, &user_id)
            .await?,
    ))
}

/// Employee routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/employees", get(list_profiles).post(create_profile))
        .route("/employees/stats", get(stats))
        .route("/employees/export", get(export))
        .route(
            "/employees/{user_id}",
            get(get_profile)
                .patch(update_profile)
                .delete(deactivate_profile),
        )
        .route("/employees/{user_id}/approve", post(approve_profile))
}
