//! Service catalog handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::domain::{Actor, CatalogEntry, CatalogEntryId, CatalogPatch, NewCatalogEntry};
use crate::error::{AppError, ErrorResponse};

/// `GET /catalog` — List catalog entries.
///
/// # Errors
///
/// Returns [`AppError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/catalog",
    tag = "Catalog",
    summary = "List catalog entries",
    responses(
        (status = 200, description = "Entries ordered by name", body = Vec<CatalogEntry>),
    )
)]
pub async fn list_entries(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.catalog_service.list_entries(&actor).await?))
}

/// `POST /catalog` — Add a catalog entry.
///
/// # Errors
///
/// Returns [`AppError::DuplicateCatalogValue`] if `value` is taken.
#[utoipa::path(
    post,
    path = "/api/v1/catalog",
    tag = "Catalog",
    summary = "Add catalog entry",
    request_body = NewCatalogEntry,
    responses(
        (status = 201, description = "Entry created", body = CatalogEntry),
        (status = 400, description = "Blank name or value", body = ErrorResponse),
        (status = 409, description = "Value already in use", body = ErrorResponse),
    )
)]
pub async fn add_entry(
    State(state): State<AppState>,
    actor: Actor,
    body: Result<Json<NewCatalogEntry>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(new) = body?;
    let entry = state.catalog_service.add_entry(&actor, new).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// `PATCH /catalog/:id` — Edit a catalog entry.
///
/// # Errors
///
/// Returns [`AppError::CatalogEntryNotFound`] if the entry does not exist.
#[utoipa::path(
    patch,
    path = "/api/v1/catalog/{id}",
    tag = "Catalog",
    summary = "Edit catalog entry",
    params(
        ("id" = uuid::Uuid, Path, description = "Catalog entry UUID"),
    ),
    request_body = CatalogPatch,
    responses(
        (status = 200, description = "Updated entry", body = CatalogEntry),
        (status = 400, description = "Empty or invalid patch", body = ErrorResponse),
        (status = 403, description = "Role may not edit the catalog", body = ErrorResponse),
        (status = 404, description = "Entry not found", body = ErrorResponse),
    )
)]
pub async fn update_entry(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
    body: Result<Json<CatalogPatch>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(patch) = body?;
    let entry = state
        .catalog_service
        .update_entry(&actor, CatalogEntryId::from_uuid(id), patch)
        .await?;
    Ok(Json(entry))
}

/// `DELETE /catalog/:id` — Remove a catalog entry.
///
/// # Errors
///
/// Returns [`AppError::CatalogEntryNotFound`] if the entry does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/catalog/{id}",
    tag = "Catalog",
    summary = "Delete catalog entry",
    params(
        ("id" = uuid::Uuid, Path, description = "Catalog entry UUID"),
    ),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 403, description = "Role may not edit the catalog", body = ErrorResponse),
        (status = 404, description = "Entry not found", body = ErrorResponse),
    )
)]
pub async fn delete_entry(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .catalog_service
        .delete_entry(&actor, CatalogEntryId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Catalog routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/catalog", get(list_entries).post(add_entry))
        .route("/catalog/{id}", patch(update_entry).delete(delete_entry))
}
