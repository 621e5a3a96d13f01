//! REST API layer: route handlers, DTOs, identity extraction, and router
//! composition.
//!
//! All resource endpoints are mounted under `/api/v1`. With the
//! `swagger-ui` feature the OpenAPI document is served at
//! `/api-docs/openapi.json` and browsable at `/swagger-ui`.

pub mod actor;
pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI description of every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "booking-desk",
        description = "Booking records with field-level change history and a two-stage trash lifecycle, plus user accounts and employee HR profiles."
    ),
    paths(
        handlers::booking::create_booking,
        handlers::booking::list_bookings,
        handlers::booking::list_trash,
        handlers::booking::get_booking,
        handlers::booking::update_booking,
        handlers::booking::trash_booking,
        handlers::booking::restore_booking,
        handlers::booking::delete_booking,
        handlers::catalog::list_entries,
        handlers::catalog::add_entry,
        handlers::catalog::update_entry,
        handlers::catalog::delete_entry,
        handlers::user::list_users,
        handlers::user::add_user,
        handlers::user::get_user,
        handlers::user::edit_user,
        handlers::user::delete_user,
        handlers::user::set_session,
        handlers::user::list_user_bookings,
        handlers::employee::create_profile,
        handlers::employee::list_profiles,
        handlers::employee::stats,
        handlers::employee::export,
        handlers::employee::get_profile,
        handlers::employee::update_profile,
        handlers::employee::deactivate_profile,
        handlers::employee::approve_profile,
        handlers::system::health_handler,
    ),
    components(schemas(
        crate::domain::Booking,
        crate::domain::NewBooking,
        crate::domain::ChangeEntry,
        crate::domain::CatalogEntry,
        crate::domain::NewCatalogEntry,
        crate::domain::CatalogPatch,
        crate::domain::User,
        crate::domain::NewUser,
        crate::domain::UserPatch,
        crate::domain::EmployeeProfile,
        crate::domain::ProfileDetails,
        crate::domain::ProfileStatus,
        crate::domain::ProfileChange,
        crate::domain::ValueChange,
        crate::domain::EmployeeStats,
        crate::domain::GroupCount,
        crate::domain::Joinee,
        dto::BookingListResponse,
        dto::SessionRequest,
        dto::ProfileListResponse,
        dto::ProfileUpdateRequest,
        dto::DeactivateRequest,
        dto::ExportFormat,
        dto::ExportResponse,
        dto::PaginationMeta,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
        handlers::system::HealthResponse,
    )),
    tags(
        (name = "Bookings", description = "Booking records, updates and trash"),
        (name = "Catalog", description = "Services that bookings reference"),
        (name = "Users", description = "Accounts and session status"),
        (name = "Employees", description = "HR profiles, review, and reports"),
        (name = "System", description = "Operational endpoints"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/bookings",
            "/api/v1/bookings/trash",
            "/api/v1/bookings/{id}",
            "/api/v1/bookings/{id}/trash",
            "/api/v1/bookings/{id}/restore",
            "/api/v1/catalog",
            "/api/v1/catalog/{id}",
            "/api/v1/users",
            "/api/v1/users/{id}",
            "/api/v1/users/{id}/session",
            "/api/v1/users/{id}/bookings",
            "/api/v1/employees",
            "/api/v1/employees/stats",
            "/api/v1/employees/export",
            "/api/v1/employees/{user_id}",
            "/api/v1/employees/{user_id}/approve",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
