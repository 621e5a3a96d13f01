//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::{BookingService, CatalogService, EmployeeService, UserService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Booking operations.
    pub booking_service: Arc<BookingService>,
    /// Catalog operations.
    pub catalog_service: Arc<CatalogService>,
    /// Account operations.
    pub user_service: Arc<UserService>,
    /// Employee profile operations.
    pub employee_service: Arc<EmployeeService>,
    /// Page size used when a list request does not set `per_page`.
    pub default_page_size: u32,
    /// Name of the storage backend, reported by `/health`.
    pub storage_backend: &'static str,
}
