//! REST endpoint handlers organized by resource.

pub mod booking;
pub mod catalog;
pub mod employee;
pub mod system;
pub mod user;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(booking::routes())
        .merge(catalog::routes())
        .merge(user::routes())
        .merge(employee::routes())
}
