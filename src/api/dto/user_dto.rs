//! Account request bodies.

use serde::Deserialize;
use utoipa::ToSchema;

/// Body of `PUT /api/v1/users/{id}/session`.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct SessionRequest {
    /// `true` on sign-in, `false` on sign-out.
    pub active: bool,
}
