//! Request identity taken from headers set by the upstream auth layer.
//!
//! | Header      | Required | Meaning                                 |
//! |-------------|----------|-----------------------------------------|
//! | `user-id`   | yes      | Stable user identifier                  |
//! | `user-role` | yes      | Role name, unknown names act as members |
//! | `user-name` | no       | Display name used for attribution       |

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use crate::domain::{Actor, Role};
use crate::error::AppError;

/// Header carrying the caller's user identifier.
pub const USER_ID_HEADER: &str = "user-id";
/// Header carrying the caller's role.
pub const USER_ROLE_HEADER: &str = "user-role";
/// Header carrying the caller's display name.
pub const USER_NAME_HEADER: &str = "user-name";

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Builds an [`Actor`] from request headers.
///
/// # Errors
///
/// Returns [`AppError::Unauthenticated`] if `user-id` or `user-role` is
/// missing or blank.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, AppError> {
    let user_id = header_value(headers, USER_ID_HEADER)
        .ok_or_else(|| AppError::Unauthenticated(format!("missing {USER_ID_HEADER} header")))?;
    let role = header_value(headers, USER_ROLE_HEADER)
        .ok_or_else(|| AppError::Unauthenticated(format!("missing {USER_ROLE_HEADER} header")))?;
    let name = header_value(headers, USER_NAME_HEADER).map(str::to_string);
    Ok(Actor::new(user_id, name, Role::parse(role)))
}

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        actor_from_headers(&parts.headers)
    }
}
