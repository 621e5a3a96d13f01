//! User accounts: who may sign in and under which role.
//!
//! Credentials live with the upstream auth layer; an account here carries
//! the identity, the role string that layer forwards, and whether the user
//! currently has a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{UserId, contact};
use crate::error::AppError;

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Account id; its string form is the `user-id` header value.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email, unique and lowercased.
    pub email: String,
    /// Role string, e.g. `admin` or `HR`.
    pub user_role: String,
    /// `true` between session start and session end.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /users`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NewUser {
    /// Display name (required).
    pub name: Option<String>,
    /// Email (required).
    pub email: Option<String>,
    /// Role (required).
    pub user_role: Option<String>,
}

/// Body of `PATCH /users/{id}`. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UserPatch {
    /// New display name.
    pub name: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New role.
    pub user_role: Option<String>,
}

fn filled(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl User {
    /// Validates a submission into a new, signed-out account.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MissingFields`] for absent fields and
    /// [`AppError::InvalidRequest`] for a malformed email.
    pub fn create(new: NewUser, id: UserId, now: DateTime<Utc>) -> Result<Self, AppError> {
        let fields = [
            ("name", filled(new.name)),
            ("email", filled(new.email)),
            ("user_role", filled(new.user_role)),
        ];
        let missing: Vec<String> = fields
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| (*name).to_string())
            .collect();
        let [(_, Some(name)), (_, Some(email)), (_, Some(user_role))] = fields else {
            return Err(AppError::MissingFields(missing));
        };
        Ok(Self {
            id,
            name,
            email: contact::email(&email, "email")?,
            user_role,
            is_active: false,
            created_at: now,
            updated_at: now,
        })
    }
}

impl UserPatch {
    /// Applies the patch.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidRequest`] for an empty patch, a blank
    /// value, or a malformed email.
    pub fn apply_to(self, user: &mut User, now: DateTime<Utc>) -> Result<(), AppError> {
        if self.name.is_none() && self.email.is_none() && self.user_role.is_none() {
            return Err(AppError::InvalidRequest("no fields to update".to_string()));
        }
        let blank = |field: &str| AppError::InvalidRequest(format!("{field} must not be blank"));
        if let Some(name) = self.name {
            user.name = filled(Some(name)).ok_or_else(|| blank("name"))?;
        }
        if let Some(email) = self.email {
            user.email = contact::email(&email, "email")?;
        }
        if let Some(role) = self.user_role {
            user.user_role = filled(Some(role)).ok_or_else(|| blank("user_role"))?;
        }
        user.updated_at = now;
        Ok(())
    }
}
