//! Roles, permission tiers, and the authenticated actor.

use std::fmt;

use serde::Serialize;

use super::BookingField;

/// Permission tier, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleTier {
    /// Own records only, contact fields only.
    Restricted,
    /// All records, all fields except privileged ones.
    Elevated,
    /// Everything, including trash management.
    FullAccess,
}

/// Role string supplied by the authentication layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Any role the service does not recognise.
    Member,
    /// `admin`.
    Admin,
    /// `senior admin`.
    SeniorAdmin,
    /// `dev`.
    Dev,
    /// `srdev`. Also the only role that manages user accounts.
    SrDev,
    /// `hr`. Restricted for bookings; manages employee profiles.
    Hr,
}

impl Role {
    /// Maps a role header value. Unknown roles fall to [`Role::Member`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Self::Admin,
            "senior admin" | "senior_admin" => Self::SeniorAdmin,
            "dev" => Self::Dev,
            "srdev" => Self::SrDev,
            "hr" => Self::Hr,
            _ => Self::Member,
        }
    }

    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
            Self::SeniorAdmin => "senior admin",
            Self::Dev => "dev",
            Self::SrDev => "srdev",
            Self::Hr => "hr",
        }
    }

    /// Permission tier of this role.
    #[must_use]
    pub const fn tier(self) -> RoleTier {
        match self {
            Self::Member | Self::Hr => RoleTier::Restricted,
            Self::Admin => RoleTier::Elevated,
            Self::SeniorAdmin | Self::Dev | Self::SrDev => RoleTier::FullAccess,
        }
    }

    /// Whether an update from this role may touch `field`.
    #[must_use]
    pub const fn may_edit_field(self, field: BookingField) -> bool {
        match self.tier() {
            RoleTier::FullAccess => true,
            RoleTier::Elevated => !field.is_privileged(),
            RoleTier::Restricted => field.is_restricted_editable(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated identity performing an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Stable user identifier; compared with `Booking::user_id`.
    pub user_id: String,
    /// Display name, used for attribution when present.
    pub name: Option<String>,
    /// Role supplied by the authentication layer.
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub fn new(user_id: impl Into<String>, name: Option<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            name,
            role,
        }
    }

    /// Name to record in audit fields: display name, else user id.
    #[must_use]
    pub fn attribution(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.user_id)
    }
}
