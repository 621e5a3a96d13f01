//! Authorization: one `(actor, action, resource)` check per operation.

use std::fmt;

use super::{Actor, Role, RoleTier};

/// Operation an actor wants to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Submit a new booking.
    CreateBooking,
    /// Read one booking or list active bookings.
    ViewBooking,
    /// Apply a field update.
    EditBooking,
    /// Move a booking to trash.
    TrashBooking,
    /// List trashed bookings or read a trashed booking.
    ViewTrash,
    /// Return a trashed booking to active.
    RestoreBooking,
    /// Remove a trashed booking permanently.
    DestroyBooking,
    /// List catalog entries.
    ViewCatalog,
    /// Add a catalog entry.
    AddCatalogEntry,
    /// Edit a catalog entry.
    EditCatalogEntry,
    /// Delete a catalog entry.
    RemoveCatalogEntry,
    /// List, add, edit, or delete user accounts.
    ManageUsers,
    /// Read one user account.
    ViewUser,
    /// Mark a user's session as started or ended.
    SetSession,
    /// Submit one's own employee profile.
    CreateProfile,
    /// Read one employee profile.
    ViewProfile,
    /// List, edit, deactivate, approve, and export employee profiles.
    ManageProfiles,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CreateBooking => "create booking",
            Self::ViewBooking => "view booking",
            Self::EditBooking => "edit booking",
            Self::TrashBooking => "move booking to trash",
            Self::ViewTrash => "view trash",
            Self::RestoreBooking => "restore booking",
            Self::DestroyBooking => "permanently delete booking",
            Self::ViewCatalog => "view catalog",
            Self::AddCatalogEntry => "add catalog entry",
            Self::EditCatalogEntry => "edit catalog entry",
            Self::RemoveCatalogEntry => "delete catalog entry",
            Self::ManageUsers => "manage users",
            Self::ViewUser => "view user",
            Self::SetSession => "change session",
            Self::CreateProfile => "create employee profile",
            Self::ViewProfile => "view employee profile",
            Self::ManageProfiles => "manage employee profiles",
        };
        f.write_str(s)
    }
}

/// What the action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource<'a> {
    /// A specific booking owned by `owner`.
    Booking {
        /// `user_id` of the booking.
        owner: &'a str,
    },
    /// The booking collection as a whole.
    Bookings,
    /// The service catalog.
    Catalog,
    /// One user account, by its id string.
    User {
        /// The account's id.
        id: &'a str,
    },
    /// The user directory as a whole.
    Users,
    /// The employee profile owned by `owner`.
    Profile {
        /// `user_id` the profile belongs to.
        owner: &'a str,
    },
    /// All employee profiles.
    Profiles,
}

impl<'a> Resource<'a> {
    /// The user the resource belongs to, if it belongs to one.
    const fn owner(self) -> Option<&'a str> {
        match self {
            Self::Booking { owner } | Self::Profile { owner } => Some(owner),
            Self::User { id } => Some(id),
            Self::Bookings | Self::Catalog | Self::Users | Self::Profiles => None,
        }
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The operation may proceed.
    Allow,
    /// The operation is refused, with a reason for the caller.
    Deny(String),
}

impl Decision {
    /// Returns `true` for [`Decision::Allow`].
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Capability check consulted once per service operation.
pub trait Authorizer: Send + Sync + fmt::Debug {
    /// Decides whether `actor` may perform `action` on `resource`.
    fn authorize(&self, actor: &Actor, action: Action, resource: Resource<'_>) -> Decision;
}

/// Default policy: a tier table for bookings and the catalog, named roles
/// for accounts and profiles.
///
/// | Action                         | Restricted    | Elevated | Full access |
/// |--------------------------------|---------------|----------|-------------|
/// | create / view / edit booking   | own only      | yes      | yes         |
/// | trash booking                  | no            | yes      | yes         |
/// | view trash / restore / destroy | no            | no       | yes         |
/// | view / add catalog             | yes           | yes      | yes         |
/// | edit / delete catalog          | no            | no       | yes         |
///
/// | Action                          | Allowed to                |
/// |---------------------------------|---------------------------|
/// | manage users                    | `srdev`                   |
/// | view user / change session      | the user, or `srdev`      |
/// | create employee profile         | the profile's owner       |
/// | view employee profile           | the profile's owner, `hr` |
/// | manage employee profiles        | `hr`                      |
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePolicy;

impl RolePolicy {
    fn by_name(actor: &Actor, action: Action, resource: Resource<'_>) -> Decision {
        let own = resource.owner() == Some(actor.user_id.as_str());
        let allowed = match action {
            Action::ManageUsers => actor.role == Role::SrDev,
            Action::ViewUser | Action::SetSession => own || actor.role == Role::SrDev,
            Action::CreateProfile => own,
            Action::ViewProfile => own || actor.role == Role::Hr,
            Action::ManageProfiles => actor.role == Role::Hr,
            _ => false,
        };
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny(format!("role '{}' may not {action}", actor.role))
        }
    }
}

impl Authorizer for RolePolicy {
    fn authorize(&self, actor: &Actor, action: Action, resource: Resource<'_>) -> Decision {
        let tier = actor.role.tier();
        let required = match action {
            Action::ManageUsers
            | Action::ViewUser
            | Action::SetSession
            | Action::CreateProfile
            | Action::ViewProfile
            | Action::ManageProfiles => return Self::by_name(actor, action, resource),
            Action::CreateBooking | Action::ViewBooking | Action::EditBooking => {
                RoleTier::Restricted
            }
            Action::ViewCatalog | Action::AddCatalogEntry => RoleTier::Restricted,
            Action::TrashBooking => RoleTier::Elevated,
            Action::ViewTrash
            | Action::RestoreBooking
            | Action::DestroyBooking
            | Action::EditCatalogEntry
            | Action::RemoveCatalogEntry => RoleTier::FullAccess,
        };
        if tier < required {
            return Decision::Deny(format!("role '{}' may not {action}", actor.role));
        }
        if tier == RoleTier::Restricted
            && let Resource::Booking { owner } = resource
            && owner != actor.user_id
        {
            return Decision::Deny(format!(
                "role '{}' may only {action} on its own bookings",
                actor.role
            ));
        }
        Decision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    fn actor(role: Role) -> Actor {
        Actor::new("u-1", None, role)
    }

    #[test]
    fn member_is_scoped_to_own_bookings() {
        let policy = RolePolicy;
        let member = actor(Role::Member);
        assert!(
            policy
                .authorize(&member, Action::EditBooking, Resource::Booking { owner: "u-1" })
                .is_allowed()
        );
        assert!(
            !policy
                .authorize(&member, Action::EditBooking, Resource::Booking { owner: "u-2" })
                .is_allowed()
        );
    }

    #[test]
    fn admin_may_trash_but_not_restore() {
        let policy = RolePolicy;
        let admin = actor(Role::Admin);
        assert!(
            policy
                .authorize(&admin, Action::TrashBooking, Resource::Bookings)
                .is_allowed()
        );
        assert!(
            !policy
                .authorize(&admin, Action::RestoreBooking, Resource::Bookings)
                .is_allowed()
        );
        assert!(
            policy
                .authorize(&admin, Action::EditBooking, Resource::Booking { owner: "u-9" })
                .is_allowed()
        );
    }

    #[test]
    fn full_access_roles_manage_trash_and_catalog() {
        let policy = RolePolicy;
        for role in [Role::Dev, Role::SrDev, Role::SeniorAdmin] {
            let a = actor(role);
            for action in [
                Action::ViewTrash,
                Action::RestoreBooking,
                Action::DestroyBooking,
                Action::EditCatalogEntry,
                Action::RemoveCatalogEntry,
            ] {
                assert!(policy.authorize(&a, action, Resource::Bookings).is_allowed());
            }
        }
    }

    #[test]
    fn deny_reason_names_role_and_action() {
        let decision = RolePolicy.authorize(&actor(Role::Member), Action::ViewTrash, Resource::Bookings);
        assert_eq!(
            decision,
            Decision::Deny("role 'member' may not view trash".to_string())
        );
    }

    #[test]
    fn only_srdev_manages_users() {
        let policy = RolePolicy;
        assert!(
            policy
                .authorize(&actor(Role::SrDev), Action::ManageUsers, Resource::Users)
                .is_allowed()
        );
        for role in [Role::Dev, Role::SeniorAdmin, Role::Admin, Role::Hr] {
            assert!(
                !policy
                    .authorize(&actor(role), Action::ManageUsers, Resource::Users)
                    .is_allowed(),
                "{role}"
            );
        }
    }

    #[test]
    fn sessions_belong_to_their_user() {
        let policy = RolePolicy;
        let member = actor(Role::Member);
        assert!(
            policy
                .authorize(&member, Action::SetSession, Resource::User { id: "u-1" })
                .is_allowed()
        );
        assert!(
            !policy
                .authorize(&member, Action::SetSession, Resource::User { id: "u-2" })
                .is_allowed()
        );
        assert!(
            policy
                .authorize(&actor(Role::SrDev), Action::SetSession, Resource::User { id: "u-2" })
                .is_allowed()
        );
    }

    #[test]
    fn profiles_are_owner_or_hr() {
        let policy = RolePolicy;
        let hr = actor(Role::Hr);
        let dev = actor(Role::SrDev);
        let other = Resource::Profile { owner: "u-2" };
        assert!(policy.authorize(&hr, Action::ViewProfile, other).is_allowed());
        assert!(!policy.authorize(&dev, Action::ViewProfile, other).is_allowed());
        assert!(!policy.authorize(&hr, Action::CreateProfile, other).is_allowed());
        assert!(
            policy
                .authorize(&dev, Action::CreateProfile, Resource::Profile { owner: "u-1" })
                .is_allowed()
        );
        assert!(policy.authorize(&hr, Action::ManageProfiles, Resource::Profiles).is_allowed());
        assert!(!policy.authorize(&dev, Action::ManageProfiles, Resource::Profiles).is_allowed());
    }
}
