//! User service: account administration and session status.

use std::sync::Arc;

use crate::domain::{
    Action, Actor, Authorizer, Clock, Decision, NewUser, Resource, User, UserId, UserPatch,
};
use crate::error::AppError;
use crate::persistence::UserStore;

/// Account CRUD for `srdev`, plus the session flag each user flips for
/// themselves on sign-in and sign-out.
#[derive(Debug, Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
    authorizer: Arc<dyn Authorizer>,
}

impl UserService {
    /// Creates a new `UserService`.
    #[must_use]
    pub fn new(
        store: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        Self {
            store,
            clock,
            authorizer,
        }
    }

    fn authorize(
        &self,
        actor: &Actor,
        action: Action,
        resource: Resource<'_>,
    ) -> Result<(), AppError> {
        match self.authorizer.authorize(actor, action, resource) {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => {
                tracing::warn!(user_id = %actor.user_id, role = %actor.role, %action, "denied");
                Err(AppError::PermissionDenied(reason))
            }
        }
    }

    /// Creates a signed-out account.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PermissionDenied`] unless the actor is `srdev`,
    /// a validation error, or [`AppError::AlreadyExists`] for a taken email.
    pub async fn add_user(&self, actor: &Actor, new: NewUser) -> Result<User, AppError> {
        self.authorize(actor, Action::ManageUsers, Resource::Users)?;
        let user = User::create(new, UserId::new(), self.clock.now())?;
        let user = self.store.insert_user(user).await?;
        tracing::info!(account_id = %user.id, role = %user.user_role, "user added");
        Ok(user)
    }

    /// Lists every account, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PermissionDenied`] unless the actor is `srdev`.
    pub async fn list_users(&self, actor: &Actor) -> Result<Vec<User>, AppError> {
        self.authorize(actor, Action::ManageUsers, Resource::Users)?;
        self.store.list_users().await
    }

    /// Loads one account. Users may read their own.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PermissionDenied`] or [`AppError::UserNotFound`].
    pub async fn get_user(&self, actor: &Actor, id: UserId) -> Result<User, AppError> {
        self.authorize(
            actor,
            Action::ViewUser,
            Resource::User {
                id: &id.to_string(),
            },
        )?;
        self.store.get_user(id).await
    }

    /// Edits name, email, or role.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PermissionDenied`], [`AppError::UserNotFound`],
    /// a validation error, or [`AppError::AlreadyExists`].
    pub async fn edit_user(
        &self,
        actor: &Actor,
        id: UserId,
        patch: UserPatch,
    ) -> Result<User, AppError> {
        self.authorize(actor, Action::ManageUsers, Resource::Users)?;
        let mut user = self.store.get_user(id).await?;
        patch.apply_to(&mut user, self.clock.now())?;
        let user = self.store.update_user(user).await?;
        tracing::info!(account_id = %id, "user updated");
        Ok(user)
    }

    /// Removes an account. Bookings and profiles it owns are kept.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PermissionDenied`] or [`AppError::UserNotFound`].
    pub async fn delete_user(&self, actor: &Actor, id: UserId) -> Result<(), AppError> {
        self.authorize(actor, Action::ManageUsers, Resource::Users)?;
        self.store.delete_user(id).await?;
        tracing::info!(account_id = %id, "user deleted");
        Ok(())
    }

    /// Records session start (`active = true`) or end.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PermissionDenied`] for someone else's account
    /// unless the actor is `srdev`, or [`AppError::UserNotFound`].
    pub async fn set_session(
        &self,
        actor: &Actor,
        id: UserId,
        active: bool,
    ) -> Result<User, AppError> {
        self.authorize(
            actor,
            Action::SetSession,
            Resource::User {
                id: &id.to_string(),
            },
        )?;
        let mut user = self.store.get_user(id).await?;
        user.is_active = active;
        user.updated_at = self.clock.now();
        let user = self.store.update_user(user).await?;
        tracing::info!(account_id = %id, active, "session status changed");
        Ok(user)
    }
}
