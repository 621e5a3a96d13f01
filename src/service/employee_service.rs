//! Employee service: HR profiles, their review, and headcount reports.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::{
    Action, Actor, Authorizer, Clock, Decision, EmployeeProfile, EmployeeStats, Page, PageResult,
    ProfileDetails, ProfileFilter, Resource,
};
use crate::error::AppError;
use crate::persistence::EmployeeStore;

/// Profile lifecycle: the employee submits, HR reviews, edits, approves,
/// and deactivates. Deactivated profiles read as not found.
#[derive(Debug, Clone)]
pub struct EmployeeService {
    store: Arc<dyn EmployeeStore>,
    clock: Arc<dyn Clock>,
    authorizer: Arc<dyn Authorizer>,
}

impl EmployeeService {
    /// Creates a new `EmployeeService`.
    #[must_use]
    pub fn new(
        store: Arc<dyn EmployeeStore>,
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

    async fn load_active(&self, user_id: &str) -> Result<EmployeeProfile, AppError> {
        let profile = self.store.get_profile(user_id).await?;
        if !profile.is_active {
            return Err(AppError::ProfileNotFound(user_id.to_string()));
        }
        Ok(profile)
    }

    /// Submits the actor's own profile for review and assigns its code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MissingFields`] or [`AppError::InvalidRequest`]
    /// for a bad submission and [`AppError::AlreadyExists`] if the actor
    /// already has a profile or an email is in use.
    pub async fn create_profile(
        &self,
        actor: &Actor,
        body: Map<String, Value>,
    ) -> Result<EmployeeProfile, AppError> {
        self.authorize(
            actor,
            Action::CreateProfile,
            Resource::Profile {
                owner: &actor.user_id,
            },
        )?;
        let details = ProfileDetails::from_json(body)?;
        let now = self.clock.now();
        let profile = EmployeeProfile::create(&actor.user_id, details, now);
        let prefix = profile.code_prefix(now);
        let profile = self.store.insert_profile(profile, &prefix).await?;
        tracing::info!(
            user_id = %profile.user_id,
            employee_code = %profile.employee_code,
            "employee profile created"
        );
        Ok(profile)
    }

    /// Loads an active profile for its owner or HR.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PermissionDenied`] or
    /// [`AppError::ProfileNotFound`].
    pub async fn get_profile(
        &self,
        actor: &Actor,
        user_id: &str,
    ) -> Result<EmployeeProfile, AppError> {
        self.authorize(actor, Action::ViewProfile, Resource::Profile { owner: user_id })?;
        self.load_active(user_id).await
    }

    /// Lists active profiles, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PermissionDenied`] unless the actor is HR.
    pub async fn list_profiles(
        &self,
        actor: &Actor,
        filter: &ProfileFilter,
        page: Page,
    ) -> Result<PageResult<EmployeeProfile>, AppError> {
        self.authorize(actor, Action::ManageProfiles, Resource::Profiles)?;
        self.store.query_profiles(filter, page).await
    }

    /// Applies an HR edit and records it in the profile history.
    ///
    /// # Errors
    ///
    /// - [`AppError::PermissionDenied`] unless the actor is HR.
    /// - [`AppError::ProfileNotFound`] for a missing or inactive profile.
    /// - [`AppError::VersionConflict`] if `expected_version` is stale or a
    ///   concurrent edit won.
    /// - [`AppError::NoChangesDetected`] or a validation error.
    pub async fn update_profile(
        &self,
        actor: &Actor,
        user_id: &str,
        fields: Map<String, Value>,
        reason: Option<String>,
        expected_version: Option<u64>,
    ) -> Result<EmployeeProfile, AppError> {
        self.authorize(actor, Action::ManageProfiles, Resource::Profiles)?;
        let mut profile = self.load_active(user_id).await?;
        let read_version = profile.version;
        if let Some(expected) = expected_version
            && expected != read_version
        {
            return Err(AppError::VersionConflict {
                id: format!("profile of {user_id}"),
                expected,
                actual: read_version,
            });
        }
        let changed = profile.update(fields, reason, actor.attribution(), self.clock.now())?;
        let profile = self.store.replace_profile(profile, read_version).await?;
        tracing::info!(%user_id, changed, "employee profile updated");
        Ok(profile)
    }

    /// Deactivates a profile.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PermissionDenied`], [`AppError::ProfileNotFound`],
    /// [`AppError::InvalidState`], or [`AppError::VersionConflict`].
    pub async fn deactivate_profile(
        &self,
        actor: &Actor,
        user_id: &str,
        reason: Option<String>,
    ) -> Result<EmployeeProfile, AppError> {
        self.authorize(actor, Action::ManageProfiles, Resource::Profiles)?;
        let mut profile = self.store.get_profile(user_id).await?;
        let read_version = profile.version;
        profile.deactivate(reason, actor.attribution(), self.clock.now())?;
        let profile = self.store.replace_profile(profile, read_version).await?;
        tracing::info!(%user_id, "employee profile deactivated");
        Ok(profile)
    }

    /// Approves a pending profile.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PermissionDenied`], [`AppError::ProfileNotFound`],
    /// [`AppError::InvalidState`], or [`AppError::VersionConflict`].
    pub async fn approve_profile(
        &self,
        actor: &Actor,
        user_id: &str,
    ) -> Result<EmployeeProfile, AppError> {
        self.authorize(actor, Action::ManageProfiles, Resource::Profiles)?;
        let mut profile = self.load_active(user_id).await?;
        let read_version = profile.version;
        profile.approve(actor.attribution(), self.clock.now())?;
        let profile = self.store.replace_profile(profile, read_version).await?;
        tracing::info!(%user_id, approved_by = %actor.attribution(), "employee profile approved");
        Ok(profile)
    }

    /// Headcount over all active profiles.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PermissionDenied`] unless the actor is HR.
    pub async fn stats(&self, actor: &Actor) -> Result<EmployeeStats, AppError> {
        self.authorize(actor, Action::ManageProfiles, Resource::Profiles)?;
        let profiles = self.store.export_profiles(&ProfileFilter::default()).await?;
        Ok(EmployeeStats::from_profiles(&profiles))
    }

    /// Every matching active profile, ordered by employee code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PermissionDenied`] unless the actor is HR.
    pub async fn export(
        &self,
        actor: &Actor,
        filter: &ProfileFilter,
    ) -> Result<Vec<EmployeeProfile>, AppError> {
        self.authorize(actor, Action::ManageProfiles, Resource::Profiles)?;
        let profiles = self.store.export_profiles(filter).await?;
        tracing::info!(count = profiles.len(), "employee profiles exported");
        Ok(profiles)
    }
}
