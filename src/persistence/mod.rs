//! Persistence layer: booking, catalog, user, and employee profile stores.
//!
//! The service layer talks to storage only through [`BookingStore`],
//! [`CatalogStore`], [`UserStore`], and [`EmployeeStore`]. [`memory::MemoryStore`] keeps everything in process;
//! [`postgres::PostgresStore`] uses `sqlx::PgPool` with bookings stored as
//! JSONB documents.
//!
//! Every booking write goes through [`BookingStore::replace`] or
//! [`BookingStore::delete`], which check the stored version against the one
//! the caller read.

pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::domain::{
    Booking, BookingFilter, BookingId, CatalogEntry, CatalogEntryId, EmployeeProfile, Page,
    PageResult, ProfileFilter, User, UserId,
};
use crate::error::AppError;

/// Storage for booking records.
#[async_trait]
pub trait BookingStore: Send + Sync + fmt::Debug {
    /// Inserts a new booking.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidRequest`] if the ID already exists, or
    /// [`AppError::PersistenceError`] on storage failure.
    async fn insert(&self, booking: Booking) -> Result<Booking, AppError>;

    /// Loads a booking regardless of its trash state.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BookingNotFound`] if the ID does not resolve.
    async fn get(&self, id: BookingId) -> Result<Booking, AppError>;

    /// Overwrites a booking if its stored version equals
    /// `expected_version`; the stored copy gets `expected_version + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BookingNotFound`] if the ID does not resolve and
    /// [`AppError::VersionConflict`] if another write got there first.
    async fn replace(&self, booking: Booking, expected_version: u64) -> Result<Booking, AppError>;

    /// Removes a trashed booking permanently, provided its stored version
    /// still equals `expected_version`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BookingNotFound`] if the ID does not resolve,
    /// [`AppError::VersionConflict`] if the booking changed since it was
    /// read, and [`AppError::InvalidState`] if it is not in the trash.
    async fn delete(&self, id: BookingId, expected_version: u64) -> Result<(), AppError>;

    /// Returns one page of active bookings matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PersistenceError`] on storage failure.
    async fn query(&self, filter: &BookingFilter, page: Page)
    -> Result<PageResult<Booking>, AppError>;

    /// Returns every trashed booking, most recently trashed first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PersistenceError`] on storage failure.
    async fn list_trashed(&self) -> Result<Vec<Booking>, AppError>;
}

/// Storage for service catalog entries.
#[async_trait]
pub trait CatalogStore: Send + Sync + fmt::Debug {
    /// Inserts an entry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DuplicateCatalogValue`] if `value` is taken.
    async fn insert_entry(&self, entry: CatalogEntry) -> Result<CatalogEntry, AppError>;

    /// Returns all entries ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PersistenceError`] on storage failure.
    async fn list_entries(&self) -> Result<Vec<CatalogEntry>, AppError>;

    /// Loads one entry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::CatalogEntryNotFound`] if the ID does not resolve.
    async fn get_entry(&self, id: CatalogEntryId) -> Result<CatalogEntry, AppError>;

    /// Overwrites an existing entry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::CatalogEntryNotFound`] or
    /// [`AppError::DuplicateCatalogValue`].
    async fn update_entry(&self, entry: CatalogEntry) -> Result<CatalogEntry, AppError>;

    /// Removes an entry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::CatalogEntryNotFound`] if the ID does not resolve.
    async fn delete_entry(&self, id: CatalogEntryId) -> Result<(), AppError>;
}

/// Storage for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync + fmt::Debug {
    /// Inserts an account.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::AlreadyExists`] if the email is taken.
    async fn insert_user(&self, user: User) -> Result<User, AppError>;

    /// Loads one account.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::UserNotFound`] if the ID does not resolve.
    async fn get_user(&self, id: UserId) -> Result<User, AppError>;

    /// Returns every account, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PersistenceError`] on storage failure.
    async fn list_users(&self) -> Result<Vec<User>, AppError>;

    /// Overwrites an existing account.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::UserNotFound`] or, if the new email belongs to
    /// another account, [`AppError::AlreadyExists`].
    async fn update_user(&self, user: User) -> Result<User, AppError>;

    /// Removes an account.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::UserNotFound`] if the ID does not resolve.
    async fn delete_user(&self, id: UserId) -> Result<(), AppError>;
}

/// Storage for employee profiles, keyed by owning user.
#[async_trait]
pub trait EmployeeStore: Send + Sync + fmt::Debug {
    /// Assigns the next employee code under `prefix` and inserts the
    /// profile. Code assignment and insert are atomic.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::AlreadyExists`] if the user already has a
    /// profile or either email is used by another profile.
    async fn insert_profile(
        &self,
        profile: EmployeeProfile,
        prefix: &str,
    ) -> Result<EmployeeProfile, AppError>;

    /// Loads the profile of `user_id`, active or not.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ProfileNotFound`] if the user has none.
    async fn get_profile(&self, user_id: &str) -> Result<EmployeeProfile, AppError>;

    /// Overwrites a profile if its stored version equals
    /// `expected_version`; the stored copy gets `expected_version + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ProfileNotFound`] or [`AppError::VersionConflict`].
    async fn replace_profile(
        &self,
        profile: EmployeeProfile,
        expected_version: u64,
    ) -> Result<EmployeeProfile, AppError>;

    /// Returns one page of matching profiles, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PersistenceError`] on storage failure.
    async fn query_profiles(
        &self,
        filter: &ProfileFilter,
        page: Page,
    ) -> Result<PageResult<EmployeeProfile>, AppError>;

    /// Returns every matching profile ordered by employee code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PersistenceError`] on storage failure.
    async fn export_profiles(&self, filter: &ProfileFilter)
    -> Result<Vec<EmployeeProfile>, AppError>;
}
