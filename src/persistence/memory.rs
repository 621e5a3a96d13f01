//! In-process store backed by `tokio::sync::RwLock<HashMap<..>>`.
//!
//! The version check and the write in [`BookingStore::replace`] and
//! [`BookingStore::delete`] happen under one write lock, so concurrent
//! writers to the same booking are serialized and the loser sees
//! [`AppError::VersionConflict`].

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BookingStore, CatalogStore, EmployeeStore, UserStore};
use crate::domain::employee::next_employee_code;
use crate::domain::{
    Booking, BookingFilter, BookingId, CatalogEntry, CatalogEntryId, EmployeeProfile, Page,
    PageResult, ProfileFilter, User, UserId,
};
use crate::error::AppError;

/// Store used in tests and when persistence is disabled.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bookings: RwLock<HashMap<BookingId, Booking>>,
    catalog: RwLock<HashMap<CatalogEntryId, CatalogEntry>>,
    users: RwLock<HashMap<UserId, User>>,
    profiles: RwLock<HashMap<String, EmployeeProfile>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bookings held, trashed ones included.
    pub async fn len(&self) -> usize {
        self.bookings.read().await.len()
    }

    /// Returns `true` if no bookings are held.
    pub async fn is_empty(&self) -> bool {
        self.bookings.read().await.is_empty()
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert(&self, booking: Booking) -> Result<Booking, AppError> {
        let mut map = self.bookings.write().await;
        if map.contains_key(&booking.id) {
            return Err(AppError::InvalidRequest(format!(
                "booking {} already exists",
                booking.id
            )));
        }
        map.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn get(&self, id: BookingId) -> Result<Booking, AppError> {
        let map = self.bookings.read().await;
        map.get(&id).cloned().ok_or(AppError::BookingNotFound(id))
    }

    async fn replace(
        &self,
        mut booking: Booking,
        expected_version: u64,
    ) -> Result<Booking, AppError> {
        let mut map = self.bookings.write().await;
        let stored = map
            .get_mut(&booking.id)
            .ok_or(AppError::BookingNotFound(booking.id))?;
        if stored.version != expected_version {
            return Err(AppError::VersionConflict {
                id: format!("booking {}", booking.id),
                expected: expected_version,
                actual: stored.version,
            });
        }
        booking.version = expected_version.saturating_add(1);
        *stored = booking.clone();
        Ok(booking)
    }

    async fn delete(&self, id: BookingId, expected_version: u64) -> Result<(), AppError> {
        let mut map = self.bookings.write().await;
        let stored = map.get(&id).ok_or(AppError::BookingNotFound(id))?;
        if stored.version != expected_version {
            return Err(AppError::VersionConflict {
                id: format!("booking {id}"),
                expected: expected_version,
                actual: stored.version,
            });
        }
        stored.ensure_destroyable()?;
        map.remove(&id);
        Ok(())
    }

    async fn query(
        &self,
        filter: &BookingFilter,
        page: Page,
    ) -> Result<PageResult<Booking>, AppError> {
        let map = self.bookings.read().await;
        let mut matched: Vec<&Booking> = map.values().filter(|b| filter.matches(b)).collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matched.len() as u64;
        let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let items = matched
            .into_iter()
            .skip(skip)
            .take(page.per_page as usize)
            .cloned()
            .collect();
        Ok(PageResult { items, total })
    }

    async fn list_trashed(&self) -> Result<Vec<Booking>, AppError> {
        let map = self.bookings.read().await;
        let mut trashed: Vec<Booking> = map.values().filter(|b| b.is_deleted).cloned().collect();
        trashed.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at));
        Ok(trashed)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn insert_entry(&self, entry: CatalogEntry) -> Result<CatalogEntry, AppError> {
        let mut map = self.catalog.write().await;
        if map.values().any(|e| e.value == entry.value) {
            return Err(AppError::DuplicateCatalogValue(entry.value));
        }
        map.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn list_entries(&self) -> Result<Vec<CatalogEntry>, AppError> {
        let map = self.catalog.read().await;
        let mut entries: Vec<CatalogEntry> = map.values().cloned().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn get_entry(&self, id: CatalogEntryId) -> Result<CatalogEntry, AppError> {
        let map = self.catalog.read().await;
        map.get(&id)
            .cloned()
            .ok_or(AppError::CatalogEntryNotFound(*id.as_uuid()))
    }

    async fn update_entry(&self, entry: CatalogEntry) -> Result<CatalogEntry, AppError> {
        let mut map = self.catalog.write().await;
        if map
            .values()
            .any(|e| e.id != entry.id && e.value == entry.value)
        {
            return Err(AppError::DuplicateCatalogValue(entry.value));
        }
        let stored = map
            .get_mut(&entry.id)
            .ok_or(AppError::CatalogEntryNotFound(*entry.id.as_uuid()))?;
        *stored = entry.clone();
        Ok(entry)
    }

    async fn delete_entry(&self, id: CatalogEntryId) -> Result<(), AppError> {
        let mut map = self.catalog.write().await;
        map.remove(&id)
            .map(|_| ())
            .ok_or(AppError::CatalogEntryNotFound(*id.as_uuid()))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: User) -> Result<User, AppError> {
        let mut map = self.users.write().await;
        if map.values().any(|u| u.email == user.email) {
            return Err(AppError::AlreadyExists(format!("email {}", user.email)));
        }
        map.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<User, AppError> {
        let map = self.users.read().await;
        map.get(&id).cloned().ok_or(AppError::UserNotFound(id))
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let map = self.users.read().await;
        let mut users: Vec<User> = map.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn update_user(&self, user: User) -> Result<User, AppError> {
        let mut map = self.users.write().await;
        if map.values().any(|u| u.id != user.id && u.email == user.email) {
            return Err(AppError::AlreadyExists(format!("email {}", user.email)));
        }
        let stored = map.get_mut(&user.id).ok_or(AppError::UserNotFound(user.id))?;
        *stored = user.clone();
        Ok(user)
    }

    async fn delete_user(&self, id: UserId) -> Result<(), AppError> {
        let mut map = self.users.write().await;
        map.remove(&id).map(|_| ()).ok_or(AppError::UserNotFound(id))
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn insert_profile(
        &self,
        mut profile: EmployeeProfile,
        prefix: &str,
    ) -> Result<EmployeeProfile, AppError> {
        let mut map = self.profiles.write().await;
        if map.contains_key(&profile.user_id) {
            return Err(AppError::AlreadyExists(format!(
                "profile for user {}",
                profile.user_id
            )));
        }
        let d = &profile.details;
        if map.values().any(|p| {
            p.details.personal_email == d.personal_email || p.details.work_email == d.work_email
        }) {
            return Err(AppError::AlreadyExists("profile email address".to_string()));
        }
        profile.employee_code =
            next_employee_code(prefix, map.values().map(|p| p.employee_code.as_str()));
        map.insert(profile.user_id.clone(), profile.clone());
        Ok(profile)
    }

    async fn get_profile(&self, user_id: &str) -> Result<EmployeeProfile, AppError> {
        let map = self.profiles.read().await;
        map.get(user_id)
            .cloned()
            .ok_or_else(|| AppError::ProfileNotFound(user_id.to_string()))
    }

    async fn replace_profile(
        &self,
        mut profile: EmployeeProfile,
        expected_version: u64,
    ) -> Result<EmployeeProfile, AppError> {
        let mut map = self.profiles.write().await;
        let stored = map
            .get_mut(&profile.user_id)
            .ok_or_else(|| AppError::ProfileNotFound(profile.user_id.clone()))?;
        if stored.version != expected_version {
            return Err(AppError::VersionConflict {
                id: format!("profile of {}", profile.user_id),
                expected: expected_version,
                actual: stored.version,
            });
        }
        profile.version = expected_version.saturating_add(1);
        *stored = profile.clone();
        Ok(profile)
    }

    async fn query_profiles(
        &self,
        filter: &ProfileFilter,
        page: Page,
    ) -> Result<PageResult<EmployeeProfile>, AppError> {
        let map = self.profiles.read().await;
        let mut matched: Vec<&EmployeeProfile> =
            map.values().filter(|p| filter.matches(p)).collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matched.len() as u64;
        let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let items = matched
            .into_iter()
            .skip(skip)
            .take(page.per_page as usize)
            .cloned()
            .collect();
        Ok(PageResult { items, total })
    }

    async fn export_profiles(
        &self,
        filter: &ProfileFilter,
    ) -> Result<Vec<EmployeeProfile>, AppError> {
        let map = self.profiles.read().await;
        let mut matched: Vec<EmployeeProfile> =
            map.values().filter(|p| filter.matches(p)).cloned().collect();
        matched.sort_by(|a, b| a.employee_code.cmp(&b.employee_code));
        Ok(matched)
    }
}
