//! Database row models for bookings, catalog entries, users, and employee
//! profiles.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Booking, BookingId, CatalogEntry, CatalogEntryId, EmployeeProfile, User, UserId,
};
use crate::error::AppError;

/// A row from the `bookings` table.
///
/// The full record lives in `document`; the other columns duplicate the
/// fields that queries filter and sort on.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingRow {
    /// Primary key.
    pub id: Uuid,
    /// Optimistic-concurrency version.
    pub version: i64,
    /// Owning user.
    pub user_id: String,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// Trash timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Serialized [`Booking`].
    pub document: serde_json::Value,
}

impl BookingRow {
    /// Serializes a booking into its row form.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the booking cannot be serialized or
    /// its version does not fit a `BIGINT`.
    pub fn from_booking(booking: &Booking) -> Result<Self, AppError> {
        Ok(Self {
            id: *booking.id.as_uuid(),
            version: version_to_db(booking.version)?,
            user_id: booking.user_id.clone(),
            is_deleted: booking.is_deleted,
            deleted_at: booking.deleted_at,
            created_at: booking.created_at,
            document: serde_json::to_value(booking)
                .map_err(|e| AppError::Internal(format!("serialize booking: {e}")))?,
        })
    }

    /// Deserializes the stored document, trusting the columns for the
    /// version and identity.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PersistenceError`] if the document is corrupt.
    pub fn into_booking(self) -> Result<Booking, AppError> {
        let mut booking: Booking = serde_json::from_value(self.document).map_err(|e| {
            AppError::PersistenceError(format!("corrupt booking document {}: {e}", self.id))
        })?;
        booking.id = BookingId::from_uuid(self.id);
        booking.version = u64::try_from(self.version).unwrap_or_default();
        Ok(booking)
    }
}

/// A row from the `catalog_entries` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CatalogRow {
    /// Primary key.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Unique machine value.
    pub value: String,
    /// Offered flag.
    pub active: bool,
}

impl From<CatalogRow> for CatalogEntry {
    fn from(row: CatalogRow) -> Self {
        Self {
            id: CatalogEntryId::from_uuid(row.id),
            name: row.name,
            value: row.value,
            active: row.active,
        }
    }
}

/// A row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    /// Primary key.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Unique login email.
    pub email: String,
    /// Role string.
    pub user_role: String,
    /// Session flag.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::from_uuid(row.id),
            name: row.name,
            email: row.email,
            user_role: row.user_role,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A row from the `employee_profiles` table. Like bookings, the profile is
/// a JSONB document with its key columns pulled out.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
    /// Owning user, primary key.
    pub user_id: String,
    /// Unique employee code.
    pub employee_code: String,
    /// Optimistic-concurrency version.
    pub version: i64,
    /// Soft-delete flag (inverted).
    pub is_active: bool,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
    /// Serialized [`EmployeeProfile`].
    pub document: serde_json::Value,
}

impl ProfileRow {
    /// Serializes a profile into its row form.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the profile cannot be serialized or
    /// its version does not fit a `BIGINT`.
    pub fn from_profile(profile: &EmployeeProfile) -> Result<Self, AppError> {
        Ok(Self {
            user_id: profile.user_id.clone(),
            employee_code: profile.employee_code.clone(),
            version: version_to_db(profile.version)?,
            is_active: profile.is_active,
            created_at: profile.created_at,
            document: serde_json::to_value(profile)
                .map_err(|e| AppError::Internal(format!("serialize profile: {e}")))?,
        })
    }

    /// Deserializes the stored document; the version column wins.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PersistenceError`] if the document is corrupt.
    pub fn into_profile(self) -> Result<EmployeeProfile, AppError> {
        let mut profile: EmployeeProfile = serde_json::from_value(self.document).map_err(|e| {
            AppError::PersistenceError(format!("corrupt profile document {}: {e}", self.user_id))
        })?;
        profile.version = u64::try_from(self.version).unwrap_or_default();
        Ok(profile)
    }
}

/// Converts a version to the signed column type.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the version exceeds `i64::MAX`.
pub fn version_to_db(version: u64) -> Result<i64, AppError> {
    i64::try_from(version).map_err(|_| AppError::Internal(format!("version {version} overflows")))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::booking::tests::sample_booking;
    use crate::domain::employee::tests::sample_profile;

    #[test]
    fn booking_survives_the_row_form() {
        let booking = sample_booking();
        let Ok(row) = BookingRow::from_booking(&booking) else {
            panic!("serializable");
        };
        assert_eq!(row.version, 1);
        assert!(!row.is_deleted);
        let Ok(back) = row.into_booking() else {
            panic!("deserializable");
        };
        assert_eq!(back, booking);
    }

    #[test]
    fn columns_win_over_document() {
        let booking = sample_booking();
        let Ok(mut row) = BookingRow::from_booking(&booking) else {
            panic!("serializable");
        };
        row.version = 7;
        let Ok(back) = row.into_booking() else {
            panic!("deserializable");
        };
        assert_eq!(back.version, 7);
    }

    #[test]
    fn profile_survives_the_row_form() {
        let profile = sample_profile("u-1");
        let Ok(mut row) = ProfileRow::from_profile(&profile) else {
            panic!("serializable");
        };
        assert_eq!(row.employee_code, "SL240001");
        row.version = 3;
        let Ok(back) = row.into_profile() else {
            panic!("deserializable");
        };
        assert_eq!(back.version, 3);
        assert_eq!(back.details, profile.details);
    }
}
