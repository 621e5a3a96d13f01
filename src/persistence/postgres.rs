//! PostgreSQL implementation of the persistence layer.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::models::{BookingRow, CatalogRow, ProfileRow, UserRow, version_to_db};
use super::{BookingStore, CatalogStore, EmployeeStore, UserStore};
use crate::config::AppConfig;
use crate::domain::employee::next_employee_code;
use crate::domain::{
    Booking, BookingFilter, BookingId, CatalogEntry, CatalogEntryId, EmployeeProfile, Page,
    PageResult, ProfileFilter, User, UserId,
};
use crate::error::AppError;

const BOOKING_COLUMNS: &str =
    "id, version, user_id, is_deleted, deleted_at, created_at, document";
const USER_COLUMNS: &str = "id, name, email, user_role, is_active, created_at, updated_at";
const PROFILE_COLUMNS: &str = "user_id, employee_code, version, is_active, created_at, document";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store on an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool from `config` and runs pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PersistenceError`] if the database is unreachable
    /// or a migration fails.
    pub async fn connect(config: &AppConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(config.database_connect_timeout())
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::PersistenceError(format!("migration failed: {e}")))?;

        tracing::info!("database migrations applied");
        Ok(Self::new(pool))
    }

    /// Stored version of a booking, used to explain a guarded write that
    /// matched no row.
    async fn stored_version(&self, id: BookingId) -> Result<Option<i64>, AppError> {
        let version = sqlx::query_scalar::<_, i64>("SELECT version FROM bookings WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(version)
    }
}

/// Appends the `WHERE` clause for an active-booking filter.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &BookingFilter) {
    builder.push(" WHERE is_deleted = FALSE");
    if let Some(range) = filter.booking_date {
        builder
            .push(" AND (document->>'date')::timestamptz BETWEEN ")
            .push_bind(range.start)
            .push(" AND ")
            .push_bind(range.end);
    }
    if let Some(range) = filter.payment_date {
        builder
            .push(" AND (document->>'payment_date')::timestamptz BETWEEN ")
            .push_bind(range.start)
            .push(" AND ")
            .push_bind(range.end);
    }
    if let Some(status) = &filter.status {
        builder
            .push(" AND LOWER(TRIM(document->>'status')) = LOWER(")
            .push_bind(status.clone())
            .push(")");
    }
    if let Some(service) = &filter.service {
        builder
            .push(" AND document->'services' @> jsonb_build_array(")
            .push_bind(service.clone())
            .push("::text)");
    }
    if let Some(mode) = &filter.payment_mode {
        builder
            .push(" AND document->>'bank' = ")
            .push_bind(mode.clone());
    }
    if let Some(bdm) = &filter.bdm_name {
        builder
            .push(" AND document->>'bdm' ILIKE ")
            .push_bind(format!("%{}%", escape_like(bdm)));
    }
    if let Some(owner) = &filter.owner {
        builder.push(" AND user_id = ").push_bind(owner.clone());
    }
}

/// Appends the `WHERE` clause for an active-profile filter.
fn push_profile_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ProfileFilter) {
    builder.push(" WHERE is_active = TRUE");
    if let Some(department) = &filter.department {
        builder
            .push(" AND document->>'department' = ")
            .push_bind(department.clone());
    }
    if let Some(branch) = &filter.branch {
        builder
            .push(" AND document->>'branch' = ")
            .push_bind(branch.clone());
    }
    if let Some(status) = filter.status {
        builder
            .push(" AND document->>'status' = ")
            .push_bind(status.as_str());
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" AND (document->>'full_name' ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR employee_code ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR document->>'personal_email' ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR document->>'work_email' ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn map_unique_violation(err: sqlx::Error, duplicate: impl FnOnce() -> AppError) -> AppError {
    match err.as_database_error() {
        Some(db) if db.is_unique_violation() => duplicate(),
        _ => AppError::from(err),
    }
}

fn version_conflict(id: BookingId, expected: u64, actual: i64) -> AppError {
    AppError::VersionConflict {
        id: format!("booking {id}"),
        expected,
        actual: u64::try_from(actual).unwrap_or_default(),
    }
}

#[async_trait]
impl BookingStore for PostgresStore {
    async fn insert(&self, booking: Booking) -> Result<Booking, AppError> {
        let row = BookingRow::from_booking(&booking)?;
        sqlx::query(
            "INSERT INTO bookings (id, version, user_id, is_deleted, deleted_at, created_at, document) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(row.id)
        .bind(row.version)
        .bind(&row.user_id)
        .bind(row.is_deleted)
        .bind(row.deleted_at)
        .bind(row.created_at)
        .bind(&row.document)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, || {
                AppError::InvalidRequest(format!("booking {} already exists", booking.id))
            })
        })?;
        Ok(booking)
    }

    async fn get(&self, id: BookingId) -> Result<Booking, AppError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::BookingNotFound(id))?;
        row.into_booking()
    }

    async fn replace(
        &self,
        mut booking: Booking,
        expected_version: u64,
    ) -> Result<Booking, AppError> {
        booking.version = expected_version.saturating_add(1);
        let row = BookingRow::from_booking(&booking)?;
        let result = sqlx::query(
            "UPDATE bookings SET version = $3, user_id = $4, is_deleted = $5, deleted_at = $6, \
             document = $7 WHERE id = $1 AND version = $2",
        )
        .bind(row.id)
        .bind(version_to_db(expected_version)?)
        .bind(row.version)
        .bind(&row.user_id)
        .bind(row.is_deleted)
        .bind(row.deleted_at)
        .bind(&row.document)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(booking);
        }
        match self.stored_version(booking.id).await? {
            None => Err(AppError::BookingNotFound(booking.id)),
            Some(actual) => Err(version_conflict(booking.id, expected_version, actual)),
        }
    }

    async fn delete(&self, id: BookingId, expected_version: u64) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM bookings WHERE id = $1 AND version = $2 AND is_deleted = TRUE",
        )
        .bind(id.as_uuid())
        .bind(version_to_db(expected_version)?)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 1 {
            return Ok(());
        }
        // Nothing matched: gone, changed since read, or not in the trash.
        match self.stored_version(id).await? {
            None => Err(AppError::BookingNotFound(id)),
            Some(actual) if u64::try_from(actual).ok() != Some(expected_version) => {
                Err(version_conflict(id, expected_version, actual))
            }
            Some(_) => Err(AppError::InvalidState(format!(
                "booking {id} must be moved to trash before it can be deleted"
            ))),
        }
    }

    async fn query(
        &self,
        filter: &BookingFilter,
        page: Page,
    ) -> Result<PageResult<Booking>, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM bookings");
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {BOOKING_COLUMNS} FROM bookings"));
        push_filter(&mut select, filter);
        select
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(i64::from(page.per_page))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
        let rows: Vec<BookingRow> = select.build_query_as().fetch_all(&self.pool).await?;

        let items = rows
            .into_iter()
            .map(BookingRow::into_booking)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PageResult {
            items,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn list_trashed(&self) -> Result<Vec<Booking>, AppError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE is_deleted = TRUE \
             ORDER BY deleted_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(BookingRow::into_booking).collect()
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn insert_entry(&self, entry: CatalogEntry) -> Result<CatalogEntry, AppError> {
        sqlx::query("INSERT INTO catalog_entries (id, name, value, active) VALUES ($1, $2, $3, $4)")
            .bind(entry.id.as_uuid())
            .bind(&entry.name)
            .bind(&entry.value)
            .bind(entry.active)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_unique_violation(e, || AppError::DuplicateCatalogValue(entry.value.clone()))
            })?;
        Ok(entry)
    }

    async fn list_entries(&self) -> Result<Vec<CatalogEntry>, AppError> {
        let rows = sqlx::query_as::<_, CatalogRow>(
            "SELECT id, name, value, active FROM catalog_entries ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CatalogEntry::from).collect())
    }

    async fn get_entry(&self, id: CatalogEntryId) -> Result<CatalogEntry, AppError> {
        sqlx::query_as::<_, CatalogRow>(
            "SELECT id, name, value, active FROM catalog_entries WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .map(CatalogEntry::from)
        .ok_or(AppError::CatalogEntryNotFound(*id.as_uuid()))
    }

    async fn update_entry(&self, entry: CatalogEntry) -> Result<CatalogEntry, AppError> {
        let result = sqlx::query(
            "UPDATE catalog_entries SET name = $2, value = $3, active = $4 WHERE id = $1",
        )
        .bind(entry.id.as_uuid())
        .bind(&entry.name)
        .bind(&entry.value)
        .bind(entry.active)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, || AppError::DuplicateCatalogValue(entry.value.clone()))
        })?;
        if result.rows_affected() == 0 {
            return Err(AppError::CatalogEntryNotFound(*entry.id.as_uuid()));
        }
        Ok(entry)
    }

    async fn delete_entry(&self, id: CatalogEntryId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM catalog_entries WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::CatalogEntryNotFound(*id.as_uuid()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn insert_user(&self, user: User) -> Result<User, AppError> {
        sqlx::query(
            "INSERT INTO users (id, name, email, user_role, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.user_role)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, || AppError::AlreadyExists(format!("email {}", user.email)))
        })?;
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<User, AppError> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(User::from)
            .ok_or(AppError::UserNotFound(id))
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update_user(&self, user: User) -> Result<User, AppError> {
        let result = sqlx::query(
            "UPDATE users SET name = $2, email = $3, user_role = $4, is_active = $5, \
             updated_at = $6 WHERE id = $1",
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.user_role)
        .bind(user.is_active)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, || AppError::AlreadyExists(format!("email {}", user.email)))
        })?;
        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound(user.id));
        }
        Ok(user)
    }

    async fn delete_user(&self, id: UserId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound(id));
        }
        Ok(())
    }
}

#[async_trait]
impl EmployeeStore for PostgresStore {
    async fn insert_profile(
        &self,
        mut profile: EmployeeProfile,
        prefix: &str,
    ) -> Result<EmployeeProfile, AppError> {
        let mut tx = self.pool.begin().await?;
        // Serializes code assignment across concurrent submissions.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext('employee_profiles'))")
            .execute(&mut *tx)
            .await?;

        let codes: Vec<String> = sqlx::query_scalar::<_, String>(
            "SELECT employee_code FROM employee_profiles WHERE employee_code LIKE $1",
        )
        .bind(format!("{}%", escape_like(prefix)))
        .fetch_all(&mut *tx)
        .await?;
        profile.employee_code = next_employee_code(prefix, codes.iter().map(String::as_str));

        let row = ProfileRow::from_profile(&profile)?;
        let user_id = profile.user_id.clone();
        sqlx::query(
            "INSERT INTO employee_profiles \
             (user_id, employee_code, version, is_active, created_at, document) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&row.user_id)
        .bind(&row.employee_code)
        .bind(row.version)
        .bind(row.is_active)
        .bind(row.created_at)
        .bind(&row.document)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            map_unique_violation(e, || {
                AppError::AlreadyExists(format!("profile for user {user_id} or its email"))
            })
        })?;
        tx.commit().await?;
        Ok(profile)
    }

    async fn get_profile(&self, user_id: &str) -> Result<EmployeeProfile, AppError> {
        sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM employee_profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::ProfileNotFound(user_id.to_string()))?
        .into_profile()
    }

    async fn replace_profile(
        &self,
        mut profile: EmployeeProfile,
        expected_version: u64,
    ) -> Result<EmployeeProfile, AppError> {
        profile.version = expected_version.saturating_add(1);
        let row = ProfileRow::from_profile(&profile)?;
        let result = sqlx::query(
            "UPDATE employee_profiles SET version = $3, is_active = $4, document = $5 \
             WHERE user_id = $1 AND version = $2",
        )
        .bind(&row.user_id)
        .bind(version_to_db(expected_version)?)
        .bind(row.version)
        .bind(row.is_active)
        .bind(&row.document)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, || {
                AppError::AlreadyExists("profile email address".to_string())
            })
        })?;
        if result.rows_affected() == 1 {
            return Ok(profile);
        }

        let actual = sqlx::query_scalar::<_, i64>(
            "SELECT version FROM employee_profiles WHERE user_id = $1",
        )
        .bind(&row.user_id)
        .fetch_optional(&self.pool)
        .await?;
        match actual {
            None => Err(AppError::ProfileNotFound(row.user_id)),
            Some(actual) => Err(AppError::VersionConflict {
                id: format!("profile of {}", row.user_id),
                expected: expected_version,
                actual: u64::try_from(actual).unwrap_or_default(),
            }),
        }
    }

    async fn query_profiles(
        &self,
        filter: &ProfileFilter,
        page: Page,
    ) -> Result<PageResult<EmployeeProfile>, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM employee_profiles");
        push_profile_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PROFILE_COLUMNS} FROM employee_profiles"
        ));
        push_profile_filter(&mut select, filter);
        select
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(i64::from(page.per_page))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
        let rows: Vec<ProfileRow> = select.build_query_as().fetch_all(&self.pool).await?;

        let items = rows
            .into_iter()
            .map(ProfileRow::into_profile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PageResult {
            items,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn export_profiles(
        &self,
        filter: &ProfileFilter,
    ) -> Result<Vec<EmployeeProfile>, AppError> {
        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PROFILE_COLUMNS} FROM employee_profiles"
        ));
        push_profile_filter(&mut select, filter);
        select.push(" ORDER BY employee_code ASC");
        let rows: Vec<ProfileRow> = select.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(ProfileRow::into_profile).collect()
    }
}
