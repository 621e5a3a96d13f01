//! Booking service: field-diff updates and the trash lifecycle.

use std::sync::Arc;

use crate::domain::{
    Action, Actor, Authorizer, Booking, BookingFilter, BookingId, BookingUpdate, ChangeEntry,
    Clock, Decision, NewBooking, Page, PageResult, Resource, RoleTier,
};
use crate::error::AppError;
use crate::persistence::BookingStore;

/// Orchestration layer for all booking operations.
///
/// Every operation follows the same pattern: authorize → load → check
/// state → mutate in memory → `replace` with the version that was read.
/// A concurrent writer that got there first surfaces as
/// [`AppError::VersionConflict`] instead of a silent overwrite.
#[derive(Debug, Clone)]
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    authorizer: Arc<dyn Authorizer>,
}

impl BookingService {
    /// Creates a new `BookingService`.
    #[must_use]
    pub fn new(
        store: Arc<dyn BookingStore>,
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

    /// Validates and stores a new booking.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MissingFields`] or [`AppError::InvalidRequest`]
    /// for a bad submission, and [`AppError::PermissionDenied`] when a
    /// restricted actor submits a booking owned by someone else.
    pub async fn create_booking(&self, actor: &Actor, new: NewBooking) -> Result<Booking, AppError> {
        let booking = Booking::create(new, BookingId::new(), self.clock.now())?;
        self.authorize(
            actor,
            Action::CreateBooking,
            Resource::Booking {
                owner: &booking.user_id,
            },
        )?;
        let booking = self.store.insert(booking).await?;
        tracing::info!(booking_id = %booking.id, user_id = %booking.user_id, "booking created");
        Ok(booking)
    }

    /// Loads one booking.
    ///
    /// Trashed bookings are reported as not found to anyone who may not
    /// view the trash.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BookingNotFound`] or [`AppError::PermissionDenied`].
    pub async fn get_booking(&self, actor: &Actor, id: BookingId) -> Result<Booking, AppError> {
        let booking = self.store.get(id).await?;
        if booking.is_deleted
            && !self
                .authorizer
                .authorize(actor, Action::ViewTrash, Resource::Bookings)
                .is_allowed()
        {
            return Err(AppError::BookingNotFound(id));
        }
        self.authorize(
            actor,
            Action::ViewBooking,
            Resource::Booking {
                owner: &booking.user_id,
            },
        )?;
        Ok(booking)
    }

    /// Lists active bookings. Restricted actors only ever see their own.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PermissionDenied`] or a persistence error.
    pub async fn list_bookings(
        &self,
        actor: &Actor,
        mut filter: BookingFilter,
        page: Page,
    ) -> Result<PageResult<Booking>, AppError> {
        self.authorize(actor, Action::ViewBooking, Resource::Bookings)?;
        if actor.role.tier() == RoleTier::Restricted {
            filter.owner = Some(actor.user_id.clone());
        }
        self.store.query(&filter, page).await
    }

    /// Applies a partial update and appends one change entry.
    ///
    /// Fields the actor's role may not change are dropped before diffing.
    /// If nothing differs from the stored record, nothing is written.
    ///
    /// # Errors
    ///
    /// - [`AppError::BookingNotFound`] if `id` does not resolve.
    /// - [`AppError::PermissionDenied`] if the actor may not edit it.
    /// - [`AppError::InvalidState`] if the booking is in the trash.
    /// - [`AppError::VersionConflict`] if `expected_version` is stale or a
    ///   concurrent write won.
    /// - [`AppError::NoChangesDetected`] if the diff is empty.
    pub async fn update_booking(
        &self,
        actor: &Actor,
        id: BookingId,
        update: BookingUpdate,
    ) -> Result<Booking, AppError> {
        let mut booking = self.store.get(id).await?;
        self.authorize(
            actor,
            Action::EditBooking,
            Resource::Booking {
                owner: &booking.user_id,
            },
        )?;
        if booking.is_deleted {
            return Err(AppError::InvalidState(format!(
                "booking {id} is in trash and cannot be edited"
            )));
        }
        let read_version = booking.version;
        if let Some(expected) = update.expected_version
            && expected != read_version
        {
            return Err(AppError::VersionConflict {
                id: format!("booking {id}"),
                expected,
                actual: read_version,
            });
        }

        let BookingUpdate {
            actor: claimed_actor,
            note,
            patch: mut proposed,
            ..
        } = update;
        let dropped = proposed.retain_editable_by(actor.role);
        if !dropped.is_empty() {
            tracing::debug!(booking_id = %id, role = %actor.role, ?dropped, "dropped fields outside role");
        }

        let changes = proposed.diff(&booking);
        if changes.is_empty() {
            return Err(AppError::NoChangesDetected);
        }

        let now = self.clock.now();
        let attribution = claimed_actor.as_deref().or(Some(actor.attribution()));
        let entry = ChangeEntry::new(attribution, now, note.as_deref(), changes);
        let changed: Vec<_> = entry.fields().map(|f| f.as_str()).collect();

        proposed.apply_to(&mut booking)?;
        booking.change_history.push(entry);
        booking.updated_at = now;

        let booking = self.store.replace(booking, read_version).await?;
        tracing::info!(booking_id = %id, version = booking.version, ?changed, "booking updated");
        Ok(booking)
    }

    /// Moves an active booking to the trash. History is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PermissionDenied`] below the elevated tier,
    /// [`AppError::BookingNotFound`], or [`AppError::InvalidState`] if the
    /// booking is already trashed.
    pub async fn trash_booking(&self, actor: &Actor, id: BookingId) -> Result<Booking, AppError> {
        self.authorize(actor, Action::TrashBooking, Resource::Bookings)?;
        let mut booking = self.store.get(id).await?;
        let read_version = booking.version;
        booking.move_to_trash(Some(actor.attribution()), self.clock.now())?;
        let booking = self.store.replace(booking, read_version).await?;
        tracing::info!(booking_id = %id, deleted_by = ?booking.deleted_by, "booking moved to trash");
        Ok(booking)
    }

    /// Returns a trashed booking to the active state.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PermissionDenied`] below full access,
    /// [`AppError::BookingNotFound`], or [`AppError::InvalidState`] if the
    /// booking is not trashed.
    pub async fn restore_booking(&self, actor: &Actor, id: BookingId) -> Result<Booking, AppError> {
        self.authorize(actor, Action::RestoreBooking, Resource::Bookings)?;
        let mut booking = self.store.get(id).await?;
        let read_version = booking.version;
        booking.restore(self.clock.now())?;
        let booking = self.store.replace(booking, read_version).await?;
        tracing::info!(booking_id = %id, "booking restored");
        Ok(booking)
    }

    /// Lists trashed bookings, most recently trashed first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PermissionDenied`] below full access.
    pub async fn list_trash(&self, actor: &Actor) -> Result<Vec<Booking>, AppError> {
        self.authorize(actor, Action::ViewTrash, Resource::Bookings)?;
        self.store.list_trashed().await
    }

    /// Permanently removes a trashed booking.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PermissionDenied`] below full access,
    /// [`AppError::BookingNotFound`], or [`AppError::InvalidState`] if the
    /// booking has not been trashed first. A restore or edit that lands
    /// between the read and the delete gives [`AppError::VersionConflict`]
    /// and the booking is kept.
    pub async fn delete_booking(&self, actor: &Actor, id: BookingId) -> Result<(), AppError> {
        self.authorize(actor, Action::DestroyBooking, Resource::Bookings)?;
        let booking = self.store.get(id).await?;
        booking.ensure_destroyable()?;
        self.store.delete(id, booking.version).await?;
        tracing::info!(booking_id = %id, user_id = %actor.user_id, "booking permanently deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::booking::tests::sample_new_booking;
    use crate::domain::{
        BookingField, BookingPatch, FieldChange, FieldValue, ManualClock, Role, RolePolicy,
    };
    use crate::persistence::memory::MemoryStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;
    use tokio::sync::Mutex;
    use tokio_test::assert_ok;

    /// A write made by another request between this request's read and
    /// its own write.
    #[derive(Debug)]
    enum Rival {
        Restore,
        Edit(BookingPatch),
    }

    /// Store that lets a rival write land right after the next `get`.
    #[derive(Debug, Default)]
    struct RacingStore {
        inner: MemoryStore,
        rival: Mutex<Option<Rival>>,
    }

    #[async_trait]
    impl BookingStore for RacingStore {
        async fn insert(&self, booking: Booking) -> Result<Booking, AppError> {
            self.inner.insert(booking).await
        }

        async fn get(&self, id: BookingId) -> Result<Booking, AppError> {
            let seen = self.inner.get(id).await?;
            let Some(rival) = self.rival.lock().await.take() else {
                return Ok(seen);
            };
            let mut other = seen.clone();
            match rival {
                Rival::Restore => other.restore(Utc::now())?,
                Rival::Edit(patch) => {
                    let changes = patch.diff(&other);
                    other.change_history.push(ChangeEntry::new(
                        Some("rival"),
                        Utc::now(),
                        None,
                        changes,
                    ));
                    patch.apply_to(&mut other)?;
                }
            }
            self.inner.replace(other, seen.version).await?;
            Ok(seen)
        }

        async fn replace(&self, booking: Booking, expected: u64) -> Result<Booking, AppError> {
            self.inner.replace(booking, expected).await
        }

        async fn delete(&self, id: BookingId, expected: u64) -> Result<(), AppError> {
            self.inner.delete(id, expected).await
        }

        async fn query(
            &self,
            filter: &BookingFilter,
            page: Page,
        ) -> Result<PageResult<Booking>, AppError> {
            self.inner.query(filter, page).await
        }

        async fn list_trashed(&self) -> Result<Vec<Booking>, AppError> {
            self.inner.list_trashed().await
        }
    }

    fn racing_service() -> (BookingService, Arc<RacingStore>) {
        let store = Arc::new(RacingStore::default());
        let service = BookingService::new(
            Arc::clone(&store) as _,
            Arc::new(ManualClock::new(Utc::now())),
            Arc::new(RolePolicy),
        );
        (service, store)
    }

    fn make_service() -> BookingService {
        BookingService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::new(Utc::now())),
            Arc::new(RolePolicy),
        )
    }

    fn srdev() -> Actor {
        Actor::new("u-dev", Some("Dana".to_string()), Role::SrDev)
    }

    fn admin() -> Actor {
        Actor::new("u-admin", Some("Arun".to_string()), Role::Admin)
    }

    fn member(user_id: &str) -> Actor {
        Actor::new(user_id, None, Role::Member)
    }

    fn update(body: serde_json::Value) -> BookingUpdate {
        let Ok(update) = BookingUpdate::from_json(body) else {
            panic!("valid update body");
        };
        update
    }

    async fn seeded(service: &BookingService) -> Booking {
        assert_ok!(service.create_booking(&srdev(), sample_new_booking()).await)
    }

    #[tokio::test]
    async fn update_records_exactly_the_changed_fields() {
        let service = make_service();
        let booking = seeded(&service).await;

        let updated = assert_ok!(
            service
                .update_booking(
                    &admin(),
                    booking.id,
                    update(json!({"status": "Completed", "bank": "Cash", "actor": "alice"})),
                )
                .await
        );

        assert_eq!(updated.change_history.len(), booking.change_history.len() + 1);
        let Some(entry) = updated.change_history.last() else {
            panic!("entry appended");
        };
        assert_eq!(entry.actor, "alice");
        assert_eq!(entry.fields().collect::<Vec<_>>(), vec![BookingField::Status]);
        assert_eq!(
            entry.field_changes.get(&BookingField::Status),
            Some(&FieldChange {
                old: FieldValue::Text("Pending".to_string()),
                new: FieldValue::Text("Completed".to_string()),
            })
        );
        assert_eq!(updated.status.as_deref(), Some("Completed"));
        assert_eq!(updated.version, booking.version + 1);
    }

    #[tokio::test]
    async fn no_op_update_fails_and_writes_nothing() {
        let service = make_service();
        let booking = seeded(&service).await;

        let result = service
            .update_booking(&admin(), booking.id, update(json!({"status": "Pending"})))
            .await;
        assert!(matches!(result, Err(AppError::NoChangesDetected)));

        let stored = assert_ok!(service.get_booking(&srdev(), booking.id).await);
        assert_eq!(stored, booking);
    }

    #[tokio::test]
    async fn admin_services_change_is_dropped_not_rejected() {
        let service = make_service();
        let booking = seeded(&service).await;

        let updated = assert_ok!(
            service
                .update_booking(
                    &admin(),
                    booking.id,
                    update(json!({"services": ["itr"], "remark": "renewal"})),
                )
                .await
        );
        assert_eq!(updated.services, booking.services);
        let Some(entry) = updated.change_history.last() else {
            panic!("entry appended");
        };
        assert!(!entry.field_changes.contains_key(&BookingField::Services));
        assert!(entry.field_changes.contains_key(&BookingField::Remark));

        let only_services = service
            .update_booking(&admin(), booking.id, update(json!({"services": ["itr"]})))
            .await;
        assert!(matches!(only_services, Err(AppError::NoChangesDetected)));
    }

    #[tokio::test]
    async fn full_access_may_change_services() {
        let service = make_service();
        let booking = seeded(&service).await;
        let updated = assert_ok!(
            service
                .update_booking(&srdev(), booking.id, update(json!({"services": ["itr"]})))
                .await
        );
        assert_eq!(updated.services, vec!["itr".to_string()]);
    }

    #[tokio::test]
    async fn member_edits_only_own_booking() {
        let service = make_service();
        let booking = seeded(&service).await;

        let stranger = service
            .update_booking(&member("u-2"), booking.id, update(json!({"remark": "x"})))
            .await;
        assert!(matches!(stranger, Err(AppError::PermissionDenied(_))));

        let owner = member(&booking.user_id);
        let updated = assert_ok!(
            service
                .update_booking(&owner, booking.id, update(json!({"remark": "x", "total_amount": 1})))
                .await
        );
        assert_eq!(updated.remark.as_deref(), Some("x"));
        assert!((updated.total_amount - booking.total_amount).abs() < f64::EPSILON);
        let Some(entry) = updated.change_history.last() else {
            panic!("entry appended");
        };
        assert_eq!(entry.actor, booking.user_id);
    }

    #[tokio::test]
    async fn stale_expected_version_is_a_conflict() {
        let service = make_service();
        let booking = seeded(&service).await;
        assert_ok!(
            service
                .update_booking(&admin(), booking.id, update(json!({"remark": "first"})))
                .await
        );
        let result = service
            .update_booking(
                &admin(),
                booking.id,
                update(json!({"remark": "second", "expected_version": 1})),
            )
            .await;
        assert!(matches!(result, Err(AppError::VersionConflict { actual: 2, .. })));
    }

    #[tokio::test]
    async fn trash_and_restore_round_trip_keeps_history() {
        let service = make_service();
        let booking = seeded(&service).await;
        let edited = assert_ok!(
            service
                .update_booking(&admin(), booking.id, update(json!({"remark": "r"})))
                .await
        );

        let trashed = assert_ok!(service.trash_booking(&admin(), booking.id).await);
        assert!(trashed.is_deleted);
        assert!(trashed.deleted_at.is_some());
        assert_eq!(trashed.deleted_by.as_deref(), Some("Arun"));
        assert_eq!(trashed.change_history, edited.change_history);

        let restored = assert_ok!(service.restore_booking(&srdev(), booking.id).await);
        assert!(!restored.is_deleted);
        assert_eq!(restored.deleted_at, None);
        assert_eq!(restored.change_history, edited.change_history);
    }

    #[tokio::test]
    async fn trashed_bookings_leave_listings_and_refuse_edits() {
        let service = make_service();
        let booking = seeded(&service).await;
        assert_ok!(service.trash_booking(&srdev(), booking.id).await);

        let page = assert_ok!(
            service
                .list_bookings(&admin(), BookingFilter::default(), Page::new(1, 20))
                .await
        );
        assert_eq!(page.total, 0);

        let edit = service
            .update_booking(&srdev(), booking.id, update(json!({"remark": "late"})))
            .await;
        assert!(matches!(edit, Err(AppError::InvalidState(_))));

        assert!(matches!(
            service.get_booking(&admin(), booking.id).await,
            Err(AppError::BookingNotFound(_))
        ));
        assert_ok!(service.get_booking(&srdev(), booking.id).await);
    }

    #[tokio::test]
    async fn trash_requires_elevated_and_restore_requires_full_access() {
        let service = make_service();
        let booking = seeded(&service).await;
        let owner = member(&booking.user_id);

        assert!(matches!(
            service.trash_booking(&owner, booking.id).await,
            Err(AppError::PermissionDenied(_))
        ));
        assert_ok!(service.trash_booking(&admin(), booking.id).await);
        assert!(matches!(
            service.restore_booking(&admin(), booking.id).await,
            Err(AppError::PermissionDenied(_))
        ));
        assert!(matches!(
            service.list_trash(&admin()).await,
            Err(AppError::PermissionDenied(_))
        ));
        assert!(matches!(
            service.trash_booking(&srdev(), booking.id).await,
            Err(AppError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn permanent_delete_requires_trash_first() {
        let service = make_service();
        let booking = seeded(&service).await;

        assert!(matches!(
            service.delete_booking(&srdev(), booking.id).await,
            Err(AppError::InvalidState(_))
        ));
        assert_ok!(service.get_booking(&srdev(), booking.id).await);

        assert_ok!(service.trash_booking(&srdev(), booking.id).await);
        assert!(matches!(
            service.delete_booking(&admin(), booking.id).await,
            Err(AppError::PermissionDenied(_))
        ));
        assert_ok!(service.delete_booking(&srdev(), booking.id).await);
        assert!(matches!(
            service.get_booking(&srdev(), booking.id).await,
            Err(AppError::BookingNotFound(_))
        ));
    }

    #[tokio::test]
    async fn trash_listing_orders_by_deletion_time() {
        let service = make_service();
        let first = seeded(&service).await;
        let second = seeded(&service).await;
        assert_ok!(service.trash_booking(&srdev(), first.id).await);
        assert_ok!(service.trash_booking(&srdev(), second.id).await);

        let trash = assert_ok!(service.list_trash(&srdev()).await);
        let ids: Vec<_> = trash.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn members_list_only_their_own() {
        let service = make_service();
        seeded(&service).await;
        let mut other = sample_new_booking();
        other.user_id = Some("u-2".to_string());
        assert_ok!(service.create_booking(&srdev(), other).await);

        let mine = assert_ok!(
            service
                .list_bookings(&member("u-2"), BookingFilter::default(), Page::new(1, 20))
                .await
        );
        assert_eq!(mine.total, 1);
        assert!(mine.items.iter().all(|b| b.user_id == "u-2"));

        let all = assert_ok!(
            service
                .list_bookings(&admin(), BookingFilter::default(), Page::new(1, 20))
                .await
        );
        assert_eq!(all.total, 2);
    }

    #[tokio::test]
    async fn member_cannot_create_for_someone_else() {
        let service = make_service();
        let result = service
            .create_booking(&member("u-9"), sample_new_booking())
            .await;
        assert!(matches!(result, Err(AppError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn patch_built_in_code_goes_through_the_same_rules() {
        let service = make_service();
        let booking = seeded(&service).await;
        let request = BookingUpdate {
            patch: BookingPatch::new().with(BookingField::Term1, FieldValue::Number(5000.0)),
            ..BookingUpdate::default()
        };
        let updated = assert_ok!(service.update_booking(&admin(), booking.id, request).await);
        let Some(entry) = updated.change_history.last() else {
            panic!("entry appended");
        };
        assert_eq!(entry.actor, "Arun");
        assert_eq!(updated.term_1, Some(5000.0));
    }

    #[tokio::test]
    async fn restore_racing_a_purge_keeps_the_booking() {
        let (service, store) = racing_service();
        let booking = seeded(&service).await;
        assert_ok!(service.trash_booking(&srdev(), booking.id).await);

        *store.rival.lock().await = Some(Rival::Restore);
        assert!(matches!(
            service.delete_booking(&srdev(), booking.id).await,
            Err(AppError::VersionConflict { .. })
        ));

        let kept = assert_ok!(store.inner.get(booking.id).await);
        assert!(!kept.is_deleted);
        assert_eq!(kept.deleted_at, None);
    }

    #[tokio::test]
    async fn concurrent_updates_from_the_same_read_let_one_through() {
        let (service, store) = racing_service();
        let booking = seeded(&service).await;

        *store.rival.lock().await = Some(Rival::Edit(
            BookingPatch::new().with(BookingField::Status, FieldValue::Text("Completed".to_string())),
        ));
        let result = service
            .update_booking(&admin(), booking.id, update(json!({"remark": "second"})))
            .await;
        let Err(AppError::VersionConflict {
            expected, actual, ..
        }) = result
        else {
            panic!("expected version conflict");
        };
        assert_eq!((expected, actual), (1, 2));

        let stored = assert_ok!(store.inner.get(booking.id).await);
        assert_eq!(stored.change_history.len(), 1);
        assert_eq!(stored.status.as_deref(), Some("Completed"));
        assert_eq!(stored.remark, None);
    }

    #[tokio::test]
    async fn non_finite_amount_updates_are_refused_every_time() {
        let service = make_service();
        let booking = seeded(&service).await;
        for _ in 0..2 {
            assert!(matches!(
                BookingUpdate::from_json(json!({"total_amount": "NaN"})),
                Err(AppError::InvalidRequest(_))
            ));
        }
        let stored = assert_ok!(service.get_booking(&srdev(), booking.id).await);
        assert!(stored.change_history.is_empty());
        assert_eq!(stored.total_amount, booking.total_amount);
    }
}
