//! Domain layer: booking records, change tracking, roles, catalog, user
//! accounts, and employee profiles.
//!
//! Everything here is storage- and transport-agnostic. The service layer
//! combines these types with a store, a clock, and an [`Authorizer`].

pub mod authz;
pub mod booking;
pub mod booking_field;
pub mod booking_patch;
pub mod booking_query;
pub mod catalog_entry;
pub mod change_entry;
pub mod clock;
pub mod contact;
pub mod employee;
pub mod employee_query;
pub mod field_value;
pub mod record_id;
pub mod role;
pub mod user;

pub use authz::{Action, Authorizer, Decision, Resource, RolePolicy};
pub use booking::{Booking, BookingState, NewBooking};
pub use booking_field::{BookingField, FieldKind};
pub use booking_patch::{BookingPatch, BookingUpdate};
pub use booking_query::{BookingFilter, DateRange, Page, PageResult};
pub use catalog_entry::{CatalogEntry, CatalogPatch, NewCatalogEntry};
pub use change_entry::{ChangeEntry, FieldChange, FieldChanges};
pub use clock::{Clock, ManualClock, SystemClock};
pub use employee::{EmployeeProfile, ProfileChange, ProfileDetails, ProfileStatus, ValueChange};
pub use employee_query::{EmployeeStats, GroupCount, Joinee, ProfileFilter};
pub use field_value::FieldValue;
pub use record_id::{BookingId, CatalogEntryId, UserId};
pub use role::{Actor, Role, RoleTier};
pub use user::{NewUser, User, UserPatch};
