//! Data Transfer Objects for REST request/response serialization.
//!
//! Domain types that already serialize in their wire shape (`Booking`,
//! `CatalogEntry`, `User`, `EmployeeProfile`, `NewBooking`) are used
//! directly; this module holds the query and envelope types that only exist
//! at the HTTP boundary.

pub mod booking_dto;
pub mod common_dto;
pub mod employee_dto;
pub mod user_dto;

pub use booking_dto::*;
pub use common_dto::*;
pub use employee_dto::*;
pub use user_dto::*;
