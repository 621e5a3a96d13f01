//! Service layer: business logic orchestration.
//!
//! [`BookingService`] owns the update and trash lifecycle of bookings;
//! [`CatalogService`] manages the service catalog; [`UserService`] keeps
//! accounts and session status; [`EmployeeService`] runs HR profiles. Each
//! consults an [`crate::domain::Authorizer`] before touching storage.

pub mod booking_service;
pub mod catalog_service;
pub mod employee_service;
pub mod user_service;

pub use booking_service::BookingService;
pub use catalog_service::CatalogService;
pub use employee_service::EmployeeService;
pub use user_service::UserService;
