//! # booking-desk
//!
//! REST backend for service bookings with field-level change history and a
//! two-stage trash lifecycle.
//!
//! Every update is diffed against the stored record; only fields whose
//! value actually changes are written, and each accepted update appends one
//! attributed entry to the booking's history. Deleting is two-stage: a
//! booking is first moved to the trash, from where it can be restored or
//! removed permanently.
//!
//! The same layers also serve the service catalog, user accounts, and
//! employee HR profiles.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers + Actor extractor (api/)
//!     │
//!     ├── Booking / Catalog / User / Employee services (service/)
//!     ├── Authorizer, Clock (domain/)
//!     │
//!     ├── Booking, BookingPatch, ChangeEntry, User, EmployeeProfile (domain/)
//!     │
//!     └── *Store traits: MemoryStore | PostgresStore (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
