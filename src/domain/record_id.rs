//! Type-safe record identifiers.
//!
//! Each identifier wraps a [`uuid::Uuid`] (v4) in its own type, so a booking
//! identifier cannot be passed where a catalog or user identifier is
//! expected.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Declares a `Copy` UUID newtype with the constructors, conversions, and
/// trait impls every record identifier shares.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "` (UUID v4).")]
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            #[doc = concat!("Creates a `", stringify!($name), "` from an existing [`uuid::Uuid`].")]
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner [`uuid::Uuid`].
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for a booking.
    ///
    /// Generated once at creation time and immutable thereafter. Used as the
    /// key in every [`crate::persistence::BookingStore`].
    BookingId
}

uuid_id! {
    /// Unique identifier for a service catalog entry.
    CatalogEntryId
}

uuid_id! {
    /// Unique identifier for a user account. Its string form is what the
    /// `user-id` header and `Booking::user_id` carry.
    UserId
}
