//! # Identity Newtypes
//!
//! Newtype wrappers for every identifier in the booking domain. These prevent
//! accidental identifier confusion: a `SalonId` cannot be passed where a
//! `HairdresserId` is expected, even though both wrap a UUID.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_newtype {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_newtype!(
    /// Unique identifier for a booking.
    BookingId,
    "booking"
);

uuid_newtype!(
    /// Identifier of a registered client. Guests have no client id.
    ClientId,
    "client"
);

uuid_newtype!(
    /// Identifier of a hairdresser profile.
    HairdresserId,
    "hairdresser"
);

uuid_newtype!(
    /// Identifier of a salon.
    SalonId,
    "salon"
);

uuid_newtype!(
    /// Identifier of a hairstyle in the service catalog.
    HairstyleId,
    "hairstyle"
);

uuid_newtype!(
    /// Identifier of a user account, owned by the auth collaborator.
    UserId,
    "user"
);
