//! # Actors
//!
//! The authenticated caller of a booking operation. Credentials are handled
//! upstream; this crate only sees the resulting id and role.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use salonbook_core::{ClientId, HairdresserId};

/// Role of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// A client who books services.
    Client,
    /// A hairdresser who accepts and performs bookings.
    Hairdresser,
    /// Platform administrator.
    Admin,
    /// Background tasks such as the expiry sweep.
    System,
}

impl ActorRole {
    /// All roles.
    pub const ALL: [ActorRole; 4] = [
        ActorRole::Client,
        ActorRole::Hairdresser,
        ActorRole::Admin,
        ActorRole::System,
    ];

    /// The canonical string name of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Hairdresser => "hairdresser",
            Self::Admin => "admin",
            Self::System => "system",
        }
    }

    /// Parse a canonical role name. Case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "client" => Some(Self::Client),
            "hairdresser" => Some(Self::Hairdresser),
            "admin" => Some(Self::Admin),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated caller.
///
/// For the hairdresser role `id` is the [`HairdresserId`]; for the client
/// role it is the [`ClientId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    /// Identifier of the caller within its role.
    pub id: Uuid,
    /// The caller's role.
    pub role: ActorRole,
}

impl Actor {
    /// Build an actor from a raw id and role.
    pub fn new(id: Uuid, role: ActorRole) -> Self {
        Self { id, role }
    }

    /// A client actor.
    pub fn client(id: ClientId) -> Self {
        Self::new(id.0, ActorRole::Client)
    }

    /// A hairdresser actor.
    pub fn hairdresser(id: HairdresserId) -> Self {
        Self::new(id.0, ActorRole::Hairdresser)
    }

    /// An administrator.
    pub fn admin(id: Uuid) -> Self {
        Self::new(id, ActorRole::Admin)
    }

    /// The background system actor.
    pub fn system() -> Self {
        Self::new(Uuid::nil(), ActorRole::System)
    }

    /// The hairdresser id, when acting as a hairdresser.
    pub fn hairdresser_id(&self) -> Option<HairdresserId> {
        (self.role == ActorRole::Hairdresser).then(|| HairdresserId(self.id))
    }

    /// The client id, when acting as a client.
    pub fn client_id(&self) -> Option<ClientId> {
        (self.role == ActorRole::Client).then(|| ClientId(self.id))
    }

    /// Admin or system.
    pub fn is_privileged(&self) -> bool {
        matches!(self.role, ActorRole::Admin | ActorRole::System)
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.role, self.id)
    }
}
