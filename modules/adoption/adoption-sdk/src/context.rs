//! Request identity handed to every adoption operation.

use std::fmt;

use uuid::Uuid;

/// Role of the actor performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorRole {
    Adopter,
    Breeder,
    Admin,
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Adopter => "adopter",
            Self::Breeder => "breeder",
            Self::Admin => "admin",
        })
    }
}

/// `ActorContext` carries the resolved `{actorId, actorRole}` of a request.
///
/// The engine trusts the pair as given and re-validates role-specific
/// permission flags against the stored aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorContext {
    actor_id: Uuid,
    role: ActorRole,
}

impl ActorContext {
    #[must_use]
    pub const fn new(actor_id: Uuid, role: ActorRole) -> Self {
        Self { actor_id, role }
    }

    #[must_use]
    pub const fn adopter(actor_id: Uuid) -> Self {
        Self::new(actor_id, ActorRole::Adopter)
    }

    #[must_use]
    pub const fn breeder(actor_id: Uuid) -> Self {
        Self::new(actor_id, ActorRole::Breeder)
    }

    #[must_use]
    pub const fn admin(actor_id: Uuid) -> Self {
        Self::new(actor_id, ActorRole::Admin)
    }

    #[must_use]
    pub const fn actor_id(&self) -> Uuid {
        self.actor_id
    }

    #[must_use]
    pub const fn role(&self) -> ActorRole {
        self.role
    }

    #[must_use]
    pub fn is(&self, role: ActorRole) -> bool {
        self.role == role
    }
}
