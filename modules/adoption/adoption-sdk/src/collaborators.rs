//! Contracts for collaborators the adoption engine consumes but does not own.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::PetStatus;

/// Read-only pet catalog lookup used when an application names a pet.
#[async_trait]
pub trait PetAvailabilityLookup: Send + Sync {
    /// Returns the pet's current status, or `None` if the breeder has no such pet.
    async fn pet_status(&self, breeder_id: Uuid, pet_id: Uuid) -> anyhow::Result<Option<PetStatus>>;
}

/// Turns a stored file key into a time-limited retrieval URL.
///
/// Persisted records only ever hold the key.
pub trait FileUrlResolver: Send + Sync {
    fn resolve(&self, file_key: &str) -> String;
}
