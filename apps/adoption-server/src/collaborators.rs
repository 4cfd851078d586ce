//! Host-side implementations of the collaborators the engine consumes.

use adoption_sdk::{FileUrlResolver, PetAvailabilityLookup, PetStatus};
use async_trait::async_trait;
use uuid::Uuid;

/// Renders a file key as `<base_url>/<key>`.
pub struct BaseUrlFileResolver {
    base_url: String,
}

impl BaseUrlFileResolver {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

impl FileUrlResolver for BaseUrlFileResolver {
    fn resolve(&self, file_key: &str) -> String {
        format!("{}/{}", self.base_url, file_key.trim_start_matches('/'))
    }
}

/// Catalog used when no pet service is attached: every pet reads as available.
pub struct OpenPetCatalog;

#[async_trait]
impl PetAvailabilityLookup for OpenPetCatalog {
    async fn pet_status(&self, _breeder_id: Uuid, _pet_id: Uuid) -> anyhow::Result<Option<PetStatus>> {
        Ok(Some(PetStatus::Available))
    }
}
