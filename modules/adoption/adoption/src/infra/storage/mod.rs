use std::sync::Arc;

use crate::domain::repo::Repositories;

pub mod in_memory_repo;

pub use in_memory_repo::InMemoryStore;

/// Exposes one in-memory store through every repository trait.
#[must_use]
pub fn in_memory_repositories(store: &Arc<InMemoryStore>) -> Repositories {
    Repositories {
        breeders: store.clone(),
        adopters: store.clone(),
        admins: store.clone(),
        applications: store.clone(),
        reviews: store.clone(),
    }
}
