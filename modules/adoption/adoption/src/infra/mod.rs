pub mod storage;

pub use storage::{InMemoryStore, in_memory_repositories};
