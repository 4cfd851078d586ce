//! Adoption Module Implementation
//!
//! The public API is defined in `adoption-sdk` and re-exported here.

pub use adoption_sdk::{ActorContext, AdoptionApi, AdoptionError};

pub mod local_client;
pub use local_client::AdoptionLocalClient;

#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
