//! Adoption SDK
//!
//! This crate provides the public API for the `adoption` module:
//! - `AdoptionApi` trait for inter-module communication
//! - Breeder, Adopter, Admin, Application and Review models
//! - `AdoptionError` for error handling
//! - `ActorContext` describing the caller of an operation
//! - collaborator contracts (`PetAvailabilityLookup`, `FileUrlResolver`)
//!
//! ## Usage
//!
//! ```ignore
//! use adoption_sdk::{ActorContext, AdoptionApi, NewApplication};
//!
//! let ctx = ActorContext::adopter(adopter_id);
//! let receipt = client.submit_application(&ctx, application).await?;
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod collaborators;
pub mod context;
pub mod error;
pub mod models;

pub use api::AdoptionApi;
pub use collaborators::{FileUrlResolver, PetAvailabilityLookup};
pub use context::{ActorContext, ActorRole};
pub use error::{AdoptionError, ConflictKind};
pub use models::{
    AccountStatus, ActivityLogEntry, Admin, AdminAction, AdminPermission, AdminPermissions,
    Adopter, Application, ApplicationStatus, Breeder, BreederPlan, BreederProfile, BreederReport,
    BreederReportView, BreederStats, FavoriteBreeder, FavoriteBreederView, ListQuery,
    NewApplication, NewReview, Page, PetStatus, PlatformStats, ReceivedApplication,
    ReportOutcome, ReportReason, ReportStatus, Review, ReviewReport, ReviewType, StatusReceipt,
    TargetType, Verification, VerificationDecision, VerificationDocument, VerificationStatus,
};
