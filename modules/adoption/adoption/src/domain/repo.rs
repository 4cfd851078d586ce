//! Repository traits for the adoption aggregates.
//!
//! These traits define the storage interface used by the domain services.
//! Aggregates are mutated through targeted field-level operations (counter
//! increments, element push/replace/remove) rather than whole-document
//! replacement, so concurrent writers touching different sub-fields of the
//! same aggregate do not lose each other's updates.

use std::collections::HashMap;
use std::sync::Arc;

use adoption_sdk::{
    AccountStatus, ActivityLogEntry, Admin, Adopter, Application, ApplicationStatus, Breeder,
    BreederReport, FavoriteBreeder, ReceivedApplication, ReportStatus, Review, ReviewReport,
    Verification, VerificationStatus,
};
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

/// Result of a compare-and-set write against an expected current state.
#[derive(Debug, Clone, PartialEq)]
pub enum CasOutcome<T> {
    /// The expected state matched and the write was applied.
    Updated(T),
    /// The record exists but is no longer in the expected state; carries the current value.
    Stale(T),
    /// The record does not exist.
    Missing,
}

/// Result of an insert guarded by a uniqueness key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueInsert {
    Inserted,
    /// Another record already holds the key; carries its id.
    Duplicate(Uuid),
    /// The owning aggregate does not exist.
    OwnerMissing,
}

/// Result of counting an application on a breeder counter keyed by application id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterUpdate {
    Counted,
    AlreadyCounted,
    Missing,
}

/// Write generations of a breeder's derived stats.
///
/// `counters` moves on every application counter write, `reviews` on every
/// review stats write. A recompute reads the generation first and commits
/// only if it has not moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsRevision {
    pub counters: u64,
    pub reviews: u64,
}

/// Field-level update applied to a breeder report or a review report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportUpdate {
    pub status: ReportStatus,
    pub admin_notes: Option<String>,
    pub resolved_at: Option<OffsetDateTime>,
}

#[async_trait]
pub trait BreederRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Breeder>>;

    async fn insert(&self, breeder: Breeder) -> anyhow::Result<()>;

    /// Lists breeders, optionally restricted to one verification status.
    async fn list(&self, status: Option<VerificationStatus>) -> anyhow::Result<Vec<Breeder>>;

    /// Replaces the verification block if its status still equals `expected`.
    async fn set_verification(
        &self,
        id: Uuid,
        expected: VerificationStatus,
        verification: Verification,
    ) -> anyhow::Result<CasOutcome<Verification>>;

    /// Inserts or replaces the mirror entry matched by `application_id`.
    /// An entry never moves back to an earlier lifecycle stage.
    ///
    /// Returns `false` if the breeder does not exist.
    async fn upsert_received_application(
        &self,
        id: Uuid,
        entry: ReceivedApplication,
    ) -> anyhow::Result<bool>;

    async fn stats_revision(&self, id: Uuid) -> anyhow::Result<Option<StatsRevision>>;

    /// Counts one received application keyed by application id.
    async fn record_received_application(
        &self,
        id: Uuid,
        application_id: Uuid,
    ) -> anyhow::Result<CounterUpdate>;

    /// Counts one completed adoption keyed by application id.
    async fn record_completed_adoption(
        &self,
        id: Uuid,
        application_id: Uuid,
    ) -> anyhow::Result<CounterUpdate>;

    /// Replaces both application counters with sets recomputed from the
    /// ledger if the counters generation still equals `expected_revision`.
    ///
    /// `Updated` and `Stale` carry the current counters generation.
    async fn reset_application_counters(
        &self,
        id: Uuid,
        expected_revision: u64,
        application_ids: Vec<Uuid>,
        completed_application_ids: Vec<Uuid>,
    ) -> anyhow::Result<CasOutcome<u64>>;

    /// Writes the review stats if the reviews generation still equals
    /// `expected_revision`.
    async fn set_review_stats(
        &self,
        id: Uuid,
        expected_revision: u64,
        average_rating: f64,
        total_reviews: u64,
    ) -> anyhow::Result<CasOutcome<u64>>;

    /// Increments the profile view counter and returns the updated breeder.
    async fn increment_profile_views(&self, id: Uuid) -> anyhow::Result<Option<Breeder>>;

    async fn push_report(&self, id: Uuid, report: BreederReport) -> anyhow::Result<bool>;

    /// Updates an embedded report if its status still equals `expected`.
    async fn update_report(
        &self,
        id: Uuid,
        report_id: Uuid,
        expected: ReportStatus,
        update: ReportUpdate,
    ) -> anyhow::Result<CasOutcome<BreederReport>>;
}

#[async_trait]
pub trait AdopterRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Adopter>>;

    async fn insert(&self, adopter: Adopter) -> anyhow::Result<()>;

    async fn set_account_status(&self, id: Uuid, status: AccountStatus) -> anyhow::Result<bool>;

    /// Pushes a favorite unless one for the same breeder is already present.
    async fn add_favorite(
        &self,
        id: Uuid,
        favorite: FavoriteBreeder,
    ) -> anyhow::Result<UniqueInsert>;

    /// Pulls the favorite for `breeder_id`; returns `false` if none was present.
    async fn remove_favorite(&self, id: Uuid, breeder_id: Uuid) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Admin>>;

    async fn insert(&self, admin: Admin) -> anyhow::Result<()>;

    /// Appends one activity entry; returns `false` if the admin does not exist.
    async fn append_activity(&self, id: Uuid, entry: ActivityLogEntry) -> anyhow::Result<bool>;

    /// Returns the newest `limit` entries, newest first.
    async fn recent_activity(
        &self,
        id: Uuid,
        limit: usize,
    ) -> anyhow::Result<Option<Vec<ActivityLogEntry>>>;
}

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Application>>;

    /// Inserts a `consultation_pending` application, atomically refusing a
    /// second pending application for the same adopter/breeder pair.
    async fn insert_unique_pending(&self, application: Application)
    -> anyhow::Result<UniqueInsert>;

    /// Inserts without any uniqueness guard.
    async fn insert(&self, application: Application) -> anyhow::Result<()>;

    async fn find_pending(
        &self,
        adopter_id: Uuid,
        breeder_id: Uuid,
    ) -> anyhow::Result<Option<Application>>;

    /// Writes a new status if the current status still equals `expected`.
    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: ApplicationStatus,
        status: ApplicationStatus,
        processed_at: OffsetDateTime,
        notes: Option<String>,
    ) -> anyhow::Result<CasOutcome<Application>>;

    /// All applications addressed to a breeder, newest first.
    async fn list_by_breeder(&self, breeder_id: Uuid) -> anyhow::Result<Vec<Application>>;

    /// All applications submitted by an adopter, newest first.
    async fn list_by_adopter(&self, adopter_id: Uuid) -> anyhow::Result<Vec<Application>>;

    async fn status_counts(&self) -> anyhow::Result<HashMap<ApplicationStatus, usize>>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Review>>;

    /// Inserts a review, refusing a second review for the same adopter/breeder pair.
    async fn insert_unique(&self, review: Review) -> anyhow::Result<UniqueInsert>;

    /// Clears `is_visible`. `Stale` means the review was already hidden.
    async fn hide(&self, id: Uuid) -> anyhow::Result<CasOutcome<Review>>;

    /// Opens a pending report on the review. A report that is still pending
    /// or under review is kept as is; a settled one is replaced.
    async fn flag_reported(
        &self,
        id: Uuid,
        report: ReviewReport,
    ) -> anyhow::Result<Option<Review>>;

    /// Updates the review's report if its status still equals `expected`.
    /// `Missing` covers both an unknown review and a review never reported.
    async fn update_report(
        &self,
        id: Uuid,
        expected: ReportStatus,
        update: ReportUpdate,
    ) -> anyhow::Result<CasOutcome<Review>>;

    /// All reviews of a breeder (visible and hidden), newest first.
    async fn list_by_breeder(&self, breeder_id: Uuid) -> anyhow::Result<Vec<Review>>;

    /// Reviews whose report is pending or under review, newest report first.
    async fn list_reported(&self) -> anyhow::Result<Vec<Review>>;

    async fn count_hidden(&self) -> anyhow::Result<usize>;
}

/// The set of repositories the adoption services operate on.
#[derive(Clone)]
pub struct Repositories {
    pub breeders: Arc<dyn BreederRepository>,
    pub adopters: Arc<dyn AdopterRepository>,
    pub admins: Arc<dyn AdminRepository>,
    pub applications: Arc<dyn ApplicationRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
}
