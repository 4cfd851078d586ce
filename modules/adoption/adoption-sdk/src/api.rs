//! `AdoptionApi` trait definition.
//!
//! This trait defines the public API for the adoption module.
//! All methods take an `ActorContext` identifying who performs the operation.

use async_trait::async_trait;
use uuid::Uuid;

use crate::context::ActorContext;
use crate::error::AdoptionError;
use crate::models::{
    AccountStatus, ActivityLogEntry, Application, ApplicationStatus, Breeder, BreederPlan,
    BreederProfile, BreederReportView, BreederStats, FavoriteBreeder, FavoriteBreederView,
    ListQuery, NewApplication, NewReview, Page, PlatformStats, ReportOutcome, ReportReason,
    ReportStatus, Review, StatusReceipt, VerificationDecision, VerificationDocument,
    VerificationStatus,
};

/// Public API trait for the adoption module.
///
/// Every operation returns either a success payload or a typed
/// [`AdoptionError`]; multi-step writes are safe to retry.
#[async_trait]
pub trait AdoptionApi: Send + Sync {
    // --- applications -------------------------------------------------------

    /// Submit an adoption application as the calling adopter.
    ///
    /// # Errors
    ///
    /// * `Validation` - consent missing, pet unavailable, inactive adopter
    /// * `Conflict` - a pending application to this breeder already exists
    async fn submit_application(
        &self,
        ctx: &ActorContext,
        application: NewApplication,
    ) -> Result<StatusReceipt<ApplicationStatus>, AdoptionError>;

    /// Advance an application owned by the calling breeder.
    ///
    /// Re-advancing a terminal application to its current status succeeds
    /// without side effects beyond re-syncing the mirror.
    async fn advance_application(
        &self,
        ctx: &ActorContext,
        application_id: Uuid,
        new_status: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<StatusReceipt<ApplicationStatus>, AdoptionError>;

    /// Admin override of an application's status. Transition rules still apply.
    async fn override_application_status(
        &self,
        ctx: &ActorContext,
        application_id: Uuid,
        new_status: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<StatusReceipt<ApplicationStatus>, AdoptionError>;

    async fn get_application(
        &self,
        ctx: &ActorContext,
        application_id: Uuid,
    ) -> Result<Application, AdoptionError>;

    async fn list_breeder_applications(
        &self,
        ctx: &ActorContext,
        status: Option<ApplicationStatus>,
        query: ListQuery,
    ) -> Result<Page<Application>, AdoptionError>;

    async fn list_adopter_applications(
        &self,
        ctx: &ActorContext,
        query: ListQuery,
    ) -> Result<Page<Application>, AdoptionError>;

    /// Re-project the ledger record into the breeder mirror.
    async fn repair_application_mirror(
        &self,
        ctx: &ActorContext,
        application_id: Uuid,
    ) -> Result<StatusReceipt<ApplicationStatus>, AdoptionError>;

    // --- verification -------------------------------------------------------

    /// Submit verification documents as the calling breeder; moves to `reviewing`.
    async fn submit_verification(
        &self,
        ctx: &ActorContext,
        plan: BreederPlan,
        documents: Vec<VerificationDocument>,
    ) -> Result<StatusReceipt<VerificationStatus>, AdoptionError>;

    async fn decide_verification(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
        decision: VerificationDecision,
    ) -> Result<StatusReceipt<VerificationStatus>, AdoptionError>;

    async fn list_pending_verifications(
        &self,
        ctx: &ActorContext,
        query: ListQuery,
    ) -> Result<Page<Breeder>, AdoptionError>;

    // --- reports ------------------------------------------------------------

    async fn report_breeder(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
        reason: ReportReason,
        description: String,
    ) -> Result<StatusReceipt<ReportStatus>, AdoptionError>;

    async fn start_report_review(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
        report_id: Uuid,
    ) -> Result<StatusReceipt<ReportStatus>, AdoptionError>;

    async fn resolve_report(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
        report_id: Uuid,
        outcome: ReportOutcome,
        admin_notes: Option<String>,
    ) -> Result<StatusReceipt<ReportStatus>, AdoptionError>;

    async fn list_reports(
        &self,
        ctx: &ActorContext,
        status: Option<ReportStatus>,
        query: ListQuery,
    ) -> Result<Page<BreederReportView>, AdoptionError>;

    // --- reviews ------------------------------------------------------------

    async fn write_review(
        &self,
        ctx: &ActorContext,
        review: NewReview,
    ) -> Result<Review, AdoptionError>;

    async fn report_review(
        &self,
        ctx: &ActorContext,
        review_id: Uuid,
        reason: String,
    ) -> Result<Review, AdoptionError>;

    /// Moves a review's report from `pending` to `reviewing`.
    async fn start_review_report(
        &self,
        ctx: &ActorContext,
        review_id: Uuid,
    ) -> Result<StatusReceipt<ReportStatus>, AdoptionError>;

    /// Settles a review's report; settled reports leave the moderation queue.
    async fn resolve_review_report(
        &self,
        ctx: &ActorContext,
        review_id: Uuid,
        outcome: ReportOutcome,
        admin_notes: Option<String>,
    ) -> Result<StatusReceipt<ReportStatus>, AdoptionError>;

    async fn hide_review(
        &self,
        ctx: &ActorContext,
        review_id: Uuid,
        reason: Option<String>,
    ) -> Result<Review, AdoptionError>;

    async fn list_breeder_reviews(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
        query: ListQuery,
    ) -> Result<Page<Review>, AdoptionError>;

    async fn list_reported_reviews(
        &self,
        ctx: &ActorContext,
        query: ListQuery,
    ) -> Result<Page<Review>, AdoptionError>;

    // --- favorites ----------------------------------------------------------

    async fn add_favorite(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
    ) -> Result<FavoriteBreeder, AdoptionError>;

    async fn remove_favorite(&self, ctx: &ActorContext, breeder_id: Uuid)
    -> Result<(), AdoptionError>;

    async fn list_favorites(
        &self,
        ctx: &ActorContext,
        query: ListQuery,
    ) -> Result<Page<FavoriteBreederView>, AdoptionError>;

    // --- profiles and administration ----------------------------------------

    /// Public profile of an approved breeder. Counts a profile view.
    async fn get_public_breeder_profile(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
    ) -> Result<BreederProfile, AdoptionError>;

    async fn set_adopter_account_status(
        &self,
        ctx: &ActorContext,
        adopter_id: Uuid,
        status: AccountStatus,
    ) -> Result<StatusReceipt<AccountStatus>, AdoptionError>;

    /// Recompute a breeder's derived counters from authoritative records.
    async fn reconcile_breeder_stats(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
    ) -> Result<BreederStats, AdoptionError>;

    async fn platform_stats(&self, ctx: &ActorContext) -> Result<PlatformStats, AdoptionError>;

    /// Most recent activity log entries of the calling admin, newest first.
    async fn recent_admin_activity(
        &self,
        ctx: &ActorContext,
    ) -> Result<Vec<ActivityLogEntry>, AdoptionError>;
}
