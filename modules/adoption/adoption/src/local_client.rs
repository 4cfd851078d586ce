//! Local client implementing the `AdoptionApi` trait.

use std::sync::Arc;

use adoption_sdk::{
    AccountStatus, ActivityLogEntry, ActorContext, AdoptionApi, AdoptionError, Application,
    ApplicationStatus, Breeder, BreederPlan, BreederProfile, BreederReportView, BreederStats,
    FavoriteBreeder, FavoriteBreederView, ListQuery, NewApplication, NewReview, Page,
    PlatformStats, ReportOutcome, ReportReason, ReportStatus, Review, StatusReceipt,
    VerificationDecision, VerificationDocument, VerificationStatus,
};
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::service::AdoptionService;

/// Local client for the adoption module.
///
/// Delegates to the domain services and maps domain errors to
/// [`AdoptionError`].
pub struct AdoptionLocalClient {
    service: Arc<AdoptionService>,
}

impl AdoptionLocalClient {
    #[must_use]
    pub fn new(service: Arc<AdoptionService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AdoptionApi for AdoptionLocalClient {
    async fn submit_application(
        &self,
        ctx: &ActorContext,
        application: NewApplication,
    ) -> Result<StatusReceipt<ApplicationStatus>, AdoptionError> {
        self.service
            .applications
            .submit(ctx, application)
            .await
            .map_err(Into::into)
    }

    async fn advance_application(
        &self,
        ctx: &ActorContext,
        application_id: Uuid,
        new_status: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<StatusReceipt<ApplicationStatus>, AdoptionError> {
        self.service
            .applications
            .advance(ctx, application_id, new_status, notes)
            .await
            .map_err(Into::into)
    }

    async fn override_application_status(
        &self,
        ctx: &ActorContext,
        application_id: Uuid,
        new_status: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<StatusReceipt<ApplicationStatus>, AdoptionError> {
        self.service
            .applications
            .override_status(ctx, application_id, new_status, notes)
            .await
            .map_err(Into::into)
    }

    async fn get_application(
        &self,
        ctx: &ActorContext,
        application_id: Uuid,
    ) -> Result<Application, AdoptionError> {
        self.service
            .applications
            .get(ctx, application_id)
            .await
            .map_err(Into::into)
    }

    async fn list_breeder_applications(
        &self,
        ctx: &ActorContext,
        status: Option<ApplicationStatus>,
        query: ListQuery,
    ) -> Result<Page<Application>, AdoptionError> {
        self.service
            .applications
            .list_for_breeder(ctx, status, query)
            .await
            .map_err(Into::into)
    }

    async fn list_adopter_applications(
        &self,
        ctx: &ActorContext,
        query: ListQuery,
    ) -> Result<Page<Application>, AdoptionError> {
        self.service
            .applications
            .list_for_adopter(ctx, query)
            .await
            .map_err(Into::into)
    }

    async fn repair_application_mirror(
        &self,
        ctx: &ActorContext,
        application_id: Uuid,
    ) -> Result<StatusReceipt<ApplicationStatus>, AdoptionError> {
        self.service
            .applications
            .repair_mirror(ctx, application_id)
            .await
            .map_err(Into::into)
    }

    async fn submit_verification(
        &self,
        ctx: &ActorContext,
        plan: BreederPlan,
        documents: Vec<VerificationDocument>,
    ) -> Result<StatusReceipt<VerificationStatus>, AdoptionError> {
        self.service
            .moderation
            .submit_verification(ctx, plan, documents)
            .await
            .map_err(Into::into)
    }

    async fn decide_verification(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
        decision: VerificationDecision,
    ) -> Result<StatusReceipt<VerificationStatus>, AdoptionError> {
        self.service
            .moderation
            .decide_verification(ctx, breeder_id, decision)
            .await
            .map_err(Into::into)
    }

    async fn list_pending_verifications(
        &self,
        ctx: &ActorContext,
        query: ListQuery,
    ) -> Result<Page<Breeder>, AdoptionError> {
        self.service
            .moderation
            .list_pending_verifications(ctx, query)
            .await
            .map_err(Into::into)
    }

    async fn report_breeder(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
        reason: ReportReason,
        description: String,
    ) -> Result<StatusReceipt<ReportStatus>, AdoptionError> {
        self.service
            .moderation
            .report_breeder(ctx, breeder_id, reason, description)
            .await
            .map_err(Into::into)
    }

    async fn start_report_review(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
        report_id: Uuid,
    ) -> Result<StatusReceipt<ReportStatus>, AdoptionError> {
        self.service
            .moderation
            .start_report_review(ctx, breeder_id, report_id)
            .await
            .map_err(Into::into)
    }

    async fn resolve_report(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
        report_id: Uuid,
        outcome: ReportOutcome,
        admin_notes: Option<String>,
    ) -> Result<StatusReceipt<ReportStatus>, AdoptionError> {
        self.service
            .moderation
            .resolve_report(ctx, breeder_id, report_id, outcome, admin_notes)
            .await
            .map_err(Into::into)
    }

    async fn list_reports(
        &self,
        ctx: &ActorContext,
        status: Option<ReportStatus>,
        query: ListQuery,
    ) -> Result<Page<BreederReportView>, AdoptionError> {
        self.service
            .moderation
            .list_reports(ctx, status, query)
            .await
            .map_err(Into::into)
    }

    async fn write_review(
        &self,
        ctx: &ActorContext,
        review: NewReview,
    ) -> Result<Review, AdoptionError> {
        self.service
            .reviews
            .write_review(ctx, review)
            .await
            .map_err(Into::into)
    }

    async fn report_review(
        &self,
        ctx: &ActorContext,
        review_id: Uuid,
        reason: String,
    ) -> Result<Review, AdoptionError> {
        self.service
            .reviews
            .report_review(ctx, review_id, reason)
            .await
            .map_err(Into::into)
    }

    async fn start_review_report(
        &self,
        ctx: &ActorContext,
        review_id: Uuid,
    ) -> Result<StatusReceipt<ReportStatus>, AdoptionError> {
        self.service
            .reviews
            .start_report_review(ctx, review_id)
            .await
            .map_err(Into::into)
    }

    async fn resolve_review_report(
        &self,
        ctx: &ActorContext,
        review_id: Uuid,
        outcome: ReportOutcome,
        admin_notes: Option<String>,
    ) -> Result<StatusReceipt<ReportStatus>, AdoptionError> {
        self.service
            .reviews
            .resolve_report(ctx, review_id, outcome, admin_notes)
            .await
            .map_err(Into::into)
    }

    async fn hide_review(
        &self,
        ctx: &ActorContext,
        review_id: Uuid,
        reason: Option<String>,
    ) -> Result<Review, AdoptionError> {
        self.service
            .reviews
            .hide_review(ctx, review_id, reason)
            .await
            .map_err(Into::into)
    }

    async fn list_breeder_reviews(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
        query: ListQuery,
    ) -> Result<Page<Review>, AdoptionError> {
        self.service
            .reviews
            .list_breeder_reviews(ctx, breeder_id, query)
            .await
            .map_err(Into::into)
    }

    async fn list_reported_reviews(
        &self,
        ctx: &ActorContext,
        query: ListQuery,
    ) -> Result<Page<Review>, AdoptionError> {
        self.service
            .reviews
            .list_reported_reviews(ctx, query)
            .await
            .map_err(Into::into)
    }

    async fn add_favorite(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
    ) -> Result<FavoriteBreeder, AdoptionError> {
        self.service
            .profiles
            .add_favorite(ctx, breeder_id)
            .await
            .map_err(Into::into)
    }

    async fn remove_favorite(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
    ) -> Result<(), AdoptionError> {
        self.service
            .profiles
            .remove_favorite(ctx, breeder_id)
            .await
            .map_err(Into::into)
    }

    async fn list_favorites(
        &self,
        ctx: &ActorContext,
        query: ListQuery,
    ) -> Result<Page<FavoriteBreederView>, AdoptionError> {
        self.service
            .profiles
            .list_favorites(ctx, query)
            .await
            .map_err(Into::into)
    }

    async fn get_public_breeder_profile(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
    ) -> Result<BreederProfile, AdoptionError> {
        self.service
            .profiles
            .get_public_profile(ctx, breeder_id)
            .await
            .map_err(Into::into)
    }

    async fn set_adopter_account_status(
        &self,
        ctx: &ActorContext,
        adopter_id: Uuid,
        status: AccountStatus,
    ) -> Result<StatusReceipt<AccountStatus>, AdoptionError> {
        self.service
            .moderation
            .set_adopter_account_status(ctx, adopter_id, status)
            .await
            .map_err(Into::into)
    }

    async fn reconcile_breeder_stats(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
    ) -> Result<BreederStats, AdoptionError> {
        self.service
            .profiles
            .reconcile_breeder_stats(ctx, breeder_id)
            .await
            .map_err(Into::into)
    }

    async fn platform_stats(&self, ctx: &ActorContext) -> Result<PlatformStats, AdoptionError> {
        self.service
            .profiles
            .platform_stats(ctx)
            .await
            .map_err(Into::into)
    }

    async fn recent_admin_activity(
        &self,
        ctx: &ActorContext,
    ) -> Result<Vec<ActivityLogEntry>, AdoptionError> {
        self.service
            .profiles
            .recent_admin_activity(ctx)
            .await
            .map_err(Into::into)
    }
}
