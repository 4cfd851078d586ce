use std::sync::Arc;

use adoption_sdk::{
    ActorContext, ActorRole, Admin, AdminAction, AdminPermission, ApplicationStatus,
    ConflictKind, ListQuery, NewReview, Page, ReportOutcome, ReportStatus, Review, ReviewReport,
    StatusReceipt, TargetType,
};
use time::OffsetDateTime;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::activity::AdminActivity;
use super::consistency::ConsistencyEngine;
use super::{
    is_owner, paginate, require_active_adopter, require_admin, validate_optional_text,
    validate_text,
};
use crate::domain::error::DomainError;
use crate::domain::lifecycle::{Transition, report_transition};
use crate::domain::repo::{CasOutcome, ReportUpdate, UniqueInsert};

const MAX_CAS_ATTEMPTS: usize = 8;

/// Reviews: one per adopter/breeder pair, soft-deleted by admins.
///
/// Every visibility change recomputes the breeder's review stats. Review
/// reports move `pending -> reviewing -> resolved | dismissed` like breeder
/// reports; only unsettled ones sit in the moderation queue.
pub struct ReviewService {
    engine: Arc<ConsistencyEngine>,
}

impl ReviewService {
    #[must_use]
    pub fn new(engine: Arc<ConsistencyEngine>) -> Self {
        Self { engine }
    }

    /// Requires a consultation or adoption between the pair.
    #[instrument(skip(self, ctx, input), fields(adopter_id = %ctx.actor_id(), breeder_id = %input.breeder_id, rating = input.rating))]
    pub async fn write_review(
        &self,
        ctx: &ActorContext,
        input: NewReview,
    ) -> Result<Review, DomainError> {
        let repos = self.engine.repos();
        let adopter = require_active_adopter(repos.adopters.as_ref(), ctx).await?;

        if !(1..=5).contains(&input.rating) {
            return Err(DomainError::validation(
                "rating",
                "must be between 1 and 5",
            ));
        }
        if input.content.trim().is_empty() {
            return Err(DomainError::validation("content", "must not be empty"));
        }
        validate_text(
            "content",
            &input.content,
            self.engine.config().max_text_length,
        )?;

        if repos.breeders.get(input.breeder_id).await?.is_none() {
            return Err(DomainError::not_found("Breeder", input.breeder_id));
        }
        let interacted = repos
            .applications
            .list_by_adopter(adopter.id)
            .await?
            .iter()
            .any(|a| {
                a.breeder_id == input.breeder_id
                    && matches!(
                        a.status,
                        ApplicationStatus::ConsultationCompleted
                            | ApplicationStatus::AdoptionApproved
                    )
            });
        if !interacted {
            return Err(DomainError::validation(
                "breeder_id",
                "no completed consultation or adoption with this breeder",
            ));
        }

        let review = Review {
            id: Uuid::now_v7(),
            breeder_id: input.breeder_id,
            adopter_id: adopter.id,
            review_type: input.review_type,
            rating: input.rating,
            content: input.content,
            written_at: OffsetDateTime::now_utc(),
            is_visible: true,
            is_reported: false,
            report: None,
        };

        match repos.reviews.insert_unique(review.clone()).await? {
            UniqueInsert::Inserted => {}
            UniqueInsert::Duplicate(existing) => {
                return Err(DomainError::conflict(
                    ConflictKind::Review,
                    format!("review {existing} already exists for this breeder"),
                ));
            }
            UniqueInsert::OwnerMissing => {
                return Err(DomainError::not_found("Breeder", input.breeder_id));
            }
        }

        self.engine.recalculate_review_stats(review.breeder_id).await?;
        info!(review_id = %review.id, "Review written");
        Ok(review)
    }

    /// Flags a review for moderation. Adopters may report any review, a
    /// breeder only reviews written about them.
    ///
    /// While a report is unsettled further reports leave it untouched; a
    /// report on a settled review opens a new pending one.
    #[instrument(skip(self, ctx, reason), fields(actor_id = %ctx.actor_id(), review_id = %review_id))]
    pub async fn report_review(
        &self,
        ctx: &ActorContext,
        review_id: Uuid,
        reason: String,
    ) -> Result<Review, DomainError> {
        let repos = self.engine.repos();
        let review = repos
            .reviews
            .get(review_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Review", review_id))?;

        if ctx.is(ActorRole::Adopter) {
            require_active_adopter(repos.adopters.as_ref(), ctx).await?;
        } else if !is_owner(ctx, ActorRole::Breeder, review.breeder_id) {
            return Err(DomainError::forbidden(
                "only adopters or the reviewed breeder may report a review",
            ));
        }

        if reason.trim().is_empty() {
            return Err(DomainError::validation("reason", "must not be empty"));
        }
        validate_text("reason", &reason, self.engine.config().max_text_length)?;

        let report = ReviewReport::pending(ctx.actor_id(), reason, OffsetDateTime::now_utc());
        let review = repos
            .reviews
            .flag_reported(review_id, report)
            .await?
            .ok_or_else(|| DomainError::not_found("Review", review_id))?;
        info!("Review reported");
        Ok(review)
    }

    #[instrument(skip(self, ctx), fields(admin_id = %ctx.actor_id(), review_id = %review_id))]
    pub async fn start_report_review(
        &self,
        ctx: &ActorContext,
        review_id: Uuid,
    ) -> Result<StatusReceipt<ReportStatus>, DomainError> {
        let repos = self.engine.repos();
        let admin = require_admin(repos.admins.as_ref(), ctx, AdminPermission::ManageReports).await?;
        self.move_report(&admin, review_id, ReportStatus::Reviewing, None)
            .await
    }

    /// Settles the report on a review. Visibility is left alone; taking the
    /// review down is a separate `hide_review` call.
    #[instrument(skip(self, ctx, admin_notes), fields(admin_id = %ctx.actor_id(), review_id = %review_id, ?outcome))]
    pub async fn resolve_report(
        &self,
        ctx: &ActorContext,
        review_id: Uuid,
        outcome: ReportOutcome,
        admin_notes: Option<String>,
    ) -> Result<StatusReceipt<ReportStatus>, DomainError> {
        let repos = self.engine.repos();
        let admin = require_admin(repos.admins.as_ref(), ctx, AdminPermission::ManageReports).await?;
        validate_optional_text(
            "admin_notes",
            admin_notes.as_deref(),
            self.engine.config().max_text_length,
        )?;
        self.move_report(&admin, review_id, outcome.into(), admin_notes)
            .await
    }

    /// Soft-deletes a review. Hiding an already hidden review succeeds and
    /// only re-drives the stats recalculation. An unsettled report on the
    /// review is resolved by the takedown, with `reason` as its admin notes.
    #[instrument(skip(self, ctx, reason), fields(admin_id = %ctx.actor_id(), review_id = %review_id))]
    pub async fn hide_review(
        &self,
        ctx: &ActorContext,
        review_id: Uuid,
        reason: Option<String>,
    ) -> Result<Review, DomainError> {
        let repos = self.engine.repos();
        let admin = require_admin(repos.admins.as_ref(), ctx, AdminPermission::ManageReports).await?;
        validate_optional_text(
            "reason",
            reason.as_deref(),
            self.engine.config().max_text_length,
        )?;

        match repos.reviews.hide(review_id).await? {
            CasOutcome::Updated(mut review) => {
                self.engine.recalculate_review_stats(review.breeder_id).await?;
                if review.report.as_ref().is_some_and(ReviewReport::is_open) {
                    match self
                        .move_report(&admin, review.id, ReportStatus::Resolved, reason.clone())
                        .await
                    {
                        // Settled concurrently with another outcome.
                        Ok(_) | Err(DomainError::Validation { .. }) => {}
                        Err(err) => return Err(err),
                    }
                    if let Some(latest) = repos.reviews.get(review.id).await? {
                        review = latest;
                    }
                }
                let description = reason.map_or_else(
                    || "review hidden".to_owned(),
                    |r| format!("review hidden: {r}"),
                );
                self.engine
                    .log_admin_activity(
                        admin.id,
                        AdminActivity::new(AdminAction::HideReview, TargetType::Review, review.id)
                            .description(description),
                    )
                    .await;
                info!(breeder_id = %review.breeder_id, "Review hidden");
                Ok(review)
            }
            CasOutcome::Stale(review) => {
                self.engine.recalculate_review_stats(review.breeder_id).await?;
                debug!("Review already hidden");
                Ok(review)
            }
            CasOutcome::Missing => Err(DomainError::not_found("Review", review_id)),
        }
    }

    /// Visible reviews of a breeder, newest first.
    ///
    /// Unapproved breeders are hidden from everyone except themselves and admins.
    #[instrument(skip(self, ctx, query), fields(breeder_id = %breeder_id))]
    pub async fn list_breeder_reviews(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
        query: ListQuery,
    ) -> Result<Page<Review>, DomainError> {
        let repos = self.engine.repos();
        let breeder = repos
            .breeders
            .get(breeder_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Breeder", breeder_id))?;
        if !breeder.is_approved()
            && !is_owner(ctx, ActorRole::Breeder, breeder_id)
            && !ctx.is(ActorRole::Admin)
        {
            return Err(DomainError::not_found("Breeder", breeder_id));
        }

        let mut reviews = repos.reviews.list_by_breeder(breeder_id).await?;
        reviews.retain(|r| r.is_visible);
        debug!("Listed {} visible reviews", reviews.len());
        Ok(paginate(reviews, query, self.engine.config()))
    }

    #[instrument(skip(self, ctx, query), fields(admin_id = %ctx.actor_id()))]
    pub async fn list_reported_reviews(
        &self,
        ctx: &ActorContext,
        query: ListQuery,
    ) -> Result<Page<Review>, DomainError> {
        let repos = self.engine.repos();
        require_admin(repos.admins.as_ref(), ctx, AdminPermission::ManageReports).await?;
        let reviews = repos.reviews.list_reported().await?;
        Ok(paginate(reviews, query, self.engine.config()))
    }

    async fn move_report(
        &self,
        admin: &Admin,
        review_id: Uuid,
        to: ReportStatus,
        admin_notes: Option<String>,
    ) -> Result<StatusReceipt<ReportStatus>, DomainError> {
        let repos = self.engine.repos();
        for _ in 0..MAX_CAS_ATTEMPTS {
            let review = repos
                .reviews
                .get(review_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Review", review_id))?;
            let current = review
                .report
                .as_ref()
                .map(|r| r.status)
                .ok_or_else(|| DomainError::not_found("Report", review_id))?;

            if report_transition(current, to)? == Transition::AlreadyApplied {
                debug!(status = %current, "Review report already in requested status");
                return Ok(StatusReceipt {
                    id: review_id,
                    status: current,
                });
            }

            let update = ReportUpdate {
                status: to,
                admin_notes: admin_notes.clone(),
                resolved_at: to.is_terminal().then(OffsetDateTime::now_utc),
            };
            match repos.reviews.update_report(review_id, current, update).await? {
                CasOutcome::Updated(review) => {
                    let action = match to {
                        ReportStatus::Resolved => AdminAction::ResolveReport,
                        ReportStatus::Dismissed => AdminAction::DismissReport,
                        ReportStatus::Pending | ReportStatus::Reviewing => AdminAction::ReviewReport,
                    };
                    self.engine
                        .log_admin_activity(
                            admin.id,
                            AdminActivity::new(action, TargetType::Review, review_id)
                                .description(format!("review report moved from {current} to {to}")),
                        )
                        .await;
                    info!(breeder_id = %review.breeder_id, from = %current, to = %to, "Review report status changed");
                    return Ok(StatusReceipt {
                        id: review_id,
                        status: to,
                    });
                }
                CasOutcome::Stale(_) => debug!("Review report changed concurrently, retrying"),
                CasOutcome::Missing => return Err(DomainError::not_found("Report", review_id)),
            }
        }
        Err(DomainError::Storage(anyhow::anyhow!(
            "report on review {review_id} kept changing during the status update"
        )))
    }
}
