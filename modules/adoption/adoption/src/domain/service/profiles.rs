use std::collections::BTreeMap;
use std::sync::Arc;

use adoption_sdk::{
    ActivityLogEntry, ActorContext, AdminAction, AdminPermission, ApplicationStatus,
    BreederProfile, BreederStats, FavoriteBreeder, FavoriteBreederView, FileUrlResolver,
    ListQuery, Page, PlatformStats, ReportStatus, TargetType, VerificationStatus,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::activity::AdminActivity;
use super::consistency::ConsistencyEngine;
use super::{paginate, require_admin, require_admin_record, require_adopter};
use crate::domain::error::DomainError;

/// Public breeder profiles, favorites and admin dashboards.
pub struct ProfileService {
    engine: Arc<ConsistencyEngine>,
    files: Arc<dyn FileUrlResolver>,
}

impl ProfileService {
    #[must_use]
    pub fn new(engine: Arc<ConsistencyEngine>, files: Arc<dyn FileUrlResolver>) -> Self {
        Self { engine, files }
    }

    /// Public view of an approved breeder; counts one profile view.
    ///
    /// Unapproved breeders are reported as not found.
    #[instrument(skip(self, _ctx), fields(breeder_id = %breeder_id))]
    pub async fn get_public_profile(
        &self,
        _ctx: &ActorContext,
        breeder_id: Uuid,
    ) -> Result<BreederProfile, DomainError> {
        let breeders = &self.engine.repos().breeders;
        let approved = breeders
            .get(breeder_id)
            .await?
            .is_some_and(|b| b.is_approved());
        if !approved {
            return Err(DomainError::not_found("Breeder", breeder_id));
        }

        let breeder = breeders
            .increment_profile_views(breeder_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Breeder", breeder_id))?;
        debug!(views = breeder.stats.profile_views, "Served public breeder profile");

        Ok(BreederProfile {
            id: breeder.id,
            name: breeder.name,
            profile_image_url: breeder.profile_image.map(|key| self.files.resolve(&key)),
            location: breeder.location,
            plan: breeder.verification.plan,
            stats: breeder.stats,
        })
    }

    #[instrument(skip(self, ctx), fields(adopter_id = %ctx.actor_id(), breeder_id = %breeder_id))]
    pub async fn add_favorite(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
    ) -> Result<FavoriteBreeder, DomainError> {
        let adopter = require_adopter(self.engine.repos().adopters.as_ref(), ctx).await?;
        self.engine.add_favorite(adopter.id, breeder_id).await
    }

    #[instrument(skip(self, ctx), fields(adopter_id = %ctx.actor_id(), breeder_id = %breeder_id))]
    pub async fn remove_favorite(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
    ) -> Result<(), DomainError> {
        let adopter = require_adopter(self.engine.repos().adopters.as_ref(), ctx).await?;
        self.engine.remove_favorite(adopter.id, breeder_id).await
    }

    /// Favorites, most recently added first, with image keys resolved to URLs.
    #[instrument(skip(self, ctx, query), fields(adopter_id = %ctx.actor_id()))]
    pub async fn list_favorites(
        &self,
        ctx: &ActorContext,
        query: ListQuery,
    ) -> Result<Page<FavoriteBreederView>, DomainError> {
        let adopter = require_adopter(self.engine.repos().adopters.as_ref(), ctx).await?;
        let views: Vec<FavoriteBreederView> = adopter
            .favorite_breeders
            .into_iter()
            .rev()
            .map(|f| FavoriteBreederView {
                breeder_id: f.breeder_id,
                breeder_name: f.breeder_name,
                profile_image_url: f.profile_image.map(|key| self.files.resolve(&key)),
                location: f.location,
                added_at: f.added_at,
            })
            .collect();
        Ok(paginate(views, query, self.engine.config()))
    }

    #[instrument(skip(self, ctx), fields(admin_id = %ctx.actor_id()))]
    pub async fn platform_stats(&self, ctx: &ActorContext) -> Result<PlatformStats, DomainError> {
        let repos = self.engine.repos();
        require_admin(repos.admins.as_ref(), ctx, AdminPermission::ManageStatistics).await?;

        let breeders = repos.breeders.list(None).await?;
        let mut breeders_by_verification: BTreeMap<String, usize> = VerificationStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_owned(), 0))
            .collect();
        let mut pending_reports = 0;
        for breeder in &breeders {
            *breeders_by_verification
                .entry(breeder.verification.status.as_str().to_owned())
                .or_default() += 1;
            pending_reports += breeder
                .reports
                .iter()
                .filter(|r| r.status == ReportStatus::Pending)
                .count();
        }

        let counts = repos.applications.status_counts().await?;
        let applications_by_status = ApplicationStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_owned(), counts.get(s).copied().unwrap_or(0)))
            .collect();

        let stats = PlatformStats {
            breeders_by_verification,
            applications_by_status,
            pending_reports,
            reported_reviews: repos.reviews.list_reported().await?.len(),
            hidden_reviews: repos.reviews.count_hidden().await?,
        };
        debug!(?stats, "Computed platform stats");
        Ok(stats)
    }

    /// Rebuilds a breeder's derived counters and mirror from authoritative records.
    #[instrument(skip(self, ctx), fields(admin_id = %ctx.actor_id(), breeder_id = %breeder_id))]
    pub async fn reconcile_breeder_stats(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
    ) -> Result<BreederStats, DomainError> {
        let admin = require_admin(
            self.engine.repos().admins.as_ref(),
            ctx,
            AdminPermission::ManageStatistics,
        )
        .await?;
        let stats = self.engine.reconcile_breeder_stats(breeder_id).await?;

        self.engine
            .log_admin_activity(
                admin.id,
                AdminActivity::new(AdminAction::ReconcileStats, TargetType::Breeder, breeder_id)
                    .description(format!(
                        "{} applications, {} completed adoptions, {} visible reviews",
                        stats.total_applications, stats.completed_adoptions, stats.total_reviews
                    )),
            )
            .await;
        info!("Breeder stats reconciled");
        Ok(stats)
    }

    #[instrument(skip(self, ctx), fields(admin_id = %ctx.actor_id()))]
    pub async fn recent_admin_activity(
        &self,
        ctx: &ActorContext,
    ) -> Result<Vec<ActivityLogEntry>, DomainError> {
        let admin = require_admin_record(self.engine.repos().admins.as_ref(), ctx).await?;
        self.engine.recent_admin_activity(admin.id).await
    }
}
