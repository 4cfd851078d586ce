//! Breeder verification, breeder reports and adopter account moderation.
//!
//! Terminal moves are admin-only and re-check the admin's permission flags
//! against the stored admin record before touching any state.

use std::sync::Arc;

use adoption_sdk::{
    AccountStatus, ActorContext, ActorRole, Admin, AdminAction, AdminPermission, Breeder,
    BreederPlan, BreederReport, BreederReportView, ListQuery, Page, ReportOutcome, ReportReason,
    ReportStatus, StatusReceipt, TargetType, Verification, VerificationDecision,
    VerificationDocument, VerificationStatus,
};
use time::OffsetDateTime;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::activity::AdminActivity;
use super::consistency::ConsistencyEngine;
use super::{
    paginate, require_active_adopter, require_admin, require_role, validate_optional_text,
    validate_text,
};
use crate::domain::error::DomainError;
use crate::domain::lifecycle::{
    Transition, report_transition, verification_decision, verification_submission,
};
use crate::domain::repo::{CasOutcome, ReportUpdate};

const MAX_CAS_ATTEMPTS: usize = 8;

pub struct ModerationService {
    engine: Arc<ConsistencyEngine>,
}

impl ModerationService {
    #[must_use]
    pub fn new(engine: Arc<ConsistencyEngine>) -> Self {
        Self { engine }
    }

    // --- verification -------------------------------------------------------

    /// Breeder submits (or re-submits after rejection) verification documents.
    /// The request moves straight to `reviewing`.
    #[instrument(skip(self, ctx, documents), fields(breeder_id = %ctx.actor_id(), ?plan, documents = documents.len()))]
    pub async fn submit_verification(
        &self,
        ctx: &ActorContext,
        plan: BreederPlan,
        documents: Vec<VerificationDocument>,
    ) -> Result<StatusReceipt<VerificationStatus>, DomainError> {
        require_role(ctx, ActorRole::Breeder)?;
        if documents.is_empty() {
            return Err(DomainError::validation(
                "documents",
                "at least one document is required",
            ));
        }
        if documents
            .iter()
            .any(|d| d.kind.trim().is_empty() || d.file_key.trim().is_empty())
        {
            return Err(DomainError::validation(
                "documents",
                "every document needs a kind and a file key",
            ));
        }

        let breeder_id = ctx.actor_id();
        for _ in 0..MAX_CAS_ATTEMPTS {
            let breeder = self.load_breeder(breeder_id).await?;
            let current = breeder.verification.status;
            verification_submission(current)?;

            let verification = Verification {
                status: VerificationStatus::Reviewing,
                plan,
                documents: documents.clone(),
                submitted_at: Some(OffsetDateTime::now_utc()),
                reviewed_at: None,
                rejection_reason: None,
            };
            match self
                .engine
                .repos()
                .breeders
                .set_verification(breeder_id, current, verification)
                .await?
            {
                CasOutcome::Updated(v) => {
                    info!(from = %current, "Verification submitted");
                    return Ok(StatusReceipt {
                        id: breeder_id,
                        status: v.status,
                    });
                }
                CasOutcome::Stale(_) => debug!("Verification changed concurrently, retrying"),
                CasOutcome::Missing => return Err(DomainError::not_found("Breeder", breeder_id)),
            }
        }
        Err(Self::contended("verification", breeder_id))
    }

    #[instrument(skip(self, ctx, decision), fields(admin_id = %ctx.actor_id(), breeder_id = %breeder_id))]
    pub async fn decide_verification(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
        decision: VerificationDecision,
    ) -> Result<StatusReceipt<VerificationStatus>, DomainError> {
        let admin = self.admin(ctx, AdminPermission::ManageBreeders).await?;
        let (target, reason) = match decision {
            VerificationDecision::Approve => (VerificationStatus::Approved, None),
            VerificationDecision::Reject { reason } => (VerificationStatus::Rejected, reason),
        };
        validate_optional_text(
            "rejection_reason",
            reason.as_deref(),
            self.engine.config().max_text_length,
        )?;

        for _ in 0..MAX_CAS_ATTEMPTS {
            let breeder = self.load_breeder(breeder_id).await?;
            let current = breeder.verification.status;
            if verification_decision(current, target)? == Transition::AlreadyApplied {
                debug!(status = %current, "Verification already decided");
                return Ok(StatusReceipt {
                    id: breeder_id,
                    status: current,
                });
            }

            let verification = Verification {
                status: target,
                reviewed_at: Some(OffsetDateTime::now_utc()),
                rejection_reason: reason.clone(),
                ..breeder.verification
            };
            match self
                .engine
                .repos()
                .breeders
                .set_verification(breeder_id, current, verification)
                .await?
            {
                CasOutcome::Updated(v) => {
                    let action = if target == VerificationStatus::Approved {
                        AdminAction::ApproveBreeder
                    } else {
                        AdminAction::RejectBreeder
                    };
                    let description = match &reason {
                        Some(reason) => format!("verification {target}: {reason}"),
                        None => format!("verification {target}"),
                    };
                    self.engine
                        .log_admin_activity(
                            admin.id,
                            AdminActivity::new(action, TargetType::Breeder, breeder_id)
                                .target_name(breeder.name)
                                .description(description),
                        )
                        .await;
                    info!(status = %v.status, "Verification decided");
                    return Ok(StatusReceipt {
                        id: breeder_id,
                        status: v.status,
                    });
                }
                CasOutcome::Stale(_) => debug!("Verification changed concurrently, retrying"),
                CasOutcome::Missing => return Err(DomainError::not_found("Breeder", breeder_id)),
            }
        }
        Err(Self::contended("verification", breeder_id))
    }

    /// Breeders whose verification awaits an admin decision, oldest submission first.
    #[instrument(skip(self, ctx, query), fields(admin_id = %ctx.actor_id()))]
    pub async fn list_pending_verifications(
        &self,
        ctx: &ActorContext,
        query: ListQuery,
    ) -> Result<Page<Breeder>, DomainError> {
        self.admin(ctx, AdminPermission::ManageBreeders).await?;
        let breeders = self
            .engine
            .repos()
            .breeders
            .list(Some(VerificationStatus::Reviewing))
            .await?;
        Ok(paginate(breeders, query, self.engine.config()))
    }

    // --- breeder reports ----------------------------------------------------

    #[instrument(skip(self, ctx, description), fields(adopter_id = %ctx.actor_id(), breeder_id = %breeder_id, ?reason))]
    pub async fn report_breeder(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
        reason: ReportReason,
        description: String,
    ) -> Result<StatusReceipt<ReportStatus>, DomainError> {
        let repos = self.engine.repos();
        let adopter = require_active_adopter(repos.adopters.as_ref(), ctx).await?;
        if description.trim().is_empty() {
            return Err(DomainError::validation("description", "must not be empty"));
        }
        validate_text(
            "description",
            &description,
            self.engine.config().max_text_length,
        )?;

        let report = BreederReport {
            id: Uuid::now_v7(),
            reporter_id: adopter.id,
            reason,
            description,
            status: ReportStatus::Pending,
            reported_at: OffsetDateTime::now_utc(),
            resolved_at: None,
            admin_notes: None,
        };
        let report_id = report.id;
        if !repos.breeders.push_report(breeder_id, report).await? {
            return Err(DomainError::not_found("Breeder", breeder_id));
        }

        info!(report_id = %report_id, "Breeder reported");
        Ok(StatusReceipt {
            id: report_id,
            status: ReportStatus::Pending,
        })
    }

    #[instrument(skip(self, ctx), fields(admin_id = %ctx.actor_id(), breeder_id = %breeder_id, report_id = %report_id))]
    pub async fn start_report_review(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
        report_id: Uuid,
    ) -> Result<StatusReceipt<ReportStatus>, DomainError> {
        let admin = self.admin(ctx, AdminPermission::ManageReports).await?;
        self.move_report(&admin, breeder_id, report_id, ReportStatus::Reviewing, None)
            .await
    }

    #[instrument(skip(self, ctx, admin_notes), fields(admin_id = %ctx.actor_id(), breeder_id = %breeder_id, report_id = %report_id, ?outcome))]
    pub async fn resolve_report(
        &self,
        ctx: &ActorContext,
        breeder_id: Uuid,
        report_id: Uuid,
        outcome: ReportOutcome,
        admin_notes: Option<String>,
    ) -> Result<StatusReceipt<ReportStatus>, DomainError> {
        let admin = self.admin(ctx, AdminPermission::ManageReports).await?;
        validate_optional_text(
            "admin_notes",
            admin_notes.as_deref(),
            self.engine.config().max_text_length,
        )?;
        self.move_report(&admin, breeder_id, report_id, outcome.into(), admin_notes)
            .await
    }

    /// All breeder reports, newest first, optionally restricted to one status.
    #[instrument(skip(self, ctx, query), fields(admin_id = %ctx.actor_id()))]
    pub async fn list_reports(
        &self,
        ctx: &ActorContext,
        status: Option<ReportStatus>,
        query: ListQuery,
    ) -> Result<Page<BreederReportView>, DomainError> {
        self.admin(ctx, AdminPermission::ManageReports).await?;
        let breeders = self.engine.repos().breeders.list(None).await?;

        let mut views: Vec<BreederReportView> = breeders
            .into_iter()
            .flat_map(|breeder| {
                let Breeder {
                    id, name, reports, ..
                } = breeder;
                reports.into_iter().map(move |report| BreederReportView {
                    breeder_id: id,
                    breeder_name: name.clone(),
                    report,
                })
            })
            .filter(|view| status.is_none_or(|s| view.report.status == s))
            .collect();
        views.sort_by(|a, b| {
            b.report
                .reported_at
                .cmp(&a.report.reported_at)
                .then(b.report.id.cmp(&a.report.id))
        });
        Ok(paginate(views, query, self.engine.config()))
    }

    async fn move_report(
        &self,
        admin: &Admin,
        breeder_id: Uuid,
        report_id: Uuid,
        to: ReportStatus,
        admin_notes: Option<String>,
    ) -> Result<StatusReceipt<ReportStatus>, DomainError> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let breeder = self.load_breeder(breeder_id).await?;
            let current = breeder
                .reports
                .iter()
                .find(|r| r.id == report_id)
                .map(|r| r.status)
                .ok_or_else(|| DomainError::not_found("Report", report_id))?;

            if report_transition(current, to)? == Transition::AlreadyApplied {
                debug!(status = %current, "Report already in requested status");
                return Ok(StatusReceipt {
                    id: report_id,
                    status: current,
                });
            }

            let update = ReportUpdate {
                status: to,
                admin_notes: admin_notes.clone(),
                resolved_at: to.is_terminal().then(OffsetDateTime::now_utc),
            };
            match self
                .engine
                .repos()
                .breeders
                .update_report(breeder_id, report_id, current, update)
                .await?
            {
                CasOutcome::Updated(report) => {
                    let action = match to {
                        ReportStatus::Resolved => AdminAction::ResolveReport,
                        ReportStatus::Dismissed => AdminAction::DismissReport,
                        ReportStatus::Pending | ReportStatus::Reviewing => AdminAction::ReviewReport,
                    };
                    self.engine
                        .log_admin_activity(
                            admin.id,
                            AdminActivity::new(action, TargetType::Report, report_id)
                                .target_name(breeder.name)
                                .description(format!("report moved from {current} to {to}")),
                        )
                        .await;
                    info!(from = %current, to = %report.status, "Report status changed");
                    return Ok(StatusReceipt {
                        id: report_id,
                        status: report.status,
                    });
                }
                CasOutcome::Stale(_) => debug!("Report changed concurrently, retrying"),
                CasOutcome::Missing => return Err(DomainError::not_found("Report", report_id)),
            }
        }
        Err(Self::contended("report", report_id))
    }

    // --- adopter accounts ---------------------------------------------------

    #[instrument(skip(self, ctx), fields(admin_id = %ctx.actor_id(), adopter_id = %adopter_id, ?status))]
    pub async fn set_adopter_account_status(
        &self,
        ctx: &ActorContext,
        adopter_id: Uuid,
        status: AccountStatus,
    ) -> Result<StatusReceipt<AccountStatus>, DomainError> {
        let admin = self.admin(ctx, AdminPermission::ManageUsers).await?;
        let repos = self.engine.repos();
        let adopter = repos
            .adopters
            .get(adopter_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Adopter", adopter_id))?;

        if adopter.account_status == status {
            debug!("Account already in requested status");
            return Ok(StatusReceipt {
                id: adopter_id,
                status,
            });
        }
        if !repos.adopters.set_account_status(adopter_id, status).await? {
            return Err(DomainError::not_found("Adopter", adopter_id));
        }

        let action = match status {
            AccountStatus::Active => AdminAction::ActivateUser,
            AccountStatus::Suspended => AdminAction::SuspendUser,
            AccountStatus::Deactivated => AdminAction::DeactivateUser,
        };
        self.engine
            .log_admin_activity(
                admin.id,
                AdminActivity::new(action, TargetType::Adopter, adopter_id)
                    .target_name(adopter.name)
                    .description(format!(
                        "account status changed from {:?} to {status:?}",
                        adopter.account_status
                    )),
            )
            .await;
        info!("Adopter account status changed");
        Ok(StatusReceipt {
            id: adopter_id,
            status,
        })
    }

    async fn admin(
        &self,
        ctx: &ActorContext,
        permission: AdminPermission,
    ) -> Result<Admin, DomainError> {
        require_admin(self.engine.repos().admins.as_ref(), ctx, permission).await
    }

    async fn load_breeder(&self, breeder_id: Uuid) -> Result<Breeder, DomainError> {
        self.engine
            .repos()
            .breeders
            .get(breeder_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Breeder", breeder_id))
    }

    fn contended(what: &str, id: Uuid) -> DomainError {
        DomainError::Storage(anyhow::anyhow!(
            "{what} {id} kept changing during the status update"
        ))
    }
}
