use std::sync::Arc;

use adoption_sdk::{
    ActorContext, ActorRole, AdminAction, AdminPermission, Application, ApplicationStatus,
    ListQuery, NewApplication, Page, PetAvailabilityLookup, PetStatus, StatusReceipt, TargetType,
};
use time::OffsetDateTime;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::activity::AdminActivity;
use super::consistency::ConsistencyEngine;
use super::{
    is_owner, paginate, require_active_adopter, require_admin, require_admin_record, require_role,
    validate_optional_text, validate_text,
};
use crate::domain::error::DomainError;
use crate::domain::lifecycle::{Transition, application_transition};
use crate::domain::repo::CasOutcome;

/// Upper bound on compare-and-set retries when an application keeps changing underneath.
const MAX_CAS_ATTEMPTS: usize = 8;

/// Application ledger operations: submission, status transitions and reads.
pub struct ApplicationService {
    engine: Arc<ConsistencyEngine>,
    pets: Arc<dyn PetAvailabilityLookup>,
}

impl ApplicationService {
    #[must_use]
    pub fn new(engine: Arc<ConsistencyEngine>, pets: Arc<dyn PetAvailabilityLookup>) -> Self {
        Self { engine, pets }
    }

    #[instrument(skip(self, ctx, input), fields(adopter_id = %ctx.actor_id(), breeder_id = %input.breeder_id))]
    pub async fn submit(
        &self,
        ctx: &ActorContext,
        input: NewApplication,
    ) -> Result<StatusReceipt<ApplicationStatus>, DomainError> {
        let repos = self.engine.repos();
        let adopter = require_active_adopter(repos.adopters.as_ref(), ctx).await?;

        if !input.privacy_consent {
            return Err(DomainError::validation(
                "privacy_consent",
                "privacy consent must be accepted",
            ));
        }
        let max = self.engine.config().max_text_length;
        for (question, answer) in &input.form_answers {
            validate_text(&format!("form_answers.{question}"), answer, max)?;
        }

        if repos.breeders.get(input.breeder_id).await?.is_none() {
            return Err(DomainError::not_found("Breeder", input.breeder_id));
        }

        if let Some(pet_id) = input.pet_id {
            match self.pets.pet_status(input.breeder_id, pet_id).await? {
                Some(PetStatus::Available) => {}
                Some(status) => {
                    return Err(DomainError::validation(
                        "pet_id",
                        format!("pet {pet_id} is not available ({status:?})"),
                    ));
                }
                None => {
                    return Err(DomainError::validation(
                        "pet_id",
                        format!("pet {pet_id} does not belong to this breeder"),
                    ));
                }
            }
        }

        let application = Application {
            id: Uuid::now_v7(),
            breeder_id: input.breeder_id,
            adopter_id: adopter.id,
            pet_id: input.pet_id,
            status: ApplicationStatus::ConsultationPending,
            form_answers: input.form_answers,
            applied_at: OffsetDateTime::now_utc(),
            processed_at: None,
            notes: None,
        };

        let application = self.engine.record_new_application(application).await?;
        info!(application_id = %application.id, "Application submitted");
        Ok(StatusReceipt {
            id: application.id,
            status: application.status,
        })
    }

    /// Breeder-driven status change.
    ///
    /// Re-applying the current terminal status succeeds and re-drives the
    /// mirror projection and the completed-adoption counter, both idempotent.
    #[instrument(skip(self, ctx, notes), fields(breeder_id = %ctx.actor_id(), application_id = %application_id, %new_status))]
    pub async fn advance(
        &self,
        ctx: &ActorContext,
        application_id: Uuid,
        new_status: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<StatusReceipt<ApplicationStatus>, DomainError> {
        require_role(ctx, ActorRole::Breeder)?;
        validate_optional_text("notes", notes.as_deref(), self.engine.config().max_text_length)?;

        let (application, _) = self
            .transition(application_id, new_status, notes, Some(ctx.actor_id()))
            .await?;
        Ok(StatusReceipt {
            id: application.id,
            status: application.status,
        })
    }

    /// Admin override: bypasses breeder ownership, not the transition table.
    #[instrument(skip(self, ctx, notes), fields(admin_id = %ctx.actor_id(), application_id = %application_id, %new_status))]
    pub async fn override_status(
        &self,
        ctx: &ActorContext,
        application_id: Uuid,
        new_status: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<StatusReceipt<ApplicationStatus>, DomainError> {
        let admin = require_admin(
            self.engine.repos().admins.as_ref(),
            ctx,
            AdminPermission::ManageUsers,
        )
        .await?;
        validate_optional_text("notes", notes.as_deref(), self.engine.config().max_text_length)?;

        let (application, transition) = self
            .transition(application_id, new_status, notes, None)
            .await?;

        if transition == Transition::Apply {
            self.engine
                .log_admin_activity(
                    admin.id,
                    AdminActivity::new(
                        AdminAction::OverrideApplication,
                        TargetType::Application,
                        application.id,
                    )
                    .description(format!("application status set to {new_status}")),
                )
                .await;
        }

        Ok(StatusReceipt {
            id: application.id,
            status: application.status,
        })
    }

    /// Readable by the application's adopter, its breeder, or any admin.
    #[instrument(skip(self, ctx), fields(application_id = %application_id))]
    pub async fn get(
        &self,
        ctx: &ActorContext,
        application_id: Uuid,
    ) -> Result<Application, DomainError> {
        debug!("Getting application by id");
        let application = self.load(application_id).await?;
        self.require_participant(ctx, &application).await?;
        Ok(application)
    }

    #[instrument(skip(self, ctx, query), fields(breeder_id = %ctx.actor_id()))]
    pub async fn list_for_breeder(
        &self,
        ctx: &ActorContext,
        status: Option<ApplicationStatus>,
        query: ListQuery,
    ) -> Result<Page<Application>, DomainError> {
        require_role(ctx, ActorRole::Breeder)?;
        let mut items = self
            .engine
            .repos()
            .applications
            .list_by_breeder(ctx.actor_id())
            .await?;
        if let Some(status) = status {
            items.retain(|a| a.status == status);
        }
        debug!("Listed {} applications for breeder", items.len());
        Ok(paginate(items, query, self.engine.config()))
    }

    #[instrument(skip(self, ctx, query), fields(adopter_id = %ctx.actor_id()))]
    pub async fn list_for_adopter(
        &self,
        ctx: &ActorContext,
        query: ListQuery,
    ) -> Result<Page<Application>, DomainError> {
        require_role(ctx, ActorRole::Adopter)?;
        let items = self
            .engine
            .repos()
            .applications
            .list_by_adopter(ctx.actor_id())
            .await?;
        debug!("Listed {} applications for adopter", items.len());
        Ok(paginate(items, query, self.engine.config()))
    }

    /// Read-repair: re-projects the ledger record into the breeder mirror and
    /// re-drives the breeder counters it feeds.
    #[instrument(skip(self, ctx), fields(application_id = %application_id))]
    pub async fn repair_mirror(
        &self,
        ctx: &ActorContext,
        application_id: Uuid,
    ) -> Result<StatusReceipt<ApplicationStatus>, DomainError> {
        let application = self.load(application_id).await?;
        if !is_owner(ctx, ActorRole::Breeder, application.breeder_id) {
            require_admin_record(self.engine.repos().admins.as_ref(), ctx).await?;
        }

        self.engine.settle_application(&application).await?;
        info!(status = %application.status, "Repaired application mirror");
        Ok(StatusReceipt {
            id: application.id,
            status: application.status,
        })
    }

    /// Validated, compare-and-set status change shared by breeder and admin paths.
    ///
    /// `owner` restricts the change to applications addressed to that breeder.
    async fn transition(
        &self,
        application_id: Uuid,
        to: ApplicationStatus,
        notes: Option<String>,
        owner: Option<Uuid>,
    ) -> Result<(Application, Transition), DomainError> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let current = self.load(application_id).await?;
            if let Some(owner) = owner {
                if current.breeder_id != owner {
                    return Err(DomainError::forbidden(
                        "application is not addressed to this breeder",
                    ));
                }
            }

            match application_transition(current.status, to)? {
                Transition::AlreadyApplied => {
                    self.engine.settle_application(&current).await?;
                    debug!(status = %current.status, "Application already in requested status");
                    return Ok((current, Transition::AlreadyApplied));
                }
                Transition::Apply => {
                    match self
                        .engine
                        .sync_application_status(application_id, current.status, to, notes.clone())
                        .await?
                    {
                        CasOutcome::Updated(application) => {
                            self.engine
                                .increment_completed_adoptions(&application, current.status)
                                .await?;
                            info!(from = %current.status, to = %application.status, "Application status changed");
                            return Ok((application, Transition::Apply));
                        }
                        CasOutcome::Stale(latest) => {
                            debug!(seen = %current.status, latest = %latest.status, "Application changed concurrently, retrying");
                        }
                        CasOutcome::Missing => {
                            return Err(DomainError::not_found("Application", application_id));
                        }
                    }
                }
            }
        }

        Err(DomainError::Storage(anyhow::anyhow!(
            "application {application_id} kept changing during the status update"
        )))
    }

    async fn load(&self, application_id: Uuid) -> Result<Application, DomainError> {
        self.engine
            .repos()
            .applications
            .get(application_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Application", application_id))
    }

    async fn require_participant(
        &self,
        ctx: &ActorContext,
        application: &Application,
    ) -> Result<(), DomainError> {
        if is_owner(ctx, ActorRole::Adopter, application.adopter_id)
            || is_owner(ctx, ActorRole::Breeder, application.breeder_id)
        {
            return Ok(());
        }
        if ctx.is(ActorRole::Admin) {
            require_admin_record(self.engine.repos().admins.as_ref(), ctx).await?;
            return Ok(());
        }
        Err(DomainError::forbidden(
            "application belongs to another adopter or breeder",
        ))
    }
}
