//! Domain services for the adoption module.

use std::sync::Arc;

use adoption_sdk::{
    ActorContext, ActorRole, Admin, AdminPermission, Adopter, FileUrlResolver, ListQuery, Page,
    PetAvailabilityLookup,
};
use uuid::Uuid;

use crate::config::AdoptionConfig;
use crate::domain::error::DomainError;
use crate::domain::repo::{AdminRepository, AdopterRepository, Repositories};

mod activity;
mod applications;
mod consistency;
mod moderation;
mod profiles;
mod reviews;

pub use activity::AdminActivity;
pub use applications::ApplicationService;
pub use consistency::ConsistencyEngine;
pub use moderation::ModerationService;
pub use profiles::ProfileService;
pub use reviews::ReviewService;

/// Entry point wiring the adoption services over one set of repositories.
pub struct AdoptionService {
    pub applications: ApplicationService,
    pub moderation: ModerationService,
    pub reviews: ReviewService,
    pub profiles: ProfileService,
    engine: Arc<ConsistencyEngine>,
}

impl AdoptionService {
    #[must_use]
    pub fn new(
        repos: Repositories,
        pets: Arc<dyn PetAvailabilityLookup>,
        files: Arc<dyn FileUrlResolver>,
        config: AdoptionConfig,
    ) -> Self {
        let engine = Arc::new(ConsistencyEngine::new(repos, config));
        Self {
            applications: ApplicationService::new(engine.clone(), pets),
            moderation: ModerationService::new(engine.clone()),
            reviews: ReviewService::new(engine.clone()),
            profiles: ProfileService::new(engine.clone(), files),
            engine,
        }
    }

    #[must_use]
    pub fn engine(&self) -> &ConsistencyEngine {
        &self.engine
    }
}

/// # Errors
///
/// Returns `Forbidden` if the actor does not hold `role`.
pub fn require_role(ctx: &ActorContext, role: ActorRole) -> Result<(), DomainError> {
    if ctx.is(role) {
        Ok(())
    } else {
        Err(DomainError::forbidden(format!(
            "operation requires the {role} role, caller is {}",
            ctx.role()
        )))
    }
}

/// Loads the calling admin without checking permission flags.
///
/// # Errors
///
/// Returns `Forbidden` for a non-admin caller, `NotFound` if the record is missing.
pub async fn require_admin_record(
    admins: &dyn AdminRepository,
    ctx: &ActorContext,
) -> Result<Admin, DomainError> {
    require_role(ctx, ActorRole::Admin)?;
    admins
        .get(ctx.actor_id())
        .await?
        .ok_or_else(|| DomainError::not_found("Admin", ctx.actor_id()))
}

/// Loads the calling admin and checks one permission flag.
///
/// Runs before any mutation so a denied call leaves state untouched.
///
/// # Errors
///
/// Returns `Forbidden` for a non-admin caller or a missing flag, `NotFound`
/// if the admin record does not exist.
pub async fn require_admin(
    admins: &dyn AdminRepository,
    ctx: &ActorContext,
    permission: AdminPermission,
) -> Result<Admin, DomainError> {
    let admin = require_admin_record(admins, ctx).await?;
    if !permission.granted_by(&admin.permissions) {
        return Err(DomainError::forbidden(format!(
            "admin lacks the {} permission",
            permission.as_str()
        )));
    }
    Ok(admin)
}

/// Loads the calling adopter.
///
/// # Errors
///
/// Returns `Forbidden` for a non-adopter caller, `NotFound` if the record is missing.
pub async fn require_adopter(
    adopters: &dyn AdopterRepository,
    ctx: &ActorContext,
) -> Result<Adopter, DomainError> {
    require_role(ctx, ActorRole::Adopter)?;
    adopters
        .get(ctx.actor_id())
        .await?
        .ok_or_else(|| DomainError::not_found("Adopter", ctx.actor_id()))
}

/// Loads the calling adopter and requires an active account.
///
/// # Errors
///
/// As [`require_adopter`], plus `Validation` when the account is not active.
pub async fn require_active_adopter(
    adopters: &dyn AdopterRepository,
    ctx: &ActorContext,
) -> Result<Adopter, DomainError> {
    let adopter = require_adopter(adopters, ctx).await?;
    if !adopter.is_active() {
        return Err(DomainError::validation(
            "account_status",
            "adopter account is not active",
        ));
    }
    Ok(adopter)
}

/// Applies skip/limit to an already ordered collection.
pub fn paginate<T>(items: Vec<T>, query: ListQuery, config: &AdoptionConfig) -> Page<T> {
    let total = items.len();
    let limit = config.page_size(query.limit);
    let items = items.into_iter().skip(query.skip).take(limit).collect();
    Page { items, total }
}

/// # Errors
///
/// Returns `Validation` when `value` is longer than `max` characters.
pub fn validate_text(field: &str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::validation(
            field,
            format!("exceeds maximum length of {max}"),
        ));
    }
    Ok(())
}

/// [`validate_text`] for optional input.
///
/// # Errors
///
/// Returns `Validation` when the value is present and too long.
pub fn validate_optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<(), DomainError> {
    value.map_or(Ok(()), |v| validate_text(field, v, max))
}

fn is_owner(ctx: &ActorContext, role: ActorRole, owner_id: Uuid) -> bool {
    ctx.is(role) && ctx.actor_id() == owner_id
}
