//! Consistency engine.
//!
//! Owns every write that is reflected in more than one place (ledger plus
//! breeder mirror, derived breeder counters, favorite snapshots) and every
//! duplicate-prevention check. Each step is either idempotent or
//! checked-before-write, so a failed multi-step operation can be re-driven.
//! Recomputed stats commit through a per-breeder generation and are
//! recomputed again when another write lands first.

use adoption_sdk::{
    Application, ApplicationStatus, BreederStats, ConflictKind, FavoriteBreeder,
    ReceivedApplication, Review,
};
use time::OffsetDateTime;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::AdoptionConfig;
use crate::domain::error::DomainError;
use crate::domain::repo::{CasOutcome, CounterUpdate, Repositories, StatsRevision, UniqueInsert};

/// Upper bound on stats recomputes when other writers keep committing first.
const MAX_STATS_ATTEMPTS: usize = 8;

pub struct ConsistencyEngine {
    repos: Repositories,
    config: AdoptionConfig,
}

impl ConsistencyEngine {
    #[must_use]
    pub fn new(repos: Repositories, config: AdoptionConfig) -> Self {
        Self { repos, config }
    }

    #[must_use]
    pub fn repos(&self) -> &Repositories {
        &self.repos
    }

    #[must_use]
    pub fn config(&self) -> &AdoptionConfig {
        &self.config
    }

    /// Query-before-write check for an existing pending application.
    ///
    /// Concurrent callers may both pass this check; use it only where
    /// `enforce_unique_pending` is off. A pending application found here is
    /// settled before the conflict is returned.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if a pending application exists for the pair, or
    /// the error that stopped the existing application from being settled.
    #[instrument(skip(self), fields(adopter_id = %adopter_id, breeder_id = %breeder_id))]
    pub async fn check_no_duplicate_pending_application(
        &self,
        adopter_id: Uuid,
        breeder_id: Uuid,
    ) -> Result<(), DomainError> {
        if let Some(existing) = self
            .repos
            .applications
            .find_pending(adopter_id, breeder_id)
            .await?
        {
            self.settle_application(&existing).await?;
            return Err(Self::pending_conflict(existing.id));
        }
        Ok(())
    }

    /// Writes a new pending application to the ledger, counts it on the
    /// breeder and projects it into the breeder mirror.
    ///
    /// A retried submit that hits its own earlier ledger write settles that
    /// application again, so side-effects lost to a failure are re-driven.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when another pending application holds the pair,
    /// `NotFound` if the breeder disappeared, or `Storage` on write failure.
    #[instrument(skip(self, application), fields(application_id = %application.id, breeder_id = %application.breeder_id))]
    pub async fn record_new_application(
        &self,
        application: Application,
    ) -> Result<Application, DomainError> {
        if self.config.enforce_unique_pending {
            match self
                .repos
                .applications
                .insert_unique_pending(application.clone())
                .await?
            {
                UniqueInsert::Inserted => {}
                UniqueInsert::Duplicate(existing_id) => {
                    if let Some(existing) = self.repos.applications.get(existing_id).await? {
                        self.settle_application(&existing).await?;
                    }
                    return Err(Self::pending_conflict(existing_id));
                }
                UniqueInsert::OwnerMissing => {
                    return Err(DomainError::not_found("Breeder", application.breeder_id));
                }
            }
        } else {
            self.check_no_duplicate_pending_application(
                application.adopter_id,
                application.breeder_id,
            )
            .await?;
            self.repos.applications.insert(application.clone()).await?;
        }

        self.settle_application(&application).await?;
        info!("Recorded new application");
        Ok(application)
    }

    /// Re-drives every derived write of a ledger record: the received
    /// counter, the mirror entry and the completed-adoption counter. Each
    /// step is keyed by application id, so settling twice changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the breeder does not exist, `Storage` on write failure.
    pub async fn settle_application(&self, application: &Application) -> Result<(), DomainError> {
        self.ensure_application_counted(application).await?;
        self.project_application(application).await?;
        self.ensure_completed_adoption_counted(application).await
    }

    async fn ensure_application_counted(&self, application: &Application) -> Result<(), DomainError> {
        match self
            .repos
            .breeders
            .record_received_application(application.breeder_id, application.id)
            .await?
        {
            CounterUpdate::Counted => {
                debug!(application_id = %application.id, "Counted received application");
                Ok(())
            }
            CounterUpdate::AlreadyCounted => Ok(()),
            CounterUpdate::Missing => Err(DomainError::not_found("Breeder", application.breeder_id)),
        }
    }

    /// Writes a status to the ledger if it still holds `expected`, then
    /// projects the written record into the breeder mirror.
    ///
    /// The ledger write is never rolled back; a failed projection surfaces as
    /// an error and is repaired by re-running the operation.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if either write fails, `NotFound` if the breeder is gone.
    #[instrument(skip(self, notes), fields(application_id = %application_id, %expected, %status))]
    pub async fn sync_application_status(
        &self,
        application_id: Uuid,
        expected: ApplicationStatus,
        status: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<CasOutcome<Application>, DomainError> {
        let outcome = self
            .repos
            .applications
            .compare_and_set_status(
                application_id,
                expected,
                status,
                OffsetDateTime::now_utc(),
                notes,
            )
            .await?;

        if let CasOutcome::Updated(ref application) = outcome {
            self.project_application(application).await?;
        }
        Ok(outcome)
    }

    /// Read-model projection: upserts the mirror entry from the ledger record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the breeder does not exist, `Storage` on write failure.
    pub async fn project_application(&self, application: &Application) -> Result<(), DomainError> {
        let adopter_name = self
            .repos
            .adopters
            .get(application.adopter_id)
            .await?
            .map(|a| a.name)
            .unwrap_or_default();

        let entry = ReceivedApplication {
            application_id: application.id,
            adopter_id: application.adopter_id,
            adopter_name,
            pet_id: application.pet_id,
            status: application.status,
            applied_at: application.applied_at,
            processed_at: application.processed_at,
        };

        if !self
            .repos
            .breeders
            .upsert_received_application(application.breeder_id, entry)
            .await?
        {
            return Err(DomainError::not_found("Breeder", application.breeder_id));
        }
        debug!(application_id = %application.id, status = %application.status, "Projected application into breeder mirror");
        Ok(())
    }

    /// Counts a completed adoption for an application that just moved into
    /// `adoption_approved` from `prior`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the breeder does not exist, `Storage` on write failure.
    pub async fn increment_completed_adoptions(
        &self,
        application: &Application,
        prior: ApplicationStatus,
    ) -> Result<(), DomainError> {
        if application.status != ApplicationStatus::AdoptionApproved
            || prior == ApplicationStatus::AdoptionApproved
        {
            return Ok(());
        }
        self.ensure_completed_adoption_counted(application).await
    }

    /// Idempotently counts an approved application. Safe to call on every retry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the breeder does not exist, `Storage` on write failure.
    pub async fn ensure_completed_adoption_counted(
        &self,
        application: &Application,
    ) -> Result<(), DomainError> {
        if application.status != ApplicationStatus::AdoptionApproved {
            return Ok(());
        }
        match self
            .repos
            .breeders
            .record_completed_adoption(application.breeder_id, application.id)
            .await?
        {
            CounterUpdate::Counted => {
                info!(application_id = %application.id, breeder_id = %application.breeder_id, "Counted completed adoption");
                Ok(())
            }
            CounterUpdate::AlreadyCounted => {
                debug!(application_id = %application.id, "Completed adoption already counted");
                Ok(())
            }
            CounterUpdate::Missing => Err(DomainError::not_found("Breeder", application.breeder_id)),
        }
    }

    /// Recomputes `average_rating` and `total_reviews` from visible reviews.
    ///
    /// The write only commits if no other recompute committed since the
    /// reviews were listed; otherwise the reviews are listed again.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the breeder does not exist, `Storage` on failure.
    #[instrument(skip(self), fields(breeder_id = %breeder_id))]
    pub async fn recalculate_review_stats(&self, breeder_id: Uuid) -> Result<(f64, u64), DomainError> {
        for _ in 0..MAX_STATS_ATTEMPTS {
            let revision = self.load_stats_revision(breeder_id).await?.reviews;
            let reviews = self.repos.reviews.list_by_breeder(breeder_id).await?;
            let (average, total) = Self::review_stats(&reviews)?;

            match self
                .repos
                .breeders
                .set_review_stats(breeder_id, revision, average, total)
                .await?
            {
                CasOutcome::Updated(_) => {
                    debug!(average, total, "Recalculated review stats");
                    return Ok((average, total));
                }
                CasOutcome::Stale(latest) => {
                    debug!(seen = revision, latest, "Review stats written concurrently, recomputing");
                }
                CasOutcome::Missing => return Err(DomainError::not_found("Breeder", breeder_id)),
            }
        }
        Err(Self::contended("review stats", breeder_id))
    }

    /// Average over visible ratings, rounded to one decimal, and their count.
    fn review_stats(reviews: &[Review]) -> Result<(f64, u64), DomainError> {
        let ratings: Vec<u32> = reviews
            .iter()
            .filter(|r| r.is_visible)
            .map(|r| u32::from(r.rating))
            .collect();

        let count = u32::try_from(ratings.len()).map_err(anyhow::Error::from)?;
        let average = if count == 0 {
            0.0
        } else {
            let sum: u32 = ratings.iter().sum();
            (f64::from(sum) / f64::from(count) * 10.0).round() / 10.0
        };
        Ok((average, u64::from(count)))
    }

    /// Adds a breeder to an adopter's favorites with a snapshot of the
    /// breeder's display fields. The snapshot is not refreshed later.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing or unapproved breeder or a missing
    /// adopter, and `Conflict` if the breeder is already a favorite.
    #[instrument(skip(self), fields(adopter_id = %adopter_id, breeder_id = %breeder_id))]
    pub async fn add_favorite(
        &self,
        adopter_id: Uuid,
        breeder_id: Uuid,
    ) -> Result<FavoriteBreeder, DomainError> {
        let breeder = self
            .repos
            .breeders
            .get(breeder_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Breeder", breeder_id))?;
        if !breeder.is_approved() {
            return Err(DomainError::not_found("Breeder", breeder_id));
        }

        let favorite = FavoriteBreeder {
            breeder_id,
            breeder_name: breeder.name,
            profile_image: breeder.profile_image,
            location: breeder.location,
            added_at: OffsetDateTime::now_utc(),
        };

        match self
            .repos
            .adopters
            .add_favorite(adopter_id, favorite.clone())
            .await?
        {
            UniqueInsert::Inserted => {
                info!("Added favorite breeder");
                Ok(favorite)
            }
            UniqueInsert::Duplicate(_) => Err(DomainError::conflict(
                ConflictKind::Favorite,
                format!("breeder {breeder_id} is already a favorite"),
            )),
            UniqueInsert::OwnerMissing => Err(DomainError::not_found("Adopter", adopter_id)),
        }
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the adopter does not exist or the breeder is not a favorite.
    #[instrument(skip(self), fields(adopter_id = %adopter_id, breeder_id = %breeder_id))]
    pub async fn remove_favorite(&self, adopter_id: Uuid, breeder_id: Uuid) -> Result<(), DomainError> {
        if self
            .repos
            .adopters
            .remove_favorite(adopter_id, breeder_id)
            .await?
        {
            info!("Removed favorite breeder");
            return Ok(());
        }
        if self.repos.adopters.get(adopter_id).await?.is_none() {
            return Err(DomainError::not_found("Adopter", adopter_id));
        }
        Err(DomainError::not_found("Favorite", breeder_id))
    }

    /// Rebuilds a breeder's derived state from authoritative records: the
    /// application counters and mirror from the ledger, the review stats from
    /// visible reviews.
    ///
    /// A counter written while the ledger is being read forces a re-read, so
    /// a concurrent approval is never dropped from the rebuilt counters.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the breeder does not exist, `Storage` on failure.
    #[instrument(skip(self), fields(breeder_id = %breeder_id))]
    pub async fn reconcile_breeder_stats(&self, breeder_id: Uuid) -> Result<BreederStats, DomainError> {
        let applications = self.reset_application_counters(breeder_id).await?;
        for application in &applications {
            self.project_application(application).await?;
        }
        self.recalculate_review_stats(breeder_id).await?;

        let breeder = self
            .repos
            .breeders
            .get(breeder_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Breeder", breeder_id))?;
        info!(
            total_applications = breeder.stats.total_applications,
            completed_adoptions = breeder.stats.completed_adoptions,
            "Reconciled breeder stats"
        );
        Ok(breeder.stats)
    }

    /// Replaces both application counters with the ledger's view and returns
    /// the ledger records the committed counters were built from.
    async fn reset_application_counters(
        &self,
        breeder_id: Uuid,
    ) -> Result<Vec<Application>, DomainError> {
        for _ in 0..MAX_STATS_ATTEMPTS {
            let revision = self.load_stats_revision(breeder_id).await?.counters;
            let applications = self.repos.applications.list_by_breeder(breeder_id).await?;
            let ids = applications.iter().map(|a| a.id).collect();
            let approved = applications
                .iter()
                .filter(|a| a.status == ApplicationStatus::AdoptionApproved)
                .map(|a| a.id)
                .collect();

            match self
                .repos
                .breeders
                .reset_application_counters(breeder_id, revision, ids, approved)
                .await?
            {
                CasOutcome::Updated(_) => return Ok(applications),
                CasOutcome::Stale(latest) => {
                    debug!(seen = revision, latest, "Application counters written concurrently, re-reading ledger");
                }
                CasOutcome::Missing => return Err(DomainError::not_found("Breeder", breeder_id)),
            }
        }
        Err(Self::contended("application counters", breeder_id))
    }

    async fn load_stats_revision(&self, breeder_id: Uuid) -> Result<StatsRevision, DomainError> {
        self.repos
            .breeders
            .stats_revision(breeder_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Breeder", breeder_id))
    }

    fn contended(what: &str, breeder_id: Uuid) -> DomainError {
        DomainError::Storage(anyhow::anyhow!(
            "{what} of breeder {breeder_id} kept changing during the recompute"
        ))
    }

    fn pending_conflict(existing: Uuid) -> DomainError {
        debug!(existing_application_id = %existing, "Duplicate pending application rejected");
        DomainError::conflict(
            ConflictKind::PendingApplication,
            format!("application {existing} is already pending for this breeder"),
        )
    }
}
