//! In-memory storage for the adoption aggregates.
//!
//! Each aggregate lives in a `DashMap` keyed by id; field-level operations
//! run under the shard lock of that single entry, which gives every method
//! the atomicity of a single-document update. Uniqueness invariants are held
//! by secondary key maps claimed through the `entry` API.
//!
//! Lock order: a key-index shard may be held while touching an aggregate map,
//! never the reverse.

use std::collections::{HashMap, HashSet};

use adoption_sdk::{
    AccountStatus, ActivityLogEntry, Admin, Adopter, Application, ApplicationStatus, Breeder,
    BreederReport, FavoriteBreeder, ReceivedApplication, ReportStatus, Review, ReviewReport,
    Verification, VerificationStatus,
};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::repo::{
    AdminRepository, AdopterRepository, ApplicationRepository, BreederRepository, CasOutcome,
    CounterUpdate, ReportUpdate, ReviewRepository, StatsRevision, UniqueInsert,
};

/// Position of a status along the application lifecycle.
const fn stage(status: ApplicationStatus) -> u8 {
    match status {
        ApplicationStatus::ConsultationPending => 0,
        ApplicationStatus::ConsultationCompleted => 1,
        ApplicationStatus::AdoptionApproved | ApplicationStatus::AdoptionRejected => 2,
    }
}

/// Breeder aggregate plus the application ids behind its counters.
#[derive(Debug, Clone)]
struct StoredBreeder {
    breeder: Breeder,
    counted_applications: HashSet<Uuid>,
    counted_adoptions: HashSet<Uuid>,
    revision: StatsRevision,
}

impl StoredBreeder {
    fn new(breeder: Breeder) -> Self {
        Self {
            breeder,
            counted_applications: HashSet::new(),
            counted_adoptions: HashSet::new(),
            revision: StatsRevision::default(),
        }
    }

    fn count(set: &HashSet<Uuid>) -> anyhow::Result<u64> {
        Ok(u64::try_from(set.len())?)
    }
}

/// In-memory implementation of every adoption repository.
#[derive(Default)]
pub struct InMemoryStore {
    breeders: DashMap<Uuid, StoredBreeder>,
    adopters: DashMap<Uuid, Adopter>,
    admins: DashMap<Uuid, Admin>,
    applications: DashMap<Uuid, Application>,
    reviews: DashMap<Uuid, Review>,
    /// `(adopter_id, breeder_id)` -> id of the pending application.
    pending_pairs: DashMap<(Uuid, Uuid), Uuid>,
    /// `(adopter_id, breeder_id)` -> id of the review.
    review_pairs: DashMap<(Uuid, Uuid), Uuid>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn newest_first_applications(mut items: Vec<Application>) -> Vec<Application> {
        items.sort_by(|a, b| b.applied_at.cmp(&a.applied_at).then(b.id.cmp(&a.id)));
        items
    }

    fn newest_first_reviews(mut items: Vec<Review>) -> Vec<Review> {
        items.sort_by(|a, b| b.written_at.cmp(&a.written_at).then(b.id.cmp(&a.id)));
        items
    }
}

#[async_trait]
impl BreederRepository for InMemoryStore {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Breeder>> {
        Ok(self.breeders.get(&id).map(|s| s.breeder.clone()))
    }

    /// Replacing a breeder keeps its counted ids and generations.
    async fn insert(&self, breeder: Breeder) -> anyhow::Result<()> {
        match self.breeders.entry(breeder.id) {
            Entry::Occupied(mut stored) => stored.get_mut().breeder = breeder,
            Entry::Vacant(slot) => {
                slot.insert(StoredBreeder::new(breeder));
            }
        }
        Ok(())
    }

    async fn list(&self, status: Option<VerificationStatus>) -> anyhow::Result<Vec<Breeder>> {
        let mut breeders: Vec<Breeder> = self
            .breeders
            .iter()
            .filter(|s| status.is_none_or(|st| s.breeder.verification.status == st))
            .map(|s| s.breeder.clone())
            .collect();
        breeders.sort_by(|a, b| {
            a.verification
                .submitted_at
                .cmp(&b.verification.submitted_at)
                .then(a.id.cmp(&b.id))
        });
        Ok(breeders)
    }

    async fn set_verification(
        &self,
        id: Uuid,
        expected: VerificationStatus,
        verification: Verification,
    ) -> anyhow::Result<CasOutcome<Verification>> {
        let Some(mut stored) = self.breeders.get_mut(&id) else {
            return Ok(CasOutcome::Missing);
        };
        let current = &mut stored.breeder.verification;
        if current.status != expected {
            return Ok(CasOutcome::Stale(current.clone()));
        }
        *current = verification;
        Ok(CasOutcome::Updated(current.clone()))
    }

    async fn upsert_received_application(
        &self,
        id: Uuid,
        entry: ReceivedApplication,
    ) -> anyhow::Result<bool> {
        let Some(mut stored) = self.breeders.get_mut(&id) else {
            return Ok(false);
        };
        let mirror = &mut stored.breeder.received_applications;
        if let Some(existing) = mirror
            .iter_mut()
            .find(|e| e.application_id == entry.application_id)
        {
            if stage(existing.status) <= stage(entry.status) {
                *existing = entry;
            }
        } else {
            mirror.push(entry);
        }
        Ok(true)
    }

    async fn stats_revision(&self, id: Uuid) -> anyhow::Result<Option<StatsRevision>> {
        Ok(self.breeders.get(&id).map(|s| s.revision))
    }

    async fn record_received_application(
        &self,
        id: Uuid,
        application_id: Uuid,
    ) -> anyhow::Result<CounterUpdate> {
        let Some(mut stored) = self.breeders.get_mut(&id) else {
            return Ok(CounterUpdate::Missing);
        };
        if !stored.counted_applications.insert(application_id) {
            return Ok(CounterUpdate::AlreadyCounted);
        }
        stored.breeder.stats.total_applications += 1;
        stored.revision.counters += 1;
        Ok(CounterUpdate::Counted)
    }

    async fn record_completed_adoption(
        &self,
        id: Uuid,
        application_id: Uuid,
    ) -> anyhow::Result<CounterUpdate> {
        let Some(mut stored) = self.breeders.get_mut(&id) else {
            return Ok(CounterUpdate::Missing);
        };
        if !stored.counted_adoptions.insert(application_id) {
            return Ok(CounterUpdate::AlreadyCounted);
        }
        stored.breeder.stats.completed_adoptions += 1;
        stored.revision.counters += 1;
        Ok(CounterUpdate::Counted)
    }

    async fn reset_application_counters(
        &self,
        id: Uuid,
        expected_revision: u64,
        application_ids: Vec<Uuid>,
        completed_application_ids: Vec<Uuid>,
    ) -> anyhow::Result<CasOutcome<u64>> {
        let Some(mut stored) = self.breeders.get_mut(&id) else {
            return Ok(CasOutcome::Missing);
        };
        if stored.revision.counters != expected_revision {
            return Ok(CasOutcome::Stale(stored.revision.counters));
        }
        let counted_applications: HashSet<Uuid> = application_ids.into_iter().collect();
        let counted_adoptions: HashSet<Uuid> = completed_application_ids.into_iter().collect();
        stored.breeder.stats.total_applications = StoredBreeder::count(&counted_applications)?;
        stored.breeder.stats.completed_adoptions = StoredBreeder::count(&counted_adoptions)?;
        stored.counted_applications = counted_applications;
        stored.counted_adoptions = counted_adoptions;
        stored.revision.counters += 1;
        Ok(CasOutcome::Updated(stored.revision.counters))
    }

    async fn set_review_stats(
        &self,
        id: Uuid,
        expected_revision: u64,
        average_rating: f64,
        total_reviews: u64,
    ) -> anyhow::Result<CasOutcome<u64>> {
        let Some(mut stored) = self.breeders.get_mut(&id) else {
            return Ok(CasOutcome::Missing);
        };
        if stored.revision.reviews != expected_revision {
            return Ok(CasOutcome::Stale(stored.revision.reviews));
        }
        stored.breeder.stats.average_rating = average_rating;
        stored.breeder.stats.total_reviews = total_reviews;
        stored.revision.reviews += 1;
        Ok(CasOutcome::Updated(stored.revision.reviews))
    }

    async fn increment_profile_views(&self, id: Uuid) -> anyhow::Result<Option<Breeder>> {
        let Some(mut stored) = self.breeders.get_mut(&id) else {
            return Ok(None);
        };
        stored.breeder.stats.profile_views += 1;
        Ok(Some(stored.breeder.clone()))
    }

    async fn push_report(&self, id: Uuid, report: BreederReport) -> anyhow::Result<bool> {
        let Some(mut stored) = self.breeders.get_mut(&id) else {
            return Ok(false);
        };
        stored.breeder.reports.push(report);
        Ok(true)
    }

    async fn update_report(
        &self,
        id: Uuid,
        report_id: Uuid,
        expected: ReportStatus,
        update: ReportUpdate,
    ) -> anyhow::Result<CasOutcome<BreederReport>> {
        let Some(mut stored) = self.breeders.get_mut(&id) else {
            return Ok(CasOutcome::Missing);
        };
        let Some(report) = stored.breeder.reports.iter_mut().find(|r| r.id == report_id) else {
            return Ok(CasOutcome::Missing);
        };
        if report.status != expected {
            return Ok(CasOutcome::Stale(report.clone()));
        }
        report.status = update.status;
        if update.admin_notes.is_some() {
            report.admin_notes = update.admin_notes;
        }
        if update.resolved_at.is_some() {
            report.resolved_at = update.resolved_at;
        }
        Ok(CasOutcome::Updated(report.clone()))
    }
}

#[async_trait]
impl AdopterRepository for InMemoryStore {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Adopter>> {
        Ok(self.adopters.get(&id).map(|a| a.clone()))
    }

    async fn insert(&self, adopter: Adopter) -> anyhow::Result<()> {
        self.adopters.insert(adopter.id, adopter);
        Ok(())
    }

    async fn set_account_status(&self, id: Uuid, status: AccountStatus) -> anyhow::Result<bool> {
        let Some(mut adopter) = self.adopters.get_mut(&id) else {
            return Ok(false);
        };
        adopter.account_status = status;
        Ok(true)
    }

    async fn add_favorite(
        &self,
        id: Uuid,
        favorite: FavoriteBreeder,
    ) -> anyhow::Result<UniqueInsert> {
        let Some(mut adopter) = self.adopters.get_mut(&id) else {
            return Ok(UniqueInsert::OwnerMissing);
        };
        if adopter
            .favorite_breeders
            .iter()
            .any(|f| f.breeder_id == favorite.breeder_id)
        {
            return Ok(UniqueInsert::Duplicate(favorite.breeder_id));
        }
        adopter.favorite_breeders.push(favorite);
        Ok(UniqueInsert::Inserted)
    }

    async fn remove_favorite(&self, id: Uuid, breeder_id: Uuid) -> anyhow::Result<bool> {
        let Some(mut adopter) = self.adopters.get_mut(&id) else {
            return Ok(false);
        };
        let before = adopter.favorite_breeders.len();
        adopter
            .favorite_breeders
            .retain(|f| f.breeder_id != breeder_id);
        Ok(adopter.favorite_breeders.len() != before)
    }
}

#[async_trait]
impl AdminRepository for InMemoryStore {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Admin>> {
        Ok(self.admins.get(&id).map(|a| a.clone()))
    }

    async fn insert(&self, admin: Admin) -> anyhow::Result<()> {
        self.admins.insert(admin.id, admin);
        Ok(())
    }

    async fn append_activity(&self, id: Uuid, entry: ActivityLogEntry) -> anyhow::Result<bool> {
        let Some(mut admin) = self.admins.get_mut(&id) else {
            return Ok(false);
        };
        admin.activity_logs.push(entry);
        Ok(true)
    }

    async fn recent_activity(
        &self,
        id: Uuid,
        limit: usize,
    ) -> anyhow::Result<Option<Vec<ActivityLogEntry>>> {
        Ok(self.admins.get(&id).map(|admin| {
            admin
                .activity_logs
                .iter()
                .rev()
                .take(limit)
                .cloned()
                .collect()
        }))
    }
}

#[async_trait]
impl ApplicationRepository for InMemoryStore {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Application>> {
        Ok(self.applications.get(&id).map(|a| a.clone()))
    }

    async fn insert_unique_pending(
        &self,
        application: Application,
    ) -> anyhow::Result<UniqueInsert> {
        anyhow::ensure!(
            application.status == ApplicationStatus::ConsultationPending,
            "only pending applications can be inserted through the pending index"
        );
        match self
            .pending_pairs
            .entry((application.adopter_id, application.breeder_id))
        {
            Entry::Occupied(existing) => Ok(UniqueInsert::Duplicate(*existing.get())),
            Entry::Vacant(slot) => {
                slot.insert(application.id);
                self.applications.insert(application.id, application);
                Ok(UniqueInsert::Inserted)
            }
        }
    }

    async fn insert(&self, application: Application) -> anyhow::Result<()> {
        self.applications.insert(application.id, application);
        Ok(())
    }

    async fn find_pending(
        &self,
        adopter_id: Uuid,
        breeder_id: Uuid,
    ) -> anyhow::Result<Option<Application>> {
        Ok(self
            .applications
            .iter()
            .find(|a| {
                a.adopter_id == adopter_id
                    && a.breeder_id == breeder_id
                    && a.status == ApplicationStatus::ConsultationPending
            })
            .map(|a| a.clone()))
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: ApplicationStatus,
        status: ApplicationStatus,
        processed_at: OffsetDateTime,
        notes: Option<String>,
    ) -> anyhow::Result<CasOutcome<Application>> {
        let updated = {
            let Some(mut application) = self.applications.get_mut(&id) else {
                return Ok(CasOutcome::Missing);
            };
            if application.status != expected {
                return Ok(CasOutcome::Stale(application.clone()));
            }
            application.status = status;
            application.processed_at = Some(processed_at);
            if notes.is_some() {
                application.notes = notes;
            }
            application.clone()
        };

        if expected == ApplicationStatus::ConsultationPending && status != expected {
            self.pending_pairs
                .remove_if(&(updated.adopter_id, updated.breeder_id), |_, held| {
                    *held == id
                });
        }

        Ok(CasOutcome::Updated(updated))
    }

    async fn list_by_breeder(&self, breeder_id: Uuid) -> anyhow::Result<Vec<Application>> {
        let items = self
            .applications
            .iter()
            .filter(|a| a.breeder_id == breeder_id)
            .map(|a| a.clone())
            .collect();
        Ok(Self::newest_first_applications(items))
    }

    async fn list_by_adopter(&self, adopter_id: Uuid) -> anyhow::Result<Vec<Application>> {
        let items = self
            .applications
            .iter()
            .filter(|a| a.adopter_id == adopter_id)
            .map(|a| a.clone())
            .collect();
        Ok(Self::newest_first_applications(items))
    }

    async fn status_counts(&self) -> anyhow::Result<HashMap<ApplicationStatus, usize>> {
        let mut counts = HashMap::new();
        for application in self.applications.iter() {
            *counts.entry(application.status).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[async_trait]
impl ReviewRepository for InMemoryStore {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Review>> {
        Ok(self.reviews.get(&id).map(|r| r.clone()))
    }

    async fn insert_unique(&self, review: Review) -> anyhow::Result<UniqueInsert> {
        match self.review_pairs.entry((review.adopter_id, review.breeder_id)) {
            Entry::Occupied(existing) => Ok(UniqueInsert::Duplicate(*existing.get())),
            Entry::Vacant(slot) => {
                slot.insert(review.id);
                self.reviews.insert(review.id, review);
                Ok(UniqueInsert::Inserted)
            }
        }
    }

    async fn hide(&self, id: Uuid) -> anyhow::Result<CasOutcome<Review>> {
        let Some(mut review) = self.reviews.get_mut(&id) else {
            return Ok(CasOutcome::Missing);
        };
        if !review.is_visible {
            return Ok(CasOutcome::Stale(review.clone()));
        }
        review.is_visible = false;
        Ok(CasOutcome::Updated(review.clone()))
    }

    async fn flag_reported(
        &self,
        id: Uuid,
        report: ReviewReport,
    ) -> anyhow::Result<Option<Review>> {
        let Some(mut review) = self.reviews.get_mut(&id) else {
            return Ok(None);
        };
        if review.report.as_ref().is_none_or(|r| !r.is_open()) {
            review.report = Some(report);
            review.is_reported = true;
        }
        Ok(Some(review.clone()))
    }

    async fn update_report(
        &self,
        id: Uuid,
        expected: ReportStatus,
        update: ReportUpdate,
    ) -> anyhow::Result<CasOutcome<Review>> {
        let Some(mut review) = self.reviews.get_mut(&id) else {
            return Ok(CasOutcome::Missing);
        };
        let Some(report) = review.report.as_mut() else {
            return Ok(CasOutcome::Missing);
        };
        if report.status != expected {
            return Ok(CasOutcome::Stale(review.clone()));
        }
        report.status = update.status;
        if update.admin_notes.is_some() {
            report.admin_notes = update.admin_notes;
        }
        if update.resolved_at.is_some() {
            report.resolved_at = update.resolved_at;
        }
        let open = report.is_open();
        review.is_reported = open;
        Ok(CasOutcome::Updated(review.clone()))
    }

    async fn list_by_breeder(&self, breeder_id: Uuid) -> anyhow::Result<Vec<Review>> {
        let items = self
            .reviews
            .iter()
            .filter(|r| r.breeder_id == breeder_id)
            .map(|r| r.clone())
            .collect();
        Ok(Self::newest_first_reviews(items))
    }

    async fn list_reported(&self) -> anyhow::Result<Vec<Review>> {
        let mut items: Vec<Review> = self
            .reviews
            .iter()
            .filter(|r| r.report.as_ref().is_some_and(ReviewReport::is_open))
            .map(|r| r.clone())
            .collect();
        let reported_at = |r: &Review| r.report.as_ref().map(|report| report.reported_at);
        items.sort_by(|a, b| reported_at(b).cmp(&reported_at(a)).then(b.id.cmp(&a.id)));
        Ok(items)
    }

    async fn count_hidden(&self) -> anyhow::Result<usize> {
        Ok(self.reviews.iter().filter(|r| !r.is_visible).count())
    }
}
