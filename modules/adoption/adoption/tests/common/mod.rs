#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! Common test utilities for adoption integration tests

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use adoption::config::AdoptionConfig;
use adoption::domain::repo::{
    AdminRepository, AdopterRepository, ApplicationRepository, BreederRepository, CasOutcome,
    CounterUpdate, Repositories, ReportUpdate, ReviewRepository, StatsRevision, UniqueInsert,
};
use adoption::domain::service::AdoptionService;
use adoption::infra::{InMemoryStore, in_memory_repositories};
use adoption::AdoptionLocalClient;
use adoption_sdk::{
    ActorContext, Admin, AdminPermissions, Adopter, AdoptionApi, AdoptionError, Application,
    ApplicationStatus, Breeder, BreederReport, FileUrlResolver, NewApplication,
    PetAvailabilityLookup, PetStatus, ReceivedApplication, ReportStatus, Review, ReviewReport,
    StatusReceipt, Verification, VerificationStatus,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use time::OffsetDateTime;
use tokio::sync::Notify;
use uuid::Uuid;

/// Pet catalog stub keyed by `(breeder_id, pet_id)`.
#[derive(Default)]
pub struct StubPets {
    pets: Mutex<HashMap<(Uuid, Uuid), PetStatus>>,
}

#[async_trait]
impl PetAvailabilityLookup for StubPets {
    async fn pet_status(&self, breeder_id: Uuid, pet_id: Uuid) -> anyhow::Result<Option<PetStatus>> {
        Ok(self.pets.lock().get(&(breeder_id, pet_id)).copied())
    }
}

pub struct StubFiles;

impl FileUrlResolver for StubFiles {
    fn resolve(&self, file_key: &str) -> String {
        format!("https://files.test/{file_key}?sig=stub")
    }
}

/// Breeder repository that can be told to fail the next N mirror writes.
pub struct FlakyBreeders {
    inner: Arc<InMemoryStore>,
    failing_mirror_writes: AtomicUsize,
}

impl FlakyBreeders {
    fn should_fail(&self) -> bool {
        self.failing_mirror_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl BreederRepository for FlakyBreeders {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Breeder>> {
        BreederRepository::get(self.inner.as_ref(), id).await
    }

    async fn insert(&self, breeder: Breeder) -> anyhow::Result<()> {
        BreederRepository::insert(self.inner.as_ref(), breeder).await
    }

    async fn list(&self, status: Option<VerificationStatus>) -> anyhow::Result<Vec<Breeder>> {
        self.inner.list(status).await
    }

    async fn set_verification(
        &self,
        id: Uuid,
        expected: VerificationStatus,
        verification: Verification,
    ) -> anyhow::Result<CasOutcome<Verification>> {
        self.inner.set_verification(id, expected, verification).await
    }

    async fn upsert_received_application(
        &self,
        id: Uuid,
        entry: ReceivedApplication,
    ) -> anyhow::Result<bool> {
        if self.should_fail() {
            anyhow::bail!("injected mirror write failure");
        }
        self.inner.upsert_received_application(id, entry).await
    }

    async fn stats_revision(&self, id: Uuid) -> anyhow::Result<Option<StatsRevision>> {
        self.inner.stats_revision(id).await
    }

    async fn record_received_application(
        &self,
        id: Uuid,
        application_id: Uuid,
    ) -> anyhow::Result<CounterUpdate> {
        self.inner.record_received_application(id, application_id).await
    }

    async fn record_completed_adoption(
        &self,
        id: Uuid,
        application_id: Uuid,
    ) -> anyhow::Result<CounterUpdate> {
        self.inner.record_completed_adoption(id, application_id).await
    }

    async fn reset_application_counters(
        &self,
        id: Uuid,
        expected_revision: u64,
        application_ids: Vec<Uuid>,
        completed_application_ids: Vec<Uuid>,
    ) -> anyhow::Result<CasOutcome<u64>> {
        self.inner
            .reset_application_counters(
                id,
                expected_revision,
                application_ids,
                completed_application_ids,
            )
            .await
    }

    async fn set_review_stats(
        &self,
        id: Uuid,
        expected_revision: u64,
        average_rating: f64,
        total_reviews: u64,
    ) -> anyhow::Result<CasOutcome<u64>> {
        self.inner
            .set_review_stats(id, expected_revision, average_rating, total_reviews)
            .await
    }

    async fn increment_profile_views(&self, id: Uuid) -> anyhow::Result<Option<Breeder>> {
        self.inner.increment_profile_views(id).await
    }

    async fn push_report(&self, id: Uuid, report: BreederReport) -> anyhow::Result<bool> {
        self.inner.push_report(id, report).await
    }

    async fn update_report(
        &self,
        id: Uuid,
        report_id: Uuid,
        expected: ReportStatus,
        update: ReportUpdate,
    ) -> anyhow::Result<CasOutcome<BreederReport>> {
        BreederRepository::update_report(self.inner.as_ref(), id, report_id, expected, update).await
    }
}

/// Handles for one paused per-breeder listing.
#[derive(Clone, Default)]
pub struct ListingPause {
    /// Notified once the listing has read its rows.
    pub reached: Arc<Notify>,
    /// Lets the paused caller continue.
    pub release: Arc<Notify>,
}

impl ListingPause {
    async fn hold(&self) {
        self.reached.notify_one();
        self.release.notified().await;
    }
}

/// Slot armed by a test; the next listing takes it and pauses after reading.
#[derive(Default)]
struct PauseSlot(Mutex<Option<ListingPause>>);

impl PauseSlot {
    fn arm(&self) -> ListingPause {
        let pause = ListingPause::default();
        *self.0.lock() = Some(pause.clone());
        pause
    }

    async fn hold_if_armed(&self) {
        let armed = self.0.lock().take();
        if let Some(pause) = armed {
            pause.hold().await;
        }
    }
}

/// Application repository whose per-breeder listing can be paused once.
pub struct PausingApplications {
    inner: Arc<InMemoryStore>,
    slot: PauseSlot,
}

#[async_trait]
impl ApplicationRepository for PausingApplications {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Application>> {
        ApplicationRepository::get(self.inner.as_ref(), id).await
    }

    async fn insert_unique_pending(
        &self,
        application: Application,
    ) -> anyhow::Result<UniqueInsert> {
        self.inner.insert_unique_pending(application).await
    }

    async fn insert(&self, application: Application) -> anyhow::Result<()> {
        ApplicationRepository::insert(self.inner.as_ref(), application).await
    }

    async fn find_pending(
        &self,
        adopter_id: Uuid,
        breeder_id: Uuid,
    ) -> anyhow::Result<Option<Application>> {
        self.inner.find_pending(adopter_id, breeder_id).await
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: ApplicationStatus,
        status: ApplicationStatus,
        processed_at: OffsetDateTime,
        notes: Option<String>,
    ) -> anyhow::Result<CasOutcome<Application>> {
        self.inner
            .compare_and_set_status(id, expected, status, processed_at, notes)
            .await
    }

    async fn list_by_breeder(&self, breeder_id: Uuid) -> anyhow::Result<Vec<Application>> {
        let items = ApplicationRepository::list_by_breeder(self.inner.as_ref(), breeder_id).await?;
        self.slot.hold_if_armed().await;
        Ok(items)
    }

    async fn list_by_adopter(&self, adopter_id: Uuid) -> anyhow::Result<Vec<Application>> {
        self.inner.list_by_adopter(adopter_id).await
    }

    async fn status_counts(&self) -> anyhow::Result<HashMap<ApplicationStatus, usize>> {
        self.inner.status_counts().await
    }
}

/// Review repository whose per-breeder listing can be paused once.
pub struct PausingReviews {
    inner: Arc<InMemoryStore>,
    slot: PauseSlot,
}

#[async_trait]
impl ReviewRepository for PausingReviews {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Review>> {
        ReviewRepository::get(self.inner.as_ref(), id).await
    }

    async fn insert_unique(&self, review: Review) -> anyhow::Result<UniqueInsert> {
        self.inner.insert_unique(review).await
    }

    async fn hide(&self, id: Uuid) -> anyhow::Result<CasOutcome<Review>> {
        self.inner.hide(id).await
    }

    async fn flag_reported(
        &self,
        id: Uuid,
        report: ReviewReport,
    ) -> anyhow::Result<Option<Review>> {
        self.inner.flag_reported(id, report).await
    }

    async fn update_report(
        &self,
        id: Uuid,
        expected: ReportStatus,
        update: ReportUpdate,
    ) -> anyhow::Result<CasOutcome<Review>> {
        ReviewRepository::update_report(self.inner.as_ref(), id, expected, update).await
    }

    async fn list_by_breeder(&self, breeder_id: Uuid) -> anyhow::Result<Vec<Review>> {
        let items = ReviewRepository::list_by_breeder(self.inner.as_ref(), breeder_id).await?;
        self.slot.hold_if_armed().await;
        Ok(items)
    }

    async fn list_reported(&self) -> anyhow::Result<Vec<Review>> {
        self.inner.list_reported().await
    }

    async fn count_hidden(&self) -> anyhow::Result<usize> {
        self.inner.count_hidden().await
    }
}

/// A fully wired engine over one in-memory store.
pub struct Harness {
    pub client: Arc<dyn AdoptionApi>,
    pub service: Arc<AdoptionService>,
    pub store: Arc<InMemoryStore>,
    pub pets: Arc<StubPets>,
    flaky: Arc<FlakyBreeders>,
    applications: Arc<PausingApplications>,
    reviews: Arc<PausingReviews>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(AdoptionConfig::default())
    }

    pub fn with_config(config: AdoptionConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let flaky = Arc::new(FlakyBreeders {
            inner: store.clone(),
            failing_mirror_writes: AtomicUsize::new(0),
        });
        let applications = Arc::new(PausingApplications {
            inner: store.clone(),
            slot: PauseSlot::default(),
        });
        let reviews = Arc::new(PausingReviews {
            inner: store.clone(),
            slot: PauseSlot::default(),
        });
        let repos = Repositories {
            breeders: flaky.clone(),
            applications: applications.clone(),
            reviews: reviews.clone(),
            ..in_memory_repositories(&store)
        };
        let pets = Arc::new(StubPets::default());
        let service = Arc::new(AdoptionService::new(
            repos,
            pets.clone(),
            Arc::new(StubFiles),
            config,
        ));
        let client: Arc<dyn AdoptionApi> = Arc::new(AdoptionLocalClient::new(service.clone()));
        Self {
            client,
            service,
            store,
            pets,
            flaky,
            applications,
            reviews,
        }
    }

    /// Makes the next `n` breeder mirror writes fail.
    pub fn fail_next_mirror_writes(&self, n: usize) {
        self.flaky.failing_mirror_writes.store(n, Ordering::SeqCst);
    }

    /// Pauses the next per-breeder application listing right after it reads.
    pub fn pause_next_application_listing(&self) -> ListingPause {
        self.applications.slot.arm()
    }

    /// Pauses the next per-breeder review listing right after it reads.
    pub fn pause_next_review_listing(&self) -> ListingPause {
        self.reviews.slot.arm()
    }

    pub fn set_pet(&self, breeder_id: Uuid, pet_id: Uuid, status: PetStatus) {
        self.pets.pets.lock().insert((breeder_id, pet_id), status);
    }

    /// Inserts an approved breeder.
    pub async fn breeder(&self, name: &str) -> Uuid {
        let mut breeder = Breeder::new(Uuid::new_v4(), name);
        breeder.verification.status = VerificationStatus::Approved;
        breeder.profile_image = Some(format!("profiles/{name}.jpg"));
        breeder.location = Some("Portland".to_owned());
        let id = breeder.id;
        BreederRepository::insert(self.store.as_ref(), breeder)
            .await
            .unwrap();
        id
    }

    /// Inserts a breeder that has not been verified yet.
    pub async fn unverified_breeder(&self, name: &str) -> Uuid {
        let breeder = Breeder::new(Uuid::new_v4(), name);
        let id = breeder.id;
        BreederRepository::insert(self.store.as_ref(), breeder)
            .await
            .unwrap();
        id
    }

    pub async fn adopter(&self, name: &str) -> Uuid {
        let adopter = Adopter::new(Uuid::new_v4(), name);
        let id = adopter.id;
        AdopterRepository::insert(self.store.as_ref(), adopter)
            .await
            .unwrap();
        id
    }

    pub async fn admin(&self, name: &str, permissions: AdminPermissions) -> Uuid {
        let admin = Admin::new(Uuid::new_v4(), name, permissions);
        let id = admin.id;
        AdminRepository::insert(self.store.as_ref(), admin)
            .await
            .unwrap();
        id
    }

    pub async fn stored_breeder(&self, id: Uuid) -> Breeder {
        BreederRepository::get(self.store.as_ref(), id)
            .await
            .unwrap()
            .expect("breeder exists")
    }

    pub async fn stored_admin(&self, id: Uuid) -> Admin {
        AdminRepository::get(self.store.as_ref(), id)
            .await
            .unwrap()
            .expect("admin exists")
    }

    pub async fn submit(
        &self,
        adopter_id: Uuid,
        breeder_id: Uuid,
    ) -> Result<StatusReceipt<ApplicationStatus>, AdoptionError> {
        self.client
            .submit_application(
                &ActorContext::adopter(adopter_id),
                NewApplication {
                    breeder_id,
                    privacy_consent: true,
                    ..NewApplication::default()
                },
            )
            .await
    }

    pub async fn advance(
        &self,
        breeder_id: Uuid,
        application_id: Uuid,
        status: ApplicationStatus,
    ) -> Result<StatusReceipt<ApplicationStatus>, AdoptionError> {
        self.client
            .advance_application(
                &ActorContext::breeder(breeder_id),
                application_id,
                status,
                None,
            )
            .await
    }
}
