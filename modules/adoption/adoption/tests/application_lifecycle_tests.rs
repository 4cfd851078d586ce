#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for application submission, status transitions and the breeder mirror

mod common;

use std::collections::BTreeMap;

use adoption::config::AdoptionConfig;
use adoption_sdk::{
    ActorContext, AdminAction, AdminPermissions, ApplicationStatus, ConflictKind, ListQuery,
    NewApplication, PetStatus,
};
use common::Harness;
use uuid::Uuid;

use ApplicationStatus::{
    AdoptionApproved, AdoptionRejected, ConsultationCompleted, ConsultationPending,
};

// =============================================================================
// Submission
// =============================================================================

#[tokio::test]
async fn test_submit_creates_ledger_entry_and_mirror() {
    let h = Harness::new();
    let breeder = h.breeder("Maple Hill").await;
    let adopter = h.adopter("Jordan").await;

    let receipt = h.submit(adopter, breeder).await.unwrap();
    assert_eq!(receipt.status, ConsultationPending);

    let stored = h.stored_breeder(breeder).await;
    assert_eq!(stored.stats.total_applications, 1);
    assert_eq!(stored.received_applications.len(), 1);
    let mirror = &stored.received_applications[0];
    assert_eq!(mirror.application_id, receipt.id);
    assert_eq!(mirror.adopter_name, "Jordan");
    assert_eq!(mirror.status, ConsultationPending);
}

#[tokio::test]
async fn test_duplicate_pending_submission_conflicts() {
    let h = Harness::new();
    let breeder = h.breeder("Maple Hill").await;
    let adopter = h.adopter("Jordan").await;

    h.submit(adopter, breeder).await.unwrap();
    let err = h.submit(adopter, breeder).await.unwrap_err();
    assert_eq!(err.conflict_kind(), Some(ConflictKind::PendingApplication));

    // The failed attempt leaves no trace on the breeder.
    let stored = h.stored_breeder(breeder).await;
    assert_eq!(stored.stats.total_applications, 1);
    assert_eq!(stored.received_applications.len(), 1);
}

#[tokio::test]
async fn test_resubmission_allowed_once_previous_is_settled() {
    let h = Harness::new();
    let breeder = h.breeder("Maple Hill").await;
    let adopter = h.adopter("Jordan").await;

    let first = h.submit(adopter, breeder).await.unwrap();
    h.advance(breeder, first.id, AdoptionRejected).await.unwrap();

    let second = h.submit(adopter, breeder).await.unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(h.stored_breeder(breeder).await.stats.total_applications, 2);
}

#[tokio::test]
async fn test_best_effort_duplicate_check_when_not_enforced() {
    let h = Harness::with_config(AdoptionConfig {
        enforce_unique_pending: false,
        ..AdoptionConfig::default()
    });
    let breeder = h.breeder("Maple Hill").await;
    let adopter = h.adopter("Jordan").await;

    h.submit(adopter, breeder).await.unwrap();
    let err = h.submit(adopter, breeder).await.unwrap_err();
    assert_eq!(err.conflict_kind(), Some(ConflictKind::PendingApplication));
}

#[tokio::test]
async fn test_submit_preconditions() {
    let h = Harness::new();
    let breeder = h.breeder("Maple Hill").await;
    let adopter = h.adopter("Jordan").await;
    let ctx = ActorContext::adopter(adopter);

    let err = h
        .client
        .submit_application(
            &ctx,
            NewApplication {
                breeder_id: breeder,
                privacy_consent: false,
                ..NewApplication::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = h.submit(adopter, Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found());

    let err = h.submit(Uuid::new_v4(), breeder).await.unwrap_err();
    assert!(err.is_not_found());

    let err = h
        .client
        .submit_application(
            &ActorContext::breeder(breeder),
            NewApplication {
                breeder_id: breeder,
                privacy_consent: true,
                ..NewApplication::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_forbidden());

    assert_eq!(h.stored_breeder(breeder).await.stats.total_applications, 0);
}

#[tokio::test]
async fn test_submit_checks_pet_availability() {
    let h = Harness::new();
    let breeder = h.breeder("Maple Hill").await;
    let adopter = h.adopter("Jordan").await;
    let ctx = ActorContext::adopter(adopter);

    let (available, reserved) = (Uuid::new_v4(), Uuid::new_v4());
    h.set_pet(breeder, available, PetStatus::Available);
    h.set_pet(breeder, reserved, PetStatus::Reserved);

    let application = |pet_id| NewApplication {
        breeder_id: breeder,
        pet_id: Some(pet_id),
        form_answers: BTreeMap::from([("home".to_owned(), "house with yard".to_owned())]),
        privacy_consent: true,
    };

    let err = h
        .client
        .submit_application(&ctx, application(reserved))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = h
        .client
        .submit_application(&ctx, application(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let receipt = h
        .client
        .submit_application(&ctx, application(available))
        .await
        .unwrap();
    let stored = h.client.get_application(&ctx, receipt.id).await.unwrap();
    assert_eq!(stored.pet_id, Some(available));
    assert_eq!(stored.form_answers["home"], "house with yard");
}

#[tokio::test]
async fn test_suspended_adopter_cannot_submit() {
    let h = Harness::new();
    let breeder = h.breeder("Maple Hill").await;
    let adopter = h.adopter("Jordan").await;
    let admin = h.admin("Root", AdminPermissions::all()).await;

    h.client
        .set_adopter_account_status(
            &ActorContext::admin(admin),
            adopter,
            adoption_sdk::AccountStatus::Suspended,
        )
        .await
        .unwrap();

    let err = h.submit(adopter, breeder).await.unwrap_err();
    assert!(err.is_validation());

    let entries = h.client.recent_admin_activity(&ActorContext::admin(admin)).await.unwrap();
    assert_eq!(entries[0].action, AdminAction::SuspendUser);
}

// =============================================================================
// Transitions
// =============================================================================

#[tokio::test]
async fn test_approve_then_retry_counts_once() {
    let h = Harness::new();
    let breeder = h.breeder("Maple Hill").await;
    let adopter = h.adopter("Jordan").await;

    let app = h.submit(adopter, breeder).await.unwrap();
    let first = h.advance(breeder, app.id, AdoptionApproved).await.unwrap();
    assert_eq!(first.status, AdoptionApproved);

    // Simulated network retry of the same call.
    let retry = h.advance(breeder, app.id, AdoptionApproved).await.unwrap();
    assert_eq!(retry.status, AdoptionApproved);
    assert_eq!(retry.id, app.id);

    let stored = h.stored_breeder(breeder).await;
    assert_eq!(stored.stats.completed_adoptions, 1);
    assert_eq!(stored.received_applications[0].status, AdoptionApproved);
}

#[tokio::test]
async fn test_completed_adoptions_count_distinct_applications() {
    let h = Harness::new();
    let breeder = h.breeder("Maple Hill").await;

    let mut approved = 0;
    for (i, target) in [AdoptionApproved, AdoptionRejected, AdoptionApproved]
        .into_iter()
        .enumerate()
    {
        let adopter = h.adopter(&format!("adopter-{i}")).await;
        let app = h.submit(adopter, breeder).await.unwrap();
        h.advance(breeder, app.id, ConsultationCompleted).await.unwrap();
        h.advance(breeder, app.id, target).await.unwrap();
        h.advance(breeder, app.id, target).await.unwrap();
        if target == AdoptionApproved {
            approved += 1;
        }
    }

    let stored = h.stored_breeder(breeder).await;
    assert_eq!(stored.stats.completed_adoptions, approved);
    assert_eq!(stored.stats.total_applications, 3);
}

#[tokio::test]
async fn test_terminal_status_is_final() {
    let h = Harness::new();
    let breeder = h.breeder("Maple Hill").await;
    let adopter = h.adopter("Jordan").await;

    let app = h.submit(adopter, breeder).await.unwrap();
    h.advance(breeder, app.id, AdoptionRejected).await.unwrap();

    for target in [ConsultationPending, ConsultationCompleted, AdoptionApproved] {
        let err = h.advance(breeder, app.id, target).await.unwrap_err();
        assert!(err.is_validation(), "{target} should be rejected");
    }

    let stored = h
        .client
        .get_application(&ActorContext::breeder(breeder), app.id)
        .await
        .unwrap();
    assert_eq!(stored.status, AdoptionRejected);
    assert_eq!(h.stored_breeder(breeder).await.stats.completed_adoptions, 0);
}

#[tokio::test]
async fn test_only_owning_breeder_may_advance() {
    let h = Harness::new();
    let breeder = h.breeder("Maple Hill").await;
    let other = h.breeder("Cedar Run").await;
    let adopter = h.adopter("Jordan").await;

    let app = h.submit(adopter, breeder).await.unwrap();

    let err = h.advance(other, app.id, AdoptionApproved).await.unwrap_err();
    assert!(err.is_forbidden());

    let err = h
        .client
        .advance_application(&ActorContext::adopter(adopter), app.id, AdoptionApproved, None)
        .await
        .unwrap_err();
    assert!(err.is_forbidden());

    let err = h.advance(breeder, Uuid::new_v4(), AdoptionApproved).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_notes_and_processed_at_recorded() {
    let h = Harness::new();
    let breeder = h.breeder("Maple Hill").await;
    let adopter = h.adopter("Jordan").await;
    let app = h.submit(adopter, breeder).await.unwrap();

    h.client
        .advance_application(
            &ActorContext::breeder(breeder),
            app.id,
            ConsultationCompleted,
            Some("video call went well".to_owned()),
        )
        .await
        .unwrap();

    let stored = h
        .client
        .get_application(&ActorContext::adopter(adopter), app.id)
        .await
        .unwrap();
    assert_eq!(stored.notes.as_deref(), Some("video call went well"));
    assert!(stored.processed_at.is_some());

    let mirror = h.stored_breeder(breeder).await.received_applications[0].clone();
    assert_eq!(mirror.status, ConsultationCompleted);
    assert_eq!(mirror.processed_at, stored.processed_at);
}

// =============================================================================
// Partial failure and read-repair
// =============================================================================

#[tokio::test]
async fn test_mirror_failure_surfaces_and_retry_repairs() {
    let h = Harness::new();
    let breeder = h.breeder("Maple Hill").await;
    let adopter = h.adopter("Jordan").await;
    let app = h.submit(adopter, breeder).await.unwrap();

    h.fail_next_mirror_writes(1);
    let err = h.advance(breeder, app.id, AdoptionApproved).await.unwrap_err();
    assert!(matches!(err, adoption_sdk::AdoptionError::Internal(_)));

    // Ledger write is kept; mirror and counter lag behind.
    let ledger = h
        .client
        .get_application(&ActorContext::breeder(breeder), app.id)
        .await
        .unwrap();
    assert_eq!(ledger.status, AdoptionApproved);
    let stored = h.stored_breeder(breeder).await;
    assert_eq!(stored.received_applications[0].status, ConsultationPending);
    assert_eq!(stored.stats.completed_adoptions, 0);

    // Retrying the same call converges both.
    h.advance(breeder, app.id, AdoptionApproved).await.unwrap();
    let stored = h.stored_breeder(breeder).await;
    assert_eq!(stored.received_applications[0].status, AdoptionApproved);
    assert_eq!(stored.stats.completed_adoptions, 1);
}

#[tokio::test]
async fn test_retried_submit_projects_application_left_by_failed_attempt() {
    for enforce_unique_pending in [true, false] {
        let h = Harness::with_config(AdoptionConfig {
            enforce_unique_pending,
            ..AdoptionConfig::default()
        });
        let breeder = h.breeder("Maple Hill").await;
        let adopter = h.adopter("Jordan").await;

        h.fail_next_mirror_writes(1);
        let err = h.submit(adopter, breeder).await.unwrap_err();
        assert!(matches!(err, adoption_sdk::AdoptionError::Internal(_)));
        assert!(h.stored_breeder(breeder).await.received_applications.is_empty());

        // The retry still reports the pending application, and catches up its mirror entry.
        let err = h.submit(adopter, breeder).await.unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::PendingApplication));

        let stored = h.stored_breeder(breeder).await;
        assert_eq!(stored.received_applications.len(), 1, "enforced: {enforce_unique_pending}");
        assert_eq!(stored.received_applications[0].status, ConsultationPending);
        assert_eq!(stored.stats.total_applications, 1);

        // Further retries change nothing.
        h.submit(adopter, breeder).await.unwrap_err();
        let stored = h.stored_breeder(breeder).await;
        assert_eq!(stored.received_applications.len(), 1);
        assert_eq!(stored.stats.total_applications, 1);
    }
}

#[tokio::test]
async fn test_repair_application_mirror() {
    let h = Harness::new();
    let breeder = h.breeder("Maple Hill").await;
    let adopter = h.adopter("Jordan").await;
    let app = h.submit(adopter, breeder).await.unwrap();

    h.fail_next_mirror_writes(1);
    h.advance(breeder, app.id, ConsultationCompleted)
        .await
        .unwrap_err();

    let err = h
        .client
        .repair_application_mirror(&ActorContext::adopter(adopter), app.id)
        .await
        .unwrap_err();
    assert!(err.is_forbidden());

    let receipt = h
        .client
        .repair_application_mirror(&ActorContext::breeder(breeder), app.id)
        .await
        .unwrap();
    assert_eq!(receipt.status, ConsultationCompleted);
    assert_eq!(
        h.stored_breeder(breeder).await.received_applications[0].status,
        ConsultationCompleted
    );
}

// =============================================================================
// Admin override and reads
// =============================================================================

#[tokio::test]
async fn test_admin_override_obeys_transition_table() {
    let h = Harness::new();
    let breeder = h.breeder("Maple Hill").await;
    let adopter = h.adopter("Jordan").await;
    let admin = h.admin("Root", AdminPermissions::all()).await;
    let limited = h
        .admin(
            "Reports only",
            AdminPermissions {
                can_manage_reports: true,
                ..AdminPermissions::default()
            },
        )
        .await;
    let app = h.submit(adopter, breeder).await.unwrap();

    let err = h
        .client
        .override_application_status(&ActorContext::admin(limited), app.id, AdoptionApproved, None)
        .await
        .unwrap_err();
    assert!(err.is_forbidden());

    let receipt = h
        .client
        .override_application_status(
            &ActorContext::admin(admin),
            app.id,
            AdoptionApproved,
            Some("resolved by support".to_owned()),
        )
        .await
        .unwrap();
    assert_eq!(receipt.status, AdoptionApproved);
    assert_eq!(h.stored_breeder(breeder).await.stats.completed_adoptions, 1);

    let err = h
        .client
        .override_application_status(&ActorContext::admin(admin), app.id, AdoptionRejected, None)
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let log = h.stored_admin(admin).await.activity_logs;
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].action, AdminAction::OverrideApplication);
    assert_eq!(log[0].target_id, app.id);
}

#[tokio::test]
async fn test_application_lists_are_scoped_and_paginated() {
    let h = Harness::new();
    let breeder = h.breeder("Maple Hill").await;
    let other_breeder = h.breeder("Cedar Run").await;

    let mut ids = Vec::new();
    for i in 0..5 {
        let adopter = h.adopter(&format!("adopter-{i}")).await;
        ids.push(h.submit(adopter, breeder).await.unwrap().id);
    }
    let outsider = h.adopter("outsider").await;
    h.submit(outsider, other_breeder).await.unwrap();
    h.advance(breeder, ids[0], ConsultationCompleted).await.unwrap();

    let ctx = ActorContext::breeder(breeder);
    let page = h
        .client
        .list_breeder_applications(&ctx, None, ListQuery::new(0, 2))
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 2);
    assert!(page.items.iter().all(|a| a.breeder_id == breeder));

    let completed = h
        .client
        .list_breeder_applications(&ctx, Some(ConsultationCompleted), ListQuery::default())
        .await
        .unwrap();
    assert_eq!(completed.total, 1);
    assert_eq!(completed.items[0].id, ids[0]);

    let mine = h
        .client
        .list_adopter_applications(&ActorContext::adopter(outsider), ListQuery::default())
        .await
        .unwrap();
    assert_eq!(mine.total, 1);

    let err = h
        .client
        .get_application(&ActorContext::adopter(outsider), ids[1])
        .await
        .unwrap_err();
    assert!(err.is_forbidden());
}
