// File: giveabot-core/tests/admission_tests.rs
//
// Entry-ledger admission: uniqueness under concurrency, expected
// outcomes for double submission, and retroactive blacklist revocation.

mod common;

use chrono::{Duration, Utc};
use giveabot_common::models::contest::ContestKind;
use giveabot_common::models::entry::ContestEntry;
use giveabot_common::models::participant::{AdmitOutcome, DenialReason, EnterOutcome};
use giveabot_common::traits::repository_traits::{ContestRepository, EntryRepository};
use giveabot_core::Error;
use giveabot_core::test_utils::memory::MemoryEntryRepository;
use std::sync::Arc;

use common::*;

#[tokio::test]
async fn concurrent_admits_for_same_pair_yield_one_entry() -> Result<(), Error> {
    let repo = Arc::new(MemoryEntryRepository::new());
    let now = Utc::now();

    let mut handles = Vec::new();
    for _ in 0..64 {
        let repo = Arc::clone(&repo);
        let entry = ContestEntry {
            contest_id: "c1".into(),
            user_id: "u1".into(),
            guild_id: "g1".into(),
            kind: ContestKind::Giveaway,
            entered_at: now,
            is_winner: false,
            claimed: false,
        };
        handles.push(tokio::spawn(async move { repo.try_admit(&entry).await }));
    }

    let mut admitted = 0;
    let mut already = 0;
    for h in handles {
        match h.await.unwrap()? {
            AdmitOutcome::Admitted => admitted += 1,
            AdmitOutcome::AlreadyEntered => already += 1,
        }
    }

    assert_eq!(admitted, 1);
    assert_eq!(already, 63);
    assert_eq!(repo.count_for_contest("c1").await?, 1);
    Ok(())
}

#[tokio::test]
async fn concurrent_enters_through_the_service_admit_once() -> Result<(), Error> {
    let h = harness();
    h.service.create_contest(giveaway("g-1", "guild", 2, 1)).await?;

    let mut handles = Vec::new();
    for _ in 0..50 {
        let svc = Arc::clone(&h.service);
        handles.push(tokio::spawn(async move {
            svc.enter("g-1", &snapshot("u1", "guild", &[], false)).await
        }));
    }

    let mut admitted = 0;
    let mut already = 0;
    for hh in handles {
        match hh.await.unwrap()? {
            EnterOutcome::Admitted => admitted += 1,
            EnterOutcome::AlreadyEntered => already += 1,
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert_eq!(admitted, 1);
    assert_eq!(already, 49);
    assert_eq!(h.entries.count_for_contest("g-1").await?, 1);
    Ok(())
}

#[tokio::test]
async fn double_submission_is_already_entered_not_an_error() -> Result<(), Error> {
    let h = harness();
    h.service.create_contest(giveaway("g-1", "guild", 2, 1)).await?;

    let snap = snapshot("u1", "guild", &[], false);
    assert_eq!(h.service.enter("g-1", &snap).await?, EnterOutcome::Admitted);
    assert_eq!(
        h.service.enter("g-1", &snap).await?,
        EnterOutcome::AlreadyEntered
    );
    Ok(())
}

#[tokio::test]
async fn entering_a_drop_is_wrong_category() -> Result<(), Error> {
    let h = harness();
    h.service
        .create_contest(drop_contest("d-1", "guild", 60))
        .await?;

    assert_eq!(
        h.service
            .enter("d-1", &snapshot("u1", "guild", &[], false))
            .await?,
        EnterOutcome::Denied(DenialReason::WrongCategory)
    );
    Ok(())
}

#[tokio::test]
async fn unknown_contest_is_not_found() {
    let h = harness();
    let res = h
        .service
        .enter("missing", &snapshot("u1", "guild", &[], false))
        .await;
    assert!(matches!(res, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn audit_listing_is_ordered_by_entry_time() -> Result<(), Error> {
    let h = harness();
    h.service.create_contest(giveaway("g-1", "guild", 2, 1)).await?;

    let base = Utc::now();
    for (i, user) in ["u3", "u1", "u2"].iter().enumerate() {
        h.entries.seed(ContestEntry {
            contest_id: "g-1".into(),
            user_id: user.to_string(),
            guild_id: "guild".into(),
            kind: ContestKind::Giveaway,
            entered_at: base + Duration::seconds(i as i64),
            is_winner: false,
            claimed: false,
        });
    }

    let listed = h.service.audit_entries("g-1").await?;
    let order: Vec<&str> = listed.iter().map(|e| e.user_id.as_str()).collect();
    assert_eq!(order, vec!["u3", "u1", "u2"]);
    Ok(())
}

#[tokio::test]
async fn blacklisting_revokes_entries_in_active_contests_only() -> Result<(), Error> {
    let h = harness();
    h.service
        .create_contest(giveaway("g-live", "guild", 2, 1))
        .await?;
    h.service
        .create_contest(giveaway("g-done", "guild", 2, 1))
        .await?;

    let snap = snapshot("u1", "guild", &[], false);
    h.service.enter("g-live", &snap).await?;
    h.service.enter("g-done", &snap).await?;
    h.service.end_contest_early("g-done").await?;

    h.service
        .blacklist_user("guild", "u1", &[ContestKind::Giveaway], Some("scalper".into()))
        .await?;

    // Active contest lost the entry, ended one keeps its history.
    assert_eq!(h.entries.count_for_contest("g-live").await?, 0);
    assert_eq!(h.entries.count_for_contest("g-done").await?, 1);

    // And the user is turned away from now on, with the reason attached.
    assert_eq!(
        h.service.enter("g-live", &snap).await?,
        EnterOutcome::Denied(DenialReason::Blacklisted {
            reason: Some("scalper".into())
        })
    );

    // Unblacklisting restores admission.
    h.service
        .unblacklist_user("guild", "u1", &[ContestKind::Giveaway])
        .await?;
    assert_eq!(h.service.enter("g-live", &snap).await?, EnterOutcome::Admitted);
    Ok(())
}

#[tokio::test]
async fn contest_role_rules_gate_admission() -> Result<(), Error> {
    let h = harness();
    let mut c = giveaway("g-1", "guild", 2, 1);
    c.required_role = Some("r-sub".into());
    c.boost_required = true;
    c.blacklisted_roles = vec!["r-banned".into()];
    h.service.create_contest(c).await?;

    assert_eq!(
        h.service
            .enter("g-1", &snapshot("u1", "guild", &[], false))
            .await?,
        EnterOutcome::Denied(DenialReason::MissingRequiredRole)
    );
    assert_eq!(
        h.service
            .enter("g-1", &snapshot("u1", "guild", &["r-sub"], false))
            .await?,
        EnterOutcome::Denied(DenialReason::BoosterOnly)
    );
    assert_eq!(
        h.service
            .enter("g-1", &snapshot("u1", "guild", &["r-sub", "r-banned"], true))
            .await?,
        EnterOutcome::Denied(DenialReason::BlacklistedRole)
    );
    assert_eq!(
        h.service
            .enter("g-1", &snapshot("u1", "guild", &["r-sub"], true))
            .await?,
        EnterOutcome::Admitted
    );
    Ok(())
}

#[tokio::test]
async fn role_rules_can_be_edited_while_active_only() -> Result<(), Error> {
    let h = harness();
    h.service.create_contest(giveaway("g-1", "guild", 2, 1)).await?;

    h.service
        .update_contest_roles("g-1", vec![], vec!["r-banned".into()])
        .await?;
    let stored = h.contests.get_contest("g-1").await?.unwrap();
    assert_eq!(stored.blacklisted_roles, vec!["r-banned".to_string()]);

    h.service.end_contest_early("g-1").await?;
    let res = h
        .service
        .update_contest_roles("g-1", vec![], vec![])
        .await;
    assert!(matches!(res, Err(Error::NotFound(_))));
    Ok(())
}
