//! Loan ledger behaviour against in-memory directories

mod common;

use std::sync::Arc;
use std::time::Duration;

use loan_ledger::{
    cache::EntityCache,
    config::CacheConfig,
    error::{AppError, ConflictKind, InvalidStateKind, NotFoundKind},
    models::{EntityRef, UpdateMember},
    repository::{ItemDirectory, MemberDirectory, Repository},
    services::Services,
    LoanLedger,
};

use common::{Fixture, SlowItems, SlowJournal};

fn assert_not_found(err: AppError, expected: NotFoundKind) {
    match err {
        AppError::NotFound { kind, .. } => assert_eq!(kind, expected),
        other => panic!("expected NotFound({:?}), got {:?}", expected, other),
    }
}

fn assert_conflict(err: AppError, expected: ConflictKind) {
    match err {
        AppError::Conflict { kind, .. } => assert_eq!(kind, expected),
        other => panic!("expected Conflict({:?}), got {:?}", expected, other),
    }
}

#[tokio::test]
async fn test_borrow_return_scenario() {
    let fx = Fixture::new();
    let ledger = fx.ledger();
    let b1 = fx.item("9780441013593").await;
    let m1 = fx.member("m1@example.org").await;
    let m2 = fx.member("m2@example.org").await;

    let receipt = ledger.borrow(b1.id, m1.id).await.unwrap();
    assert_eq!((receipt.item_id, receipt.member_id), (b1.id, m1.id));

    let err = ledger.borrow(b1.id, m2.id).await.unwrap_err();
    assert_conflict(err, ConflictKind::AlreadyBorrowed);

    let returned = ledger.return_item(b1.id, m1.id).await.unwrap();
    assert_eq!(returned.record_id, receipt.record_id);

    let err = ledger.return_item(b1.id, m1.id).await.unwrap_err();
    assert_not_found(err, NotFoundKind::ActiveLoan);
}

#[tokio::test]
async fn test_round_trip_to_another_member() {
    let fx = Fixture::new();
    let ledger = fx.ledger();
    let item = fx.item("9780441013593").await;
    let first = fx.member("first@example.org").await;
    let second = fx.member("second@example.org").await;

    ledger.borrow(item.id, first.id).await.unwrap();
    ledger.return_item(item.id, first.id).await.unwrap();
    ledger.borrow(item.id, second.id).await.unwrap();

    let state = ledger.snapshot(item.id).await.unwrap();
    assert_eq!(state.available, Some(false));
    assert_eq!(state.open_record.unwrap().member_id(), second.id);

    let history = ledger.records_for_item(item.id);
    assert_eq!(history.len(), 2);
    assert!(!history[0].is_open());
    assert!(history[1].is_open());
}

#[tokio::test]
async fn test_returning_the_wrong_member_is_not_found() {
    let fx = Fixture::new();
    let ledger = fx.ledger();
    let item = fx.item("9780441013593").await;
    let holder = fx.member("holder@example.org").await;
    let other = fx.member("other@example.org").await;

    ledger.borrow(item.id, holder.id).await.unwrap();

    let err = ledger.return_item(item.id, other.id).await.unwrap_err();
    assert_not_found(err, NotFoundKind::ActiveLoan);
    assert!(ledger.is_currently_borrowed(item.id));
}

#[tokio::test]
async fn test_precondition_order() {
    let fx = Fixture::new();
    let ledger = fx.ledger();
    let item = fx.item("9780441013593").await;
    let member = fx.member("m@example.org").await;

    // Missing item wins over missing member
    assert_not_found(ledger.borrow(999, 998).await.unwrap_err(), NotFoundKind::Item);
    assert_not_found(ledger.borrow(item.id, 998).await.unwrap_err(), NotFoundKind::Member);
    assert_not_found(ledger.borrow(999, member.id).await.unwrap_err(), NotFoundKind::Item);

    // Nothing changed
    assert!(!ledger.is_currently_borrowed(item.id));
    assert!(fx.items.get(item.id).await.unwrap().unwrap().available);
}

#[tokio::test]
async fn test_deletion_guard_follows_loans() {
    let fx = Fixture::new();
    let ledger = fx.ledger();
    let item = fx.item("9780441013593").await;
    let member = fx.member("m@example.org").await;

    assert!(ledger.can_delete(EntityRef::Item(item.id)));
    ledger.borrow(item.id, member.id).await.unwrap();
    assert!(!ledger.can_delete(EntityRef::Item(item.id)));
    assert!(!ledger.can_delete(EntityRef::Member(member.id)));

    let err = ledger
        .remove_guarded(EntityRef::Item(item.id), || fx.items.remove(item.id))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidState { kind: InvalidStateKind::HasActiveLoans, .. }
    ));
    assert!(fx.items.exists(item.id).await.unwrap());

    ledger.return_item(item.id, member.id).await.unwrap();
    assert!(ledger.can_delete(EntityRef::Item(item.id)));
    assert!(ledger.can_delete(EntityRef::Member(member.id)));

    ledger
        .remove_guarded(EntityRef::Member(member.id), || fx.members.remove(member.id))
        .await
        .unwrap();
    assert!(!fx.members.exists(member.id).await.unwrap());

    let err = ledger
        .remove_guarded(EntityRef::Member(member.id), || fx.members.remove(member.id))
        .await
        .unwrap_err();
    assert_not_found(err, NotFoundKind::Member);
}

#[tokio::test]
async fn test_return_after_item_vanished_still_closes_loan() {
    let fx = Fixture::new();
    let ledger = fx.ledger();
    let item = fx.item("9780441013593").await;
    let member = fx.member("m@example.org").await;

    ledger.borrow(item.id, member.id).await.unwrap();
    // Removed behind the ledger's back
    assert!(fx.items.remove(item.id).await.unwrap());

    ledger.return_item(item.id, member.id).await.unwrap();
    assert!(!ledger.is_currently_borrowed(item.id));
    assert!(ledger.open_loans_for_member(member.id).is_empty());
}

#[tokio::test]
async fn test_drift_between_flag_and_records_is_refused() {
    let fx = Fixture::new();
    let ledger = fx.ledger();
    let item = fx.item("9780441013593").await;
    let holder = fx.member("holder@example.org").await;
    let other = fx.member("other@example.org").await;

    ledger.borrow(item.id, holder.id).await.unwrap();
    // Someone flips the flag directly in the directory
    fx.items.set_available(item.id, true).await.unwrap();

    assert_conflict(
        ledger.borrow(item.id, holder.id).await.unwrap_err(),
        ConflictKind::DuplicateBorrow,
    );
    assert_conflict(
        ledger.borrow(item.id, other.id).await.unwrap_err(),
        ConflictKind::AlreadyBorrowed,
    );
    assert_eq!(ledger.open_loan_count(), 1);

    let report = ledger.reconcile().await.unwrap();
    assert_eq!(report.marked_unavailable, vec![item.id]);
    assert!(ledger.snapshot(item.id).await.unwrap().is_consistent());
}

#[tokio::test]
async fn test_reconcile_frees_stranded_items() {
    let fx = Fixture::new();
    let ledger = fx.ledger();
    let stranded = fx.item("9780441013593").await;
    let fine = fx.item("9780575104419").await;
    fx.items.set_available(stranded.id, false).await.unwrap();

    let report = ledger.reconcile().await.unwrap();

    assert_eq!(report.checked, 2);
    assert_eq!(report.marked_available, vec![stranded.id]);
    assert!(report.marked_unavailable.is_empty());
    assert!(fx.items.get(stranded.id).await.unwrap().unwrap().available);
    assert!(fx.items.get(fine.id).await.unwrap().unwrap().available);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_borrows_have_a_single_winner() {
    let fx = Fixture::new();
    let item = fx.item("9780441013593").await;
    let mut members = Vec::new();
    for i in 0..24 {
        members.push(fx.member(&format!("m{}@example.org", i)).await);
    }

    let repository = Repository {
        items: Arc::new(SlowItems {
            inner: fx.items.clone(),
            delay: Duration::from_millis(2),
        }),
        ..fx.repository.clone()
    };
    let ledger = Arc::new(LoanLedger::new(&repository));

    let handles: Vec<_> = members
        .iter()
        .map(|member| {
            let ledger = ledger.clone();
            let (item_id, member_id) = (item.id, member.id);
            tokio::spawn(async move { ledger.borrow(item_id, member_id).await })
        })
        .collect();

    let mut winners = 0;
    let mut losers = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(AppError::Conflict {
                kind: ConflictKind::AlreadyBorrowed,
                ..
            }) => losers += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(losers, members.len() - 1);
    assert_eq!(ledger.open_loan_count(), 1);
    assert!(ledger.snapshot(item.id).await.unwrap().is_consistent());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_invariant_holds_under_mixed_traffic() {
    let fx = Fixture::new();
    let mut items = Vec::new();
    for i in 0..4 {
        items.push(fx.item(&format!("978044101359{}", i)).await);
    }
    let mut members = Vec::new();
    for i in 0..6 {
        members.push(fx.member(&format!("m{}@example.org", i)).await);
    }

    let repository = Repository {
        items: Arc::new(SlowItems {
            inner: fx.items.clone(),
            delay: Duration::from_millis(1),
        }),
        ..fx.repository.clone()
    };
    let ledger = Arc::new(LoanLedger::new(&repository));

    let mut handles = Vec::new();
    for round in 0..10 {
        for (i, item) in items.iter().enumerate() {
            let member = &members[(i + round) % members.len()];
            let ledger = ledger.clone();
            let (item_id, member_id) = (item.id, member.id);
            handles.push(tokio::spawn(async move {
                if ledger.borrow(item_id, member_id).await.is_ok() {
                    tokio::task::yield_now().await;
                    ledger.return_item(item_id, member_id).await.unwrap();
                }
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for item in &items {
        let state = ledger.snapshot(item.id).await.unwrap();
        assert!(state.is_consistent());
        assert_eq!(state.available, Some(true));
    }
    assert_eq!(ledger.open_loan_count(), 0);
}

#[tokio::test]
async fn test_borrow_invalidates_cached_item() {
    let services = Services::new(Repository::in_memory(), &CacheConfig::default());
    let item = services
        .catalog
        .create_item(common::book("9780441013593"))
        .await
        .unwrap();
    let member = services
        .members
        .create_member(common::patron("m@example.org"))
        .await
        .unwrap();

    // Warm the cache
    assert!(services.catalog.get_item(item.id).await.unwrap().available);
    assert_eq!(services.catalog.list_items().await.unwrap().len(), 1);

    services.loans.borrow(item.id, member.id).await.unwrap();

    let details = services.catalog.get_item_details(item.id).await.unwrap();
    assert!(!details.item.available);
    assert!(details.currently_borrowed);
    assert!(!services.catalog.list_items().await.unwrap()[0].available);

    services.loans.return_item(item.id, member.id).await.unwrap();
    assert!(services.catalog.get_item(item.id).await.unwrap().available);
}

#[tokio::test]
async fn test_ledger_cache_hook() {
    let fx = Fixture::new();
    let cache = Arc::new(EntityCache::new(&CacheConfig::default()));
    let ledger = fx.ledger().with_item_cache(cache.clone());
    let item = fx.item("9780441013593").await;
    let member = fx.member("m@example.org").await;

    cache
        .get_or_load(&item.id, || fx.items.get(item.id))
        .await
        .unwrap();
    assert_eq!(cache.len(), 1);

    ledger.borrow(item.id, member.id).await.unwrap();
    assert!(cache.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_item_details_wait_for_loan_in_flight() {
    let fx = Fixture::new();
    let item = fx.item("9780441013593").await;
    let member = fx.member("m@example.org").await;
    let repository = Repository {
        journal: Some(Arc::new(SlowJournal {
            delay: Duration::from_millis(300),
        })),
        ..fx.repository.clone()
    };
    let services = Services::new(repository, &CacheConfig::default());
    let (item_id, member_id) = (item.id, member.id);

    // Flag already written, journal still pending
    let loans = services.loans.clone();
    let borrow = tokio::spawn(async move { loans.borrow(item_id, member_id).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let details = services.catalog.get_item_details(item_id).await.unwrap();
    assert!(!details.item.available);
    assert!(details.currently_borrowed);
    borrow.await.unwrap().unwrap();

    let loans = services.loans.clone();
    let give_back = tokio::spawn(async move { loans.return_item(item_id, member_id).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let details = services.catalog.get_item_details(item_id).await.unwrap();
    assert!(details.item.available);
    assert!(!details.currently_borrowed);
    give_back.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_failed_update_keeps_cached_entry() {
    let fx = Fixture::new();
    let services = Services::new(fx.repository.clone(), &CacheConfig::default());
    let first = fx.member("first@example.org").await;
    let second = fx.member("second@example.org").await;

    // Warm the cache, then change the row behind it
    assert_eq!(services.members.get_member(second.id).await.unwrap().name, second.name);
    let renamed = UpdateMember {
        name: Some("Renamed".to_string()),
        ..Default::default()
    };
    fx.members.update(second.id, &renamed).await.unwrap();

    let taken = UpdateMember {
        email: Some(first.email.clone()),
        ..Default::default()
    };
    let err = services.members.update_member(second.id, taken).await.unwrap_err();
    assert_conflict(err, ConflictKind::DuplicateEmail);

    // Still served from the cache
    assert_eq!(services.members.get_member(second.id).await.unwrap().name, second.name);

    let update = UpdateMember {
        phone: Some("+1 555 0199".to_string()),
        ..Default::default()
    };
    services.members.update_member(second.id, update).await.unwrap();
    assert_eq!(services.members.get_member(second.id).await.unwrap().name, "Renamed");
}
