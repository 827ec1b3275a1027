mod common;

use common::{ids, photo, MockStore};
use media_sweep::deletion::{DeletionError, DeletionExecutor};
use media_sweep::media::MediaStoreError;
use media_sweep::trash::TrashLedger;

fn store_with(ids: &[String]) -> MockStore {
    MockStore::with_items(ids.iter().map(|id| (photo(id, 2022), 10)))
}

#[test]
fn test_partial_success_prunes_only_confirmed() {
    let requested = ids(0..10);
    let store = store_with(&requested);
    store.fail_deleting(&requested[7..]);

    let mut ledger = TrashLedger::in_memory();
    for id in &requested {
        ledger.stage(id);
    }

    let outcome = DeletionExecutor::new(&store).delete(&requested);

    assert!(outcome.is_partial());
    assert_eq!(outcome.requested(), 10);
    assert_eq!(outcome.confirmed(), 7);
    assert_eq!(outcome.unconfirmed(), &requested[7..]);

    ledger.mark_removed(outcome.confirmed_ids(&requested));
    assert_eq!(ledger.all_ids(), requested[7..].to_vec());
    assert_eq!(store.len(), 3);
}

#[test]
fn test_full_success() {
    let requested = ids(0..4);
    let store = store_with(&requested);

    let outcome = DeletionExecutor::new(&store).delete(&requested);

    assert!(outcome.is_complete());
    assert_eq!(outcome.confirmed(), 4);
    assert!(outcome.error().is_none());
    assert_eq!(store.len(), 0);
    assert_eq!(store.deletes(), 1);
}

#[test]
fn test_empty_request_touches_nothing() {
    let store = store_with(&ids(0..2));

    let outcome = DeletionExecutor::new(&store).delete(&[]);

    assert!(outcome.is_nothing_to_delete());
    assert_eq!(outcome.error(), Some(&DeletionError::NothingToDelete));
    assert_eq!(store.deletes(), 0);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_revoked_permission_confirms_nothing() {
    let requested = ids(0..5);
    let store = store_with(&requested);
    store.fail_delete_with(MediaStoreError::PermissionRevoked);

    let mut ledger = TrashLedger::in_memory();
    for id in &requested {
        ledger.stage(id);
    }

    let outcome = DeletionExecutor::new(&store).delete(&requested);

    assert!(outcome.is_failure());
    assert_eq!(outcome.confirmed(), 0);
    assert_eq!(outcome.unconfirmed(), requested.as_slice());
    assert_eq!(outcome.error(), Some(&DeletionError::PermissionRevoked));
    assert_eq!(ledger.mark_removed(outcome.confirmed_ids(&requested)), 0);
    assert_eq!(ledger.count(), 5);
}

#[test]
fn test_resolve_failure_skips_bulk_delete() {
    let requested = ids(0..3);
    let store = store_with(&requested);
    store.fail_resolve_with(MediaStoreError::PermissionDenied);

    let outcome = DeletionExecutor::new(&store).delete(&requested);

    assert_eq!(outcome.error(), Some(&DeletionError::PermissionDenied));
    assert_eq!(store.deletes(), 0);
}

#[test]
fn test_user_cancellation_is_not_an_error_to_show() {
    let requested = ids(0..2);
    let store = store_with(&requested);
    store.fail_delete_with(MediaStoreError::Cancelled);

    let outcome = DeletionExecutor::new(&store).delete(&requested);

    assert!(outcome.is_failure());
    assert!(!outcome.error().unwrap().is_user_visible());
    assert_eq!(store.len(), 2);
}

#[test]
fn test_ids_already_gone_count_as_confirmed() {
    let present = ids(0..2);
    let store = store_with(&present);
    let mut requested = present.clone();
    requested.extend(ids(10..13));

    let outcome = DeletionExecutor::new(&store).delete(&requested);

    assert!(outcome.is_complete());
    assert_eq!(outcome.confirmed(), 5);
    assert_eq!(store.len(), 0);
}

#[test]
fn test_everything_already_gone_skips_bulk_delete() {
    let store = MockStore::new();
    let requested = ids(0..3);

    let outcome = DeletionExecutor::new(&store).delete(&requested);

    assert!(outcome.is_complete());
    assert_eq!(outcome.confirmed(), 3);
    assert_eq!(store.deletes(), 0);
}

#[test]
fn test_nothing_removed_is_a_failure() {
    let requested = ids(0..3);
    let store = store_with(&requested);
    store.fail_deleting(&requested);

    let outcome = DeletionExecutor::new(&store).delete(&requested);

    assert!(outcome.is_failure());
    assert_eq!(outcome.confirmed(), 0);
    assert!(outcome.error().unwrap().is_retryable());
}

#[test]
fn test_duplicate_ids_are_requested_once() {
    let store = store_with(&ids(0..2));
    let mut requested = ids(0..2);
    requested.push(requested[0].clone());

    let outcome = DeletionExecutor::new(&store).delete(&requested);

    assert_eq!(outcome.requested(), 2);
    assert_eq!(outcome.confirmed(), 2);
}
