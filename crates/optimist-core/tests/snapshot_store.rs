// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]

use optimist_core::entities::{JoiningLetter, JoiningLetterPatch, Ticket, JOINING_LETTERS};
use optimist_core::reducer::apply_optimistic_patch;
use optimist_core::{MemoryStore, SnapshotStore, StateStore, TxnId};
use optimist_dry_tests::{letter_slice, REVIEWED_AT};

#[test]
fn delete_is_idempotent() {
    let snapshots = SnapshotStore::new();
    let txn = TxnId::from_parts(3, 1);
    snapshots.save(txn, JOINING_LETTERS.name(), letter_slice());
    snapshots.delete(txn);
    snapshots.delete(txn);
    assert!(!snapshots.contains(txn));
    assert!(snapshots.get::<JoiningLetter>(txn).is_none());
    assert!(snapshots.is_empty());

    // Never saved at all.
    snapshots.delete(TxnId::from_parts(3, 99));
}

#[test]
fn snapshot_is_isolated_from_later_store_writes() {
    let store = MemoryStore::new().with_slice(&JOINING_LETTERS, letter_slice());
    let snapshots = SnapshotStore::new();
    let txn = TxnId::from_parts(3, 2);
    snapshots.save(
        txn,
        JOINING_LETTERS.name(),
        store.read(&JOINING_LETTERS).unwrap(),
    );

    assert!(store.dispatch(&JOINING_LETTERS, |live| {
        apply_optimistic_patch(live, &"L1".to_string(), &JoiningLetterPatch::verified(REVIEWED_AT))
    }));
    assert!(store.dispatch(&JOINING_LETTERS, |live| {
        let mut next = live.clone();
        next.items.clear();
        next
    }));

    let snap = snapshots.get::<JoiningLetter>(txn).unwrap();
    assert_eq!(snap.slice, Some(letter_slice()));
    assert_eq!(snap.slice_name, "joiningLetters");
}

#[test]
fn snapshots_are_independent_per_txn() {
    let snapshots = SnapshotStore::new();
    let first = TxnId::from_parts(3, 3);
    let second = TxnId::from_parts(3, 4);
    let before = letter_slice();
    let after = apply_optimistic_patch(
        &before,
        &"L1".to_string(),
        &JoiningLetterPatch::rejected(REVIEWED_AT, "blurry"),
    );
    snapshots.save(first, JOINING_LETTERS.name(), before.clone());
    snapshots.save(second, JOINING_LETTERS.name(), after.clone());
    assert_eq!(snapshots.len(), 2);

    snapshots.delete(first);
    assert_eq!(snapshots.get::<JoiningLetter>(second).unwrap().slice, Some(after));
    assert!(snapshots.get::<JoiningLetter>(first).is_none());
}

#[test]
fn reading_with_the_wrong_entity_type_is_absent() {
    let snapshots = SnapshotStore::new();
    let txn = TxnId::from_parts(3, 5);
    snapshots.save(txn, JOINING_LETTERS.name(), letter_slice());
    assert!(snapshots.get::<Ticket>(txn).is_none());
    assert!(snapshots.contains(txn));
}

#[test]
fn clones_share_entries() {
    let snapshots = SnapshotStore::new();
    let view = snapshots.clone();
    let txn = TxnId::from_parts(3, 6);
    snapshots.save(txn, JOINING_LETTERS.name(), letter_slice());
    assert!(view.contains(txn));
    view.delete(txn);
    assert!(snapshots.is_empty());
}
