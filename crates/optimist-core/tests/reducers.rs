// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]

use optimist_core::entities::{
    JoiningLetter, JoiningLetterPatch, ReviewStatus, Ticket, TicketPatch, TicketStatus,
};
use optimist_core::reducer::{
    apply_optimistic_patch, insert_entity, reconcile, remove_entity, rollback,
};
use optimist_core::{Entity, Slice};
use optimist_dry_tests::{letter_slice, ticket_slice, REVIEWED_AT, SERVER_AT};
use proptest::prelude::*;

fn letters(ids: &[u8]) -> Slice<JoiningLetter> {
    Slice::from_items(
        ids.iter()
            .map(|n| JoiningLetter::pending(format!("L{n}"), format!("S{n}")))
            .collect(),
    )
}

fn any_patch() -> impl Strategy<Value = JoiningLetterPatch> {
    (
        proptest::option::of(prop_oneof![
            Just(ReviewStatus::Pending),
            Just(ReviewStatus::Verified),
            Just(ReviewStatus::Rejected),
        ]),
        any::<bool>(),
        proptest::option::of(proptest::option::of("[a-z ]{0,12}")),
    )
        .prop_map(|(status, stamp, review_remarks)| JoiningLetterPatch {
            status,
            reviewed_at: stamp.then_some(Some(REVIEWED_AT)),
            review_remarks,
        })
}

proptest! {
    #[test]
    fn rollback_after_patch_restores_the_snapshot(
        ids in prop::collection::vec(0u8..40, 0..12),
        target in 0u8..40,
        patch in any_patch(),
    ) {
        let snapshot = letters(&ids);
        let patched = apply_optimistic_patch(&snapshot, &format!("L{target}"), &patch);
        prop_assert_eq!(rollback(&patched, &snapshot), snapshot);
    }

    #[test]
    fn patch_on_missing_key_is_a_no_op(
        ids in prop::collection::vec(0u8..40, 0..12),
        patch in any_patch(),
    ) {
        let slice = letters(&ids);
        prop_assert_eq!(apply_optimistic_patch(&slice, &"missing".to_string(), &patch), slice);
    }

    #[test]
    fn patch_leaves_other_records_alone(
        ids in prop::collection::vec(0u8..40, 1..12),
        patch in any_patch(),
    ) {
        let slice = letters(&ids);
        let target = format!("L{}", ids[0]);
        let next = apply_optimistic_patch(&slice, &target, &patch);
        prop_assert_eq!(next.items.len(), slice.items.len());
        prop_assert_eq!(next.pagination, slice.pagination);
        for (before, after) in slice.items.iter().zip(&next.items) {
            if before.id == target {
                prop_assert!(after.is_optimistic());
            } else {
                prop_assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn remove_then_rollback_restores_total(
        ids in prop::collection::vec(0u8..40, 0..12),
        target in 0u8..40,
    ) {
        let slice = letters(&ids);
        let removed = remove_entity(&slice, &format!("L{target}"));
        let gone = ids.iter().filter(|n| **n == target).count() as u64;
        prop_assert_eq!(removed.pagination.total, slice.pagination.total - gone);
        prop_assert_eq!(rollback(&removed, &slice), slice);
    }
}

#[test]
fn rollback_discards_interleaved_edits() {
    let snapshot = letter_slice();
    let mine = apply_optimistic_patch(&snapshot, &"L1".to_string(), &JoiningLetterPatch::verified(REVIEWED_AT));
    let theirs = apply_optimistic_patch(&mine, &"L2".to_string(), &JoiningLetterPatch::rejected(REVIEWED_AT, "late"));
    assert_eq!(rollback(&theirs, &snapshot), snapshot);
}

#[test]
fn insert_prepends_and_counts() {
    let slice = ticket_slice();
    let next = insert_entity(&slice, &Ticket::open("T9", "New laptop"));
    assert_eq!(next.items[0].id, "T9");
    assert!(next.items[0].is_optimistic);
    assert_eq!(next.pagination.total, 4);
    assert_eq!(&next.items[1..], &slice.items[..]);
}

#[test]
fn reconcile_adopts_server_records() {
    let slice = ticket_slice();
    let mut live = apply_optimistic_patch(
        &slice,
        &"T1".to_string(),
        &TicketPatch {
            status: Some(TicketStatus::InProgress),
            ..TicketPatch::default()
        },
    );
    live.loading = true;
    live.error = Some("stale".into());

    let mut confirmed = Ticket::open("T1", "Cannot upload letter");
    confirmed.status = TicketStatus::InProgress;
    confirmed.updated_at = Some(SERVER_AT);
    let server = Slice::from_items(vec![confirmed.clone()]);

    let next = reconcile(&live, &server);
    assert_eq!(next.items, vec![confirmed]);
    assert_eq!(next.pagination.total, 1);
    assert!(!next.loading);
    assert!(next.error.is_none());
}
