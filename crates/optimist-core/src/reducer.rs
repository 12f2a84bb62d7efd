// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pure slice transitions used by optimistic edits, rollback, and refetch.
//!
//! All functions are total: an unknown key leaves the slice as it was, and
//! patches are merged as given.

use crate::slice::{Entity, Slice};

/// Merges `patch` into the record with `key` and marks it optimistic.
///
/// Other records and the slice's metadata are left as they are. A missing
/// key returns an identical slice.
pub fn apply_optimistic_patch<E: Entity>(slice: &Slice<E>, key: &E::Key, patch: &E::Patch) -> Slice<E> {
    let mut next = slice.clone();
    for entity in next.items.iter_mut().filter(|e| e.key() == key) {
        entity.merge(patch);
        entity.set_optimistic(true);
    }
    next
}

/// Drops the record with `key` and shrinks `pagination.total` to match.
pub fn remove_entity<E: Entity>(slice: &Slice<E>, key: &E::Key) -> Slice<E> {
    let mut next = slice.clone();
    let before = next.items.len();
    next.items.retain(|e| e.key() != key);
    let removed = (before - next.items.len()) as u64;
    next.pagination.total = next.pagination.total.saturating_sub(removed);
    next
}

/// Prepends `entity` (marked optimistic) and grows `pagination.total`.
pub fn insert_entity<E: Entity>(slice: &Slice<E>, entity: &E) -> Slice<E> {
    let mut next = slice.clone();
    let mut entity = entity.clone();
    entity.set_optimistic(true);
    next.items.insert(0, entity);
    next.pagination.total = next.pagination.total.saturating_add(1);
    next
}

/// Restores the whole slice from `snapshot`, discarding anything done since.
pub fn rollback<E: Entity>(_live: &Slice<E>, snapshot: &Slice<E>) -> Slice<E> {
    snapshot.clone()
}

/// Adopts server-confirmed records and page position.
///
/// Used after a commit to replace optimistic guesses with what the server
/// actually stored. Loading and error flags are cleared.
pub fn reconcile<E: Entity>(_live: &Slice<E>, authoritative: &Slice<E>) -> Slice<E> {
    let mut items = authoritative.items.clone();
    for entity in &mut items {
        entity.set_optimistic(false);
    }
    Slice {
        items,
        pagination: authoritative.pagination,
        loading: false,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{JoiningLetter, JoiningLetterPatch, ReviewStatus};
    use time::macros::datetime;

    fn slice() -> Slice<JoiningLetter> {
        Slice::from_items(vec![
            JoiningLetter::pending("L1", "S1"),
            JoiningLetter::pending("L2", "S2"),
        ])
    }

    #[test]
    fn patch_touches_only_the_target() {
        let at = datetime!(2024-03-01 10:00 UTC);
        let s = slice();
        let next = apply_optimistic_patch(&s, &"L2".to_string(), &JoiningLetterPatch::verified(at));
        assert_eq!(next.items[0], s.items[0]);
        assert_eq!(next.items[1].reviewed_at, Some(at));
        assert_eq!(next.items[1].status, ReviewStatus::Verified);
        assert!(next.items[1].is_optimistic);
        assert_eq!(next.pagination, s.pagination);
    }

    #[test]
    fn remove_adjusts_total_once() {
        let s = slice();
        let next = remove_entity(&s, &"L1".to_string());
        assert_eq!(next.items.len(), 1);
        assert_eq!(next.pagination.total, 1);
        let again = remove_entity(&next, &"L1".to_string());
        assert_eq!(again, next);
    }

    #[test]
    fn insert_prepends_and_marks() {
        let s = slice();
        let next = insert_entity(&s, &JoiningLetter::pending("L3", "S3"));
        assert_eq!(next.items[0].id, "L3");
        assert!(next.items[0].is_optimistic);
        assert_eq!(next.pagination.total, 3);
    }

    #[test]
    fn reconcile_clears_marks_and_flags() {
        let mut live = apply_optimistic_patch(
            &slice(),
            &"L1".to_string(),
            &JoiningLetterPatch::verified(datetime!(2024-03-01 10:00 UTC)),
        );
        live.loading = true;
        let mut server = live.clone();
        server.error = Some("stale".into());
        let next = reconcile(&live, &server);
        assert!(next.items.iter().all(|e| !e.is_optimistic));
        assert!(!next.loading);
        assert!(next.error.is_none());
    }
}
