// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-transaction copies of slices taken before an optimistic edit.
//!
//! A snapshot is an owned clone of the slice, so nothing done to the live
//! store afterwards can reach it. Rollback restores the whole named slice from
//! here rather than reversing a per-field diff. A slice that was not loaded
//! when the transaction began is recorded as absent, not as an empty list.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::time::Instant;

use crate::slice::{Entity, Slice};
use crate::txn::TxnId;

/// A captured slice and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<E> {
    /// Name of the slice that was captured.
    pub slice_name: &'static str,
    /// The slice as it was before the optimistic edit; `None` when it was not loaded.
    pub slice: Option<Slice<E>>,
    /// When the capture happened.
    pub taken_at: Instant,
}

struct Entry {
    slice_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
    taken_at: Instant,
}

/// Map from transaction id to its captured slice. Cloning shares the map.
#[derive(Clone, Default)]
pub struct SnapshotStore {
    entries: Arc<Mutex<HashMap<TxnId, Entry>>>,
}

impl SnapshotStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves `slice` under `txn`. A second save for the same id replaces the first.
    pub fn save<E: Entity>(&self, txn: TxnId, slice_name: &'static str, slice: Slice<E>) {
        self.insert(txn, slice_name, Some(slice));
    }

    /// Records that `slice_name` held no `E` slice when `txn` began.
    pub fn save_absent<E: Entity>(&self, txn: TxnId, slice_name: &'static str) {
        self.insert::<E>(txn, slice_name, None);
    }

    fn insert<E: Entity>(&self, txn: TxnId, slice_name: &'static str, slice: Option<Slice<E>>) {
        let entry = Entry {
            slice_name,
            value: Box::new(slice),
            taken_at: Instant::now(),
        };
        let previous = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(txn, entry);
        if previous.is_some() {
            tracing::warn!(%txn, slice = slice_name, "snapshot overwritten for live transaction");
        }
    }

    /// Returns a copy of the snapshot for `txn`.
    ///
    /// `None` when nothing is stored or the stored slice holds a different entity type.
    pub fn get<E: Entity>(&self, txn: TxnId) -> Option<Snapshot<E>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(&txn)?;
        let slice = entry.value.downcast_ref::<Option<Slice<E>>>()?.clone();
        Some(Snapshot {
            slice_name: entry.slice_name,
            slice,
            taken_at: entry.taken_at,
        })
    }

    /// Drops the snapshot for `txn`. Deleting an absent id is a no-op.
    pub fn delete(&self, txn: TxnId) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&txn);
    }

    /// Whether a snapshot is held for `txn`.
    pub fn contains(&self, txn: TxnId) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&txn)
    }

    /// Number of live snapshots (transactions not yet settled).
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when no transaction holds a snapshot.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl core::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("live", &self.len())
            .finish()
    }
}
