// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! State store port and the in-process store behind it.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::slice::{Entity, Slice, SliceKey};

/// Storage port for named slices.
///
/// Every method is a single synchronous step: implementations must make each
/// `write`/`dispatch` atomic with respect to other callers.
pub trait StateStore: Send + Sync {
    /// Returns a copy of the slice, or `None` when it is absent or holds a different entity type.
    fn read<E: Entity>(&self, key: &SliceKey<E>) -> Option<Slice<E>>;

    /// Replaces the slice wholesale.
    fn write<E: Entity>(&self, key: &SliceKey<E>, slice: Slice<E>);

    /// Runs `reducer` against the live slice and stores its result in one step.
    ///
    /// Returns `false` (and leaves the store alone) when the slice is absent.
    fn dispatch<E, F>(&self, key: &SliceKey<E>, reducer: F) -> bool
    where
        E: Entity,
        F: FnOnce(&Slice<E>) -> Slice<E>;
}

/// In-memory [`StateStore`] holding slices of any entity type.
#[derive(Default)]
pub struct MemoryStore {
    slices: Mutex<HashMap<&'static str, Box<dyn Any + Send + Sync>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style seed of one slice.
    pub fn with_slice<E: Entity>(self, key: &SliceKey<E>, slice: Slice<E>) -> Self {
        self.write(key, slice);
        self
    }

    /// Names of every slice currently held.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .slices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        names.sort_unstable();
        names
    }
}

impl StateStore for MemoryStore {
    fn read<E: Entity>(&self, key: &SliceKey<E>) -> Option<Slice<E>> {
        let slices = self.slices.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = slices.get(key.name())?;
        let slice = slot.downcast_ref::<Slice<E>>();
        if slice.is_none() {
            tracing::warn!(slice = key.name(), "slice read with mismatched entity type");
        }
        slice.cloned()
    }

    fn write<E: Entity>(&self, key: &SliceKey<E>, slice: Slice<E>) {
        self.slices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.name(), Box::new(slice));
    }

    fn dispatch<E, F>(&self, key: &SliceKey<E>, reducer: F) -> bool
    where
        E: Entity,
        F: FnOnce(&Slice<E>) -> Slice<E>,
    {
        let mut slices = self.slices.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(live) = slices
            .get_mut(key.name())
            .and_then(|slot| slot.downcast_mut::<Slice<E>>())
        else {
            return false;
        };
        *live = reducer(live);
        true
    }
}
