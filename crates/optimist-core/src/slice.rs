// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Slices of shared client state and the entity contract they hold.

use core::fmt;
use core::marker::PhantomData;

use serde::{Deserialize, Serialize};

/// A record type that can live in a [`Slice`] and be patched optimistically.
pub trait Entity: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Identity of the record within its slice.
    type Key: PartialEq + Clone + fmt::Display + fmt::Debug + Send + Sync + 'static;
    /// Partial field update. Fields left unset are not touched by [`Entity::merge`].
    type Patch: Clone + fmt::Debug + Send + Sync + 'static;

    /// Returns the record's key.
    fn key(&self) -> &Self::Key;

    /// Shallow-merges `patch` into `self`.
    fn merge(&mut self, patch: &Self::Patch);

    /// Sets or clears the "not yet confirmed by the server" marker.
    fn set_optimistic(&mut self, optimistic: bool);

    /// Reports the "not yet confirmed by the server" marker.
    fn is_optimistic(&self) -> bool;
}

/// Page position of a list slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// 1-based page index.
    pub page: u32,
    /// Page size requested from the server.
    pub per_page: u32,
    /// Total number of records reported by the server.
    pub total: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
            total: 0,
        }
    }
}

/// A named region of list state: records plus fetch metadata.
///
/// Optimistic reducers only change `items`; `pagination.total` is adjusted
/// when an edit adds or removes a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(serialize = "E: Serialize", deserialize = "E: Deserialize<'de>"))]
pub struct Slice<E> {
    /// Records currently in view.
    pub items: Vec<E>,
    /// Page position of `items`.
    pub pagination: Pagination,
    /// A fetch is outstanding.
    pub loading: bool,
    /// Last fetch error, if any.
    pub error: Option<String>,
}

impl<E> Default for Slice<E> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pagination: Pagination::default(),
            loading: false,
            error: None,
        }
    }
}

impl<E: Entity> Slice<E> {
    /// Builds a loaded slice whose total matches `items`.
    pub fn from_items(items: Vec<E>) -> Self {
        let pagination = Pagination {
            total: items.len() as u64,
            ..Pagination::default()
        };
        Self {
            items,
            pagination,
            ..Self::default()
        }
    }

    /// Looks up a record by key.
    pub fn find(&self, key: &E::Key) -> Option<&E> {
        self.items.iter().find(|e| e.key() == key)
    }
}

/// Typed name of a slice in a [`crate::StateStore`].
///
/// The entity type travels with the name so a read through the wrong key type
/// is caught at compile time where possible and reads as absent otherwise.
pub struct SliceKey<E> {
    name: &'static str,
    _entity: PhantomData<fn() -> E>,
}

impl<E> SliceKey<E> {
    /// Declares a slice name for entity type `E`.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _entity: PhantomData,
        }
    }

    /// The slice's name.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<E> Clone for SliceKey<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for SliceKey<E> {}

impl<E> fmt::Debug for SliceKey<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SliceKey").field(&self.name).finish()
    }
}

impl<E> fmt::Display for SliceKey<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// `serde` helper: skip `false` markers when serializing.
pub(crate) const fn is_false(flag: &bool) -> bool {
    !*flag
}
