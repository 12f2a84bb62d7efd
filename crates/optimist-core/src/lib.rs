// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Optimistic mutations for client-side state stores.
//!
//! A mutation edits the local slice before the server answers, shows one
//! status notice for its transaction, and either commits or restores the
//! slice from a snapshot when the server call fails. The store, the server
//! call, and the notice sink are all supplied by the caller.

pub mod config;
pub mod entities;
pub mod error;
pub mod notify;
pub mod orchestrator;
pub mod recipe;
pub mod reducer;
pub mod settings;
pub mod slice;
pub mod snapshot;
pub mod state;
pub mod txn;

pub use error::MutationError;
pub use notify::{DismissDelays, Notice, NoticeStatus, NotificationSink, StatusNotifier, TracingSink};
pub use orchestrator::{Orchestrator, TxnOutcome};
pub use recipe::{MutationKind, MutationRecipe, OptimisticEdit};
pub use settings::{ContentionPolicy, TxnSettings};
pub use slice::{Entity, Pagination, Slice, SliceKey};
pub use snapshot::{Snapshot, SnapshotStore};
pub use state::{MemoryStore, StateStore};
pub use txn::{generate_txn_id, Transaction, TxnId, TxnIdGenerator, TxnState};
