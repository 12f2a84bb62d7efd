// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Transaction identifiers and lifecycle states.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Identifier for one optimistic mutation attempt.
///
/// Issued by [`TxnIdGenerator::next`] or [`generate_txn_id`].
///
/// # Invariants
/// - `origin` is drawn once per generator from process-start entropy, so ids
///   from two generators (or two processes) do not collide in practice.
/// - `seq` starts at `1` and increases monotonically. The counter may wrap at
///   `u64::MAX`; when it does the generator resumes at `1` (zero is reserved).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TxnId {
    origin: u32,
    seq: u64,
}

impl TxnId {
    /// Constructs a `TxnId` from raw parts.
    ///
    /// Intended for adapters that round-trip ids through another layer (UI
    /// bindings, logs). Ids built this way are not checked for liveness.
    #[must_use]
    pub const fn from_parts(origin: u32, seq: u64) -> Self {
        Self { origin, seq }
    }

    /// Entropy tag of the generator that issued this id.
    #[must_use]
    pub const fn origin(self) -> u32 {
        self.origin
    }

    /// Position of this id in its generator's sequence.
    #[must_use]
    pub const fn seq(self) -> u64 {
        self.seq
    }
}

impl core::fmt::Display for TxnId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:08x}-{}", self.origin, self.seq)
    }
}

/// Issues unique [`TxnId`]s. Safe to share between tasks.
#[derive(Debug)]
pub struct TxnIdGenerator {
    origin: u32,
    counter: AtomicU64,
}

impl Default for TxnIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TxnIdGenerator {
    /// Creates a generator tagged with fresh random entropy.
    pub fn new() -> Self {
        Self::with_origin(rand::random())
    }

    /// Creates a generator with a fixed origin tag (useful for reproducible logs in tests).
    pub const fn with_origin(origin: u32) -> Self {
        Self {
            origin,
            counter: AtomicU64::new(0),
        }
    }

    /// Returns the next identifier.
    pub fn next(&self) -> TxnId {
        // Increment with wrap and never hand out 0.
        let mut seq = self
            .counter
            .fetch_add(1, Ordering::Relaxed)
            .wrapping_add(1);
        if seq == 0 {
            seq = self
                .counter
                .fetch_add(1, Ordering::Relaxed)
                .wrapping_add(1);
        }
        TxnId {
            origin: self.origin,
            seq,
        }
    }
}

/// Returns a process-unique transaction id from the shared generator.
pub fn generate_txn_id() -> TxnId {
    static GENERATOR: OnceLock<TxnIdGenerator> = OnceLock::new();
    GENERATOR.get_or_init(TxnIdGenerator::new).next()
}

/// Lifecycle state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxnState {
    /// Id issued, nothing captured yet.
    Created,
    /// Pre-mutation slice saved and loading notice shown.
    Snapshotted,
    /// Optimistic edit dispatched against the live store.
    OptimisticApplied,
    /// Server confirmed; snapshot discarded.
    Committed,
    /// Server call failed; slice restored from the snapshot.
    RolledBack,
}

impl TxnState {
    /// True for `Committed` and `RolledBack`.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }

    /// Whether `self -> next` is a legal lifecycle step.
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Snapshotted)
                | (Self::Snapshotted, Self::OptimisticApplied)
                | (Self::OptimisticApplied, Self::Committed | Self::RolledBack)
        )
    }
}

impl core::fmt::Display for TxnState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Snapshotted => "snapshotted",
            Self::OptimisticApplied => "optimistic_applied",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        };
        f.write_str(name)
    }
}

/// Bookkeeping for one in-flight transaction.
#[derive(Debug, Clone)]
pub struct Transaction {
    id: TxnId,
    slice: &'static str,
    state: TxnState,
    created_at: Instant,
}

impl Transaction {
    /// Starts a transaction against `slice` in the `Created` state.
    pub fn new(id: TxnId, slice: &'static str) -> Self {
        Self {
            id,
            slice,
            state: TxnState::Created,
            created_at: Instant::now(),
        }
    }

    /// Transaction id.
    pub const fn id(&self) -> TxnId {
        self.id
    }

    /// Name of the slice this transaction targets.
    pub const fn slice(&self) -> &'static str {
        self.slice
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> TxnState {
        self.state
    }

    /// When the transaction was created.
    pub const fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Moves to `next`. Illegal steps are ignored and reported as `false`.
    pub fn advance(&mut self, next: TxnState) -> bool {
        if !self.state.can_advance_to(next) {
            tracing::warn!(txn = %self.id, from = %self.state, to = %next, "illegal transaction step");
            return false;
        }
        tracing::debug!(txn = %self.id, from = %self.state, to = %next, "transaction step");
        self.state = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_starts_at_one_and_increments() {
        let ids = TxnIdGenerator::with_origin(7);
        assert_eq!(ids.next(), TxnId::from_parts(7, 1));
        assert_eq!(ids.next(), TxnId::from_parts(7, 2));
    }

    #[test]
    fn generator_skips_zero_on_wrap() {
        let ids = TxnIdGenerator {
            origin: 1,
            counter: AtomicU64::new(u64::MAX - 1),
        };
        assert_eq!(ids.next().seq(), u64::MAX);
        assert_eq!(ids.next().seq(), 1);
    }

    #[test]
    fn display_is_origin_hex_then_seq() {
        assert_eq!(TxnId::from_parts(0xab, 42).to_string(), "000000ab-42");
    }

    #[test]
    fn lifecycle_only_moves_forward() {
        use TxnState::{Committed, Created, OptimisticApplied, RolledBack, Snapshotted};
        assert!(Created.can_advance_to(Snapshotted));
        assert!(Snapshotted.can_advance_to(OptimisticApplied));
        assert!(OptimisticApplied.can_advance_to(Committed));
        assert!(OptimisticApplied.can_advance_to(RolledBack));
        assert!(!Created.can_advance_to(OptimisticApplied));
        assert!(!Committed.can_advance_to(RolledBack));
        assert!(!RolledBack.can_advance_to(Committed));
        assert!(Committed.is_terminal() && RolledBack.is_terminal());
    }

    #[test]
    fn illegal_advance_leaves_state_unchanged() {
        let mut txn = Transaction::new(TxnId::from_parts(1, 1), "letters");
        assert!(!txn.advance(TxnState::Committed));
        assert_eq!(txn.state(), TxnState::Created);
        assert!(txn.advance(TxnState::Snapshotted));
        assert_eq!(txn.state(), TxnState::Snapshotted);
    }
}
