// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Runs a mutation recipe as an optimistic transaction.
//!
//! Sequence per transaction: issue id, show a loading notice, snapshot the
//! slice and dispatch the optimistic edit in one store step, await the server
//! call, then either commit (success notice, drop snapshot, optional refetch)
//! or roll back (error notice, restore slice, drop snapshot). Everything before
//! the server call happens without yielding, so no other transaction
//! interleaves with it. A transaction whose future is dropped before the call
//! answers is rolled back on the spot.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{OwnedMutexGuard, TryLockError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument, Span};

use crate::error::MutationError;
use crate::notify::{NotificationSink, StatusNotifier};
use crate::recipe::MutationRecipe;
use crate::reducer;
use crate::settings::{ContentionPolicy, TxnSettings};
use crate::slice::{Entity, Slice, SliceKey};
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::state::StateStore;
use crate::txn::{Transaction, TxnId, TxnIdGenerator, TxnState};

/// How a transaction ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxnOutcome<T> {
    /// Server confirmed; `payload` is whatever the call returned.
    Committed {
        /// Transaction id.
        txn: TxnId,
        /// Server-confirmed payload.
        payload: T,
    },
    /// Call failed; the slice was restored.
    RolledBack {
        /// Transaction id.
        txn: TxnId,
        /// Why the call failed.
        error: MutationError,
    },
}

impl<T> TxnOutcome<T> {
    /// Transaction id.
    pub const fn txn(&self) -> TxnId {
        match self {
            Self::Committed { txn, .. } | Self::RolledBack { txn, .. } => *txn,
        }
    }

    /// Terminal state reached.
    pub const fn state(&self) -> TxnState {
        match self {
            Self::Committed { .. } => TxnState::Committed,
            Self::RolledBack { .. } => TxnState::RolledBack,
        }
    }

    /// True when the server confirmed the mutation.
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    /// The failure, for rolled-back transactions.
    pub const fn error(&self) -> Option<&MutationError> {
        match self {
            Self::Committed { .. } => None,
            Self::RolledBack { error, .. } => Some(error),
        }
    }

    /// Converts into a plain `Result`.
    pub fn into_result(self) -> Result<T, MutationError> {
        match self {
            Self::Committed { payload, .. } => Ok(payload),
            Self::RolledBack { error, .. } => Err(error),
        }
    }
}

/// Drives optimistic transactions against a shared [`StateStore`].
///
/// Cloning is cheap and clones share the store, snapshots, and notices.
pub struct Orchestrator<S> {
    store: Arc<S>,
    snapshots: SnapshotStore,
    notifier: StatusNotifier,
    ids: Arc<TxnIdGenerator>,
    settings: Arc<TxnSettings>,
    gates: EntityGates,
}

impl<S> Clone for Orchestrator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            snapshots: self.snapshots.clone(),
            notifier: self.notifier.clone(),
            ids: Arc::clone(&self.ids),
            settings: Arc::clone(&self.settings),
            gates: self.gates.clone(),
        }
    }
}

impl<S> Orchestrator<S>
where
    S: StateStore + 'static,
{
    /// Create an orchestrator over `store` reporting to `sink`.
    pub fn new(store: Arc<S>, sink: Arc<dyn NotificationSink>, settings: TxnSettings) -> Self {
        Self {
            store,
            snapshots: SnapshotStore::new(),
            notifier: StatusNotifier::new(sink, settings.dismiss_delays()),
            ids: Arc::new(TxnIdGenerator::new()),
            settings: Arc::new(settings),
            gates: EntityGates::default(),
        }
    }

    /// Use `ids` instead of a freshly seeded generator.
    pub fn with_id_generator(mut self, ids: TxnIdGenerator) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    /// The shared state store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Snapshots of unsettled transactions.
    pub const fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// Per-transaction notices.
    pub const fn notifier(&self) -> &StatusNotifier {
        &self.notifier
    }

    /// Active settings.
    pub fn settings(&self) -> &TxnSettings {
        &self.settings
    }

    /// Transactions that have applied their edit but not yet settled.
    pub fn in_flight(&self) -> usize {
        self.snapshots.len()
    }

    /// Replace `key`'s records with server truth (refetch reducer).
    pub fn reconcile<E: Entity>(&self, key: &SliceKey<E>, authoritative: Slice<E>) {
        if !self
            .store
            .dispatch(key, |live| reducer::reconcile(live, &authoritative))
        {
            self.store.write(key, reducer::reconcile(&Slice::default(), &authoritative));
        }
    }

    /// Run `recipe` with `call` as the server round trip.
    ///
    /// Never fails: errors come back as [`TxnOutcome::RolledBack`] after the
    /// rollback and error notice have happened. Dropping the returned future
    /// once the edit is applied rolls it back with [`MutationError::Abandoned`].
    pub async fn run<E, T, Fut>(&self, recipe: MutationRecipe<E>, call: Fut) -> TxnOutcome<T>
    where
        E: Entity,
        Fut: Future<Output = Result<T, MutationError>>,
    {
        self.execute(recipe, call, None::<fn() -> std::future::Ready<()>>)
            .await
    }

    /// Like [`Orchestrator::run`], then awaits `refetch` after a commit.
    pub async fn run_and_refetch<E, T, Fut, R, RFut>(
        &self,
        recipe: MutationRecipe<E>,
        call: Fut,
        refetch: R,
    ) -> TxnOutcome<T>
    where
        E: Entity,
        Fut: Future<Output = Result<T, MutationError>>,
        R: FnOnce() -> RFut,
        RFut: Future<Output = ()>,
    {
        self.execute(recipe, call, Some(refetch)).await
    }

    /// Run `recipe` on its own task.
    ///
    /// The transaction settles even if the returned handle is dropped. Unless
    /// an earlier transaction holds the same record, the optimistic edit is in
    /// the store by the time this returns.
    pub fn spawn<E, T, Fut>(&self, recipe: MutationRecipe<E>, call: Fut) -> JoinHandle<TxnOutcome<T>>
    where
        E: Entity,
        T: Send + 'static,
        Fut: Future<Output = Result<T, MutationError>> + Send + 'static,
    {
        self.detach(recipe, call, None::<fn() -> std::future::Ready<()>>)
    }

    /// Like [`Orchestrator::spawn`], then awaits `refetch` after a commit.
    pub fn spawn_and_refetch<E, T, Fut, R, RFut>(
        &self,
        recipe: MutationRecipe<E>,
        call: Fut,
        refetch: R,
    ) -> JoinHandle<TxnOutcome<T>>
    where
        E: Entity,
        T: Send + 'static,
        Fut: Future<Output = Result<T, MutationError>> + Send + 'static,
        R: FnOnce() -> RFut + Send + 'static,
        RFut: Future<Output = ()> + Send + 'static,
    {
        self.detach(recipe, call, Some(refetch))
    }

    fn detach<E, T, Fut, R, RFut>(
        &self,
        recipe: MutationRecipe<E>,
        call: Fut,
        refetch: Option<R>,
    ) -> JoinHandle<TxnOutcome<T>>
    where
        E: Entity,
        T: Send + 'static,
        Fut: Future<Output = Result<T, MutationError>> + Send + 'static,
        R: FnOnce() -> RFut + Send + 'static,
        RFut: Future<Output = ()> + Send + 'static,
    {
        match self.try_admit(&recipe) {
            Ok(pass) => {
                let (pending, span) = self.start(recipe);
                tokio::spawn(pending.settle(call, refetch, pass).instrument(span))
            }
            Err(_) => {
                let this = self.clone();
                tokio::spawn(async move { this.execute(recipe, call, refetch).await })
            }
        }
    }

    async fn execute<E, T, Fut, R, RFut>(
        &self,
        recipe: MutationRecipe<E>,
        call: Fut,
        refetch: Option<R>,
    ) -> TxnOutcome<T>
    where
        E: Entity,
        Fut: Future<Output = Result<T, MutationError>>,
        R: FnOnce() -> RFut,
        RFut: Future<Output = ()>,
    {
        let pass = self.admit(&recipe).await;
        let (pending, span) = self.start(recipe);
        pending.settle(call, refetch, pass).instrument(span).await
    }

    async fn admit<E: Entity>(&self, recipe: &MutationRecipe<E>) -> Option<GatePass> {
        match self.settings.contention {
            ContentionPolicy::SerializePerEntity => Some(self.gates.enter(gate_key(recipe)).await),
            ContentionPolicy::LastResolvedWins => None,
        }
    }

    fn try_admit<E: Entity>(&self, recipe: &MutationRecipe<E>) -> Result<Option<GatePass>, TryLockError> {
        match self.settings.contention {
            ContentionPolicy::SerializePerEntity => self.gates.try_enter(gate_key(recipe)).map(Some),
            ContentionPolicy::LastResolvedWins => Ok(None),
        }
    }

    fn start<E: Entity>(&self, recipe: MutationRecipe<E>) -> (Unsettled<S, E>, Span) {
        let id = self.ids.next();
        let span = tracing::info_span!(
            "txn",
            txn = %id,
            kind = %recipe.kind,
            slice = recipe.slice.name(),
            entity = %recipe.entity_key(),
        );
        let txn = span.in_scope(|| self.begin(id, &recipe));
        let pending = Unsettled {
            orch: self.clone(),
            recipe,
            txn,
            armed: true,
        };
        (pending, span)
    }

    // Steps up to the server call. Must not await.
    fn begin<E: Entity>(&self, id: TxnId, recipe: &MutationRecipe<E>) -> Transaction {
        let mut txn = Transaction::new(id, recipe.slice.name());
        self.notifier.loading(id, recipe.loading_message.clone());
        let snapshots = &self.snapshots;
        let applied = self.store.dispatch(&recipe.slice, |live| {
            snapshots.save(id, recipe.slice.name(), live.clone());
            recipe.apply_optimistic(live)
        });
        if !applied {
            snapshots.save_absent::<E>(id, recipe.slice.name());
        }
        txn.advance(TxnState::Snapshotted);
        if !applied {
            debug!("slice not loaded; optimistic edit skipped");
        }
        txn.advance(TxnState::OptimisticApplied);
        txn
    }

    fn commit<E: Entity>(&self, txn: &mut Transaction, recipe: &MutationRecipe<E>) {
        self.notifier.success(txn.id(), recipe.commit_message.clone());
        self.snapshots.delete(txn.id());
        txn.advance(TxnState::Committed);
        info!(elapsed = ?txn.created_at().elapsed(), "committed");
    }

    fn rollback<E: Entity>(&self, txn: &mut Transaction, recipe: &MutationRecipe<E>, error: &MutationError) {
        let fallback = if recipe.rollback_message.is_empty() {
            self.settings.fallback_error.as_str()
        } else {
            recipe.rollback_message.as_str()
        };
        self.notifier.error(txn.id(), error.user_message(fallback));

        match self.snapshots.get::<E>(txn.id()) {
            Some(Snapshot {
                slice: Some(restored),
                ..
            }) => {
                if !self
                    .store
                    .dispatch(&recipe.slice, |live| reducer::rollback(live, &restored))
                {
                    self.store.write(&recipe.slice, restored);
                }
            }
            Some(Snapshot { slice: None, .. }) => debug!("slice was not loaded; nothing to restore"),
            None => warn!("no snapshot at rollback; slice left as is"),
        }
        self.snapshots.delete(txn.id());
        txn.advance(TxnState::RolledBack);
        warn!(txn = %txn.id(), %error, "rolled back");
    }
}

impl<S> core::fmt::Debug for Orchestrator<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("in_flight", &self.snapshots.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// A transaction past its optimistic edit. Rolls back if dropped while armed.
struct Unsettled<S: StateStore + 'static, E: Entity> {
    orch: Orchestrator<S>,
    recipe: MutationRecipe<E>,
    txn: Transaction,
    armed: bool,
}

impl<S: StateStore + 'static, E: Entity> Unsettled<S, E> {
    async fn settle<T, Fut, R, RFut>(
        mut self,
        call: Fut,
        refetch: Option<R>,
        _pass: Option<GatePass>,
    ) -> TxnOutcome<T>
    where
        Fut: Future<Output = Result<T, MutationError>>,
        R: FnOnce() -> RFut,
        RFut: Future<Output = ()>,
    {
        let result = match self.orch.settings.call_timeout() {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or_else(|_| Err(MutationError::TimedOut(limit))),
            None => call.await,
        };
        self.armed = false;

        match result {
            Ok(payload) => {
                self.orch.commit(&mut self.txn, &self.recipe);
                if let Some(refetch) = refetch {
                    refetch().await;
                    debug!("refetch finished");
                }
                TxnOutcome::Committed {
                    txn: self.txn.id(),
                    payload,
                }
            }
            Err(error) => {
                self.orch.rollback(&mut self.txn, &self.recipe, &error);
                TxnOutcome::RolledBack {
                    txn: self.txn.id(),
                    error,
                }
            }
        }
    }
}

impl<S: StateStore + 'static, E: Entity> Drop for Unsettled<S, E> {
    fn drop(&mut self) {
        if self.armed {
            self.orch
                .rollback(&mut self.txn, &self.recipe, &MutationError::Abandoned);
        }
    }
}

fn gate_key<E: Entity>(recipe: &MutationRecipe<E>) -> String {
    format!("{}/{}", recipe.slice, recipe.entity_key())
}

/// Per-record async locks used by [`ContentionPolicy::SerializePerEntity`].
#[derive(Clone, Default)]
struct EntityGates {
    gates: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl EntityGates {
    fn gate(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the map holds these: a waiter was dropped after the last pass left.
        gates.retain(|_, gate| Arc::strong_count(gate) > 1);
        Arc::clone(gates.entry(key.to_owned()).or_default())
    }

    async fn enter(&self, key: String) -> GatePass {
        let guard = self.gate(&key).lock_owned().await;
        self.pass(key, guard)
    }

    fn try_enter(&self, key: String) -> Result<GatePass, TryLockError> {
        let guard = self.gate(&key).try_lock_owned()?;
        Ok(self.pass(key, guard))
    }

    fn pass(&self, key: String, guard: OwnedMutexGuard<()>) -> GatePass {
        GatePass {
            gates: self.clone(),
            key,
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

struct GatePass {
    gates: EntityGates,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for GatePass {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut gates = self
            .gates
            .gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Only the map still references the gate: nobody is queued.
        if gates
            .get(&self.key)
            .is_some_and(|gate| Arc::strong_count(gate) == 1)
        {
            gates.remove(&self.key);
        }
    }
}
