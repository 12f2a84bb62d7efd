// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Status notices keyed by transaction: one mutable entry per txn that moves
//! from loading to success or error and then dismisses itself.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::txn::TxnId;

/// Notice state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeStatus {
    /// Mutation in flight.
    Loading,
    /// Server confirmed the mutation.
    Success,
    /// Mutation failed and was rolled back.
    Error,
}

impl core::fmt::Display for NoticeStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Error => "error",
        })
    }
}

/// Rendering-friendly view of a notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Transaction this notice reports on.
    pub txn: TxnId,
    /// Current state.
    pub status: NoticeStatus,
    /// Human-readable text.
    pub message: String,
    /// Last time status or message changed.
    pub updated_at: Instant,
}

/// Where notices are rendered. Formatting is entirely the sink's business.
pub trait NotificationSink: Send + Sync {
    /// Show `notice`, replacing whatever is shown for `notice.txn`.
    fn show(&self, notice: &Notice);
    /// Remove the notice for `txn`.
    fn dismiss(&self, txn: TxnId);
}

/// Sink that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn show(&self, notice: &Notice) {
        match notice.status {
            NoticeStatus::Error => {
                tracing::warn!(txn = %notice.txn, message = %notice.message, "notice: error");
            }
            status => {
                tracing::info!(txn = %notice.txn, %status, message = %notice.message, "notice");
            }
        }
    }

    fn dismiss(&self, txn: TxnId) {
        tracing::debug!(%txn, "notice dismissed");
    }
}

/// How long settled notices stay visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DismissDelays {
    /// Delay after `success`.
    pub success: Duration,
    /// Delay after `error`.
    pub error: Duration,
}

impl Default for DismissDelays {
    fn default() -> Self {
        Self {
            success: Duration::from_millis(2000),
            error: Duration::from_millis(4000),
        }
    }
}

struct Entry {
    notice: Notice,
    // Bumped on every update; a timer only fires for the generation that armed it.
    generation: u64,
    timer: Option<AbortHandle>,
}

#[derive(Default)]
struct Board {
    entries: HashMap<TxnId, Entry>,
}

/// Keeps exactly one visible notice per transaction and forwards changes to a sink.
///
/// Cloning shares the board.
#[derive(Clone)]
pub struct StatusNotifier {
    board: Arc<Mutex<Board>>,
    sink: Arc<dyn NotificationSink>,
    delays: DismissDelays,
}

impl StatusNotifier {
    /// Create a notifier that forwards to `sink`.
    pub fn new(sink: Arc<dyn NotificationSink>, delays: DismissDelays) -> Self {
        Self {
            board: Arc::new(Mutex::new(Board::default())),
            sink,
            delays,
        }
    }

    /// Show (or reset) the notice for `txn` in loading state. Loading notices never auto-dismiss.
    pub fn loading(&self, txn: TxnId, message: impl Into<String>) {
        self.set(txn, NoticeStatus::Loading, message.into(), None);
    }

    /// Move the notice for `txn` to success and arm its dismiss timer.
    pub fn success(&self, txn: TxnId, message: impl Into<String>) {
        self.set(
            txn,
            NoticeStatus::Success,
            message.into(),
            Some(self.delays.success),
        );
    }

    /// Move the notice for `txn` to error and arm its dismiss timer.
    pub fn error(&self, txn: TxnId, message: impl Into<String>) {
        self.set(txn, NoticeStatus::Error, message.into(), Some(self.delays.error));
    }

    /// Remove the notice for `txn` now, cancelling any pending timer.
    pub fn dismiss(&self, txn: TxnId) {
        let removed = {
            let mut board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
            board.entries.remove(&txn)
        };
        if let Some(entry) = removed {
            if let Some(timer) = entry.timer {
                timer.abort();
            }
            self.sink.dismiss(txn);
        }
    }

    /// Current notice for `txn`.
    pub fn get(&self, txn: TxnId) -> Option<Notice> {
        self.board
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .get(&txn)
            .map(|e| e.notice.clone())
    }

    /// Every visible notice, ordered by transaction id.
    pub fn visible(&self) -> Vec<Notice> {
        let board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<Notice> = board.entries.values().map(|e| e.notice.clone()).collect();
        out.sort_by_key(|n| n.txn);
        out
    }

    fn set(&self, txn: TxnId, status: NoticeStatus, message: String, dismiss_after: Option<Duration>) {
        let notice = {
            let mut board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
            let notice = Notice {
                txn,
                status,
                message,
                updated_at: Instant::now(),
            };
            let entry = board.entries.entry(txn).or_insert_with(|| Entry {
                notice: notice.clone(),
                generation: 0,
                timer: None,
            });
            if let Some(stale) = entry.timer.take() {
                stale.abort();
            }
            entry.generation += 1;
            entry.notice = notice.clone();
            if let Some(delay) = dismiss_after {
                entry.timer = self.arm(txn, entry.generation, delay);
            }
            notice
        };
        self.sink.show(&notice);
    }

    fn arm(&self, txn: TxnId, generation: u64, delay: Duration) -> Option<AbortHandle> {
        let Ok(handle) = Handle::try_current() else {
            tracing::warn!(%txn, "no async runtime; notice stays until dismissed");
            return None;
        };
        let notifier = self.clone();
        let task = handle.spawn(async move {
            tokio::time::sleep(delay).await;
            notifier.expire(txn, generation);
        });
        Some(task.abort_handle())
    }

    fn expire(&self, txn: TxnId, generation: u64) {
        let expired = {
            let mut board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
            match board.entries.get(&txn) {
                Some(entry) if entry.generation == generation => {
                    board.entries.remove(&txn);
                    true
                }
                _ => false,
            }
        };
        if expired {
            self.sink.dismiss(txn);
        }
    }
}

impl core::fmt::Debug for StatusNotifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StatusNotifier")
            .field("visible", &self.visible().len())
            .field("delays", &self.delays)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier() -> StatusNotifier {
        StatusNotifier::new(Arc::new(TracingSink), DismissDelays::default())
    }

    #[test]
    fn loading_then_success_keeps_one_entry() {
        let n = notifier();
        let txn = TxnId::from_parts(1, 1);
        n.loading(txn, "a");
        n.success(txn, "b");
        let visible = n.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].status, NoticeStatus::Success);
        assert_eq!(visible[0].message, "b");
    }

    #[test]
    fn error_without_loading_still_surfaces() {
        let n = notifier();
        let txn = TxnId::from_parts(1, 2);
        n.error(txn, "boom");
        assert_eq!(n.get(txn).map(|x| x.status), Some(NoticeStatus::Error));
    }

    #[test]
    fn manual_dismiss_removes_entry() {
        let n = notifier();
        let txn = TxnId::from_parts(1, 3);
        n.loading(txn, "working");
        n.dismiss(txn);
        n.dismiss(txn);
        assert!(n.visible().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn success_auto_dismisses_after_delay() {
        let n = notifier();
        let txn = TxnId::from_parts(1, 4);
        n.loading(txn, "saving");
        n.success(txn, "saved");
        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert!(n.get(txn).is_some());
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(n.get(txn).is_none());
    }
}
