// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Notification sink that records every call for later assertions.

use optimist_core::{Notice, NoticeStatus, NotificationSink, TxnId};
use std::sync::{Arc, Mutex, PoisonError};

/// One call received by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// `show` was called.
    Show {
        /// Transaction.
        txn: TxnId,
        /// Status shown.
        status: NoticeStatus,
        /// Message shown.
        message: String,
    },
    /// `dismiss` was called.
    Dismiss(TxnId),
}

/// Records calls and tracks what a real toast area would currently display.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far, in order.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Calls that concern `txn`, in order.
    pub fn events_for(&self, txn: TxnId) -> Vec<SinkEvent> {
        self.events()
            .into_iter()
            .filter(|e| match e {
                SinkEvent::Show { txn: t, .. } | SinkEvent::Dismiss(t) => *t == txn,
            })
            .collect()
    }

    /// Statuses shown for `txn`, in order.
    pub fn statuses_for(&self, txn: TxnId) -> Vec<NoticeStatus> {
        self.events_for(txn)
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Show { status, .. } => Some(status),
                SinkEvent::Dismiss(_) => None,
            })
            .collect()
    }

    /// Replays the calls and returns what would be on screen: at most one entry per txn.
    pub fn on_screen(&self) -> Vec<(TxnId, NoticeStatus, String)> {
        let mut screen: Vec<(TxnId, NoticeStatus, String)> = Vec::new();
        for event in self.events() {
            match event {
                SinkEvent::Show {
                    txn,
                    status,
                    message,
                } => {
                    if let Some(slot) = screen.iter_mut().find(|(t, ..)| *t == txn) {
                        *slot = (txn, status, message);
                    } else {
                        screen.push((txn, status, message));
                    }
                }
                SinkEvent::Dismiss(txn) => screen.retain(|(t, ..)| *t != txn),
            }
        }
        screen
    }
}

impl NotificationSink for RecordingSink {
    fn show(&self, notice: &Notice) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SinkEvent::Show {
                txn: notice.txn,
                status: notice.status,
                message: notice.message.clone(),
            });
    }

    fn dismiss(&self, txn: TxnId) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SinkEvent::Dismiss(txn));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optimist_core::{DismissDelays, StatusNotifier};

    #[test]
    fn screen_replay_collapses_updates() {
        let sink = RecordingSink::new();
        let notifier = StatusNotifier::new(Arc::new(sink.clone()), DismissDelays::default());
        let a = TxnId::from_parts(9, 1);
        let b = TxnId::from_parts(9, 2);
        notifier.loading(a, "saving a");
        notifier.loading(b, "saving b");
        notifier.error(a, "nope");
        notifier.dismiss(b);

        assert_eq!(
            sink.on_screen(),
            vec![(a, NoticeStatus::Error, "nope".to_string())]
        );
        assert_eq!(
            sink.statuses_for(a),
            vec![NoticeStatus::Loading, NoticeStatus::Error]
        );
        assert_eq!(sink.events().len(), 4);
    }
}
