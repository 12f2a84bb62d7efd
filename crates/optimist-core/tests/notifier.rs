// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use optimist_core::{DismissDelays, NoticeStatus, StatusNotifier, TxnId};
use optimist_dry_tests::{RecordingSink, SinkEvent};

fn notifier() -> (StatusNotifier, RecordingSink) {
    let sink = RecordingSink::new();
    let delays = DismissDelays {
        success: Duration::from_millis(100),
        error: Duration::from_millis(300),
    };
    (StatusNotifier::new(Arc::new(sink.clone()), delays), sink)
}

#[tokio::test(start_paused = true)]
async fn one_notice_per_txn_through_its_lifecycle() {
    let (n, sink) = notifier();
    let txn = TxnId::from_parts(5, 1);
    n.loading(txn, "Verifying joining letter...");
    assert_eq!(n.visible().len(), 1);
    n.success(txn, "Joining letter verified");
    assert_eq!(n.visible().len(), 1);
    assert_eq!(sink.on_screen().len(), 1);

    tokio::time::sleep(Duration::from_millis(101)).await;
    assert!(n.visible().is_empty());
    assert_eq!(
        sink.events_for(txn).last(),
        Some(&SinkEvent::Dismiss(txn))
    );
    assert!(sink.on_screen().is_empty());
}

#[tokio::test(start_paused = true)]
async fn error_uses_its_own_delay() {
    let (n, _sink) = notifier();
    let txn = TxnId::from_parts(5, 2);
    n.loading(txn, "Rejecting...");
    n.error(txn, "L1 already finalized");
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(n.get(txn).map(|x| x.status), Some(NoticeStatus::Error));
    tokio::time::sleep(Duration::from_millis(101)).await;
    assert!(n.get(txn).is_none());
}

#[tokio::test(start_paused = true)]
async fn stale_timer_never_clears_a_newer_notice() {
    let (n, sink) = notifier();
    let txn = TxnId::from_parts(5, 3);
    n.success(txn, "first");
    tokio::time::sleep(Duration::from_millis(80)).await;

    // Re-armed with the longer error delay; the first timer is gone.
    n.error(txn, "second");
    tokio::time::sleep(Duration::from_millis(50)).await;
    let notice = n.get(txn).unwrap();
    assert_eq!(notice.message, "second");

    // Back to loading: no timer at all.
    n.loading(txn, "retrying");
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(n.get(txn).map(|x| x.status), Some(NoticeStatus::Loading));
    assert!(!sink.events().contains(&SinkEvent::Dismiss(txn)));
}

#[tokio::test(start_paused = true)]
async fn manual_dismiss_cancels_the_timer() {
    let (n, sink) = notifier();
    let txn = TxnId::from_parts(5, 4);
    n.success(txn, "done");
    n.dismiss(txn);
    tokio::time::sleep(Duration::from_millis(500)).await;
    let dismissals = sink
        .events()
        .into_iter()
        .filter(|e| *e == SinkEvent::Dismiss(txn))
        .count();
    assert_eq!(dismissals, 1);
}

#[tokio::test(start_paused = true)]
async fn notices_for_different_txns_do_not_interfere() {
    let (n, _sink) = notifier();
    let a = TxnId::from_parts(5, 10);
    let b = TxnId::from_parts(5, 11);
    n.loading(b, "b");
    n.loading(a, "a");
    n.success(a, "a done");
    let order: Vec<TxnId> = n.visible().iter().map(|x| x.txn).collect();
    assert_eq!(order, vec![a, b]);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(n.get(a).is_none());
    assert_eq!(n.get(b).map(|x| x.message), Some("b".to_string()));
}

#[test]
fn without_a_runtime_the_notice_stays() {
    let (n, _sink) = notifier();
    let txn = TxnId::from_parts(5, 20);
    n.success(txn, "saved");
    std::thread::sleep(Duration::from_millis(150));
    assert_eq!(n.get(txn).map(|x| x.status), Some(NoticeStatus::Success));
}
