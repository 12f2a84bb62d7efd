// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Walks one committed and one rolled-back review through the orchestrator.
//!
//! Run with `RUST_LOG=debug` to see every transaction step.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use optimist_config_fs::FsConfigStore;
use optimist_core::config::ConfigService;
use optimist_core::entities::{joining_letter, JoiningLetter, JOINING_LETTERS};
use optimist_core::{
    MemoryStore, MutationError, Orchestrator, Slice, StateStore, TracingSink, TxnSettings,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Config (best-effort)
    let settings = match FsConfigStore::new() {
        Ok(store) => TxnSettings::load_or_init(&ConfigService::new(store)),
        Err(err) => {
            tracing::warn!(?err, "no config dir; using default settings");
            TxnSettings::default()
        }
    };

    let store = MemoryStore::new().with_slice(
        &JOINING_LETTERS,
        Slice::from_items(vec![
            JoiningLetter::pending("L1", "S1"),
            JoiningLetter::pending("L2", "S2"),
        ]),
    );
    let orch = Orchestrator::new(Arc::new(store), Arc::new(TracingSink), settings);
    let now = time::OffsetDateTime::now_utc();

    let verified = orch.spawn(joining_letter::verify("L1", now), async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        Ok::<_, MutationError>(())
    });
    let rejected = orch.spawn(joining_letter::reject("L2", "bad scan", now), async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Err::<(), _>(MutationError::Rejected {
            status: Some(409),
            message: "L2 already finalized".into(),
        })
    });

    // Both edits land before the calls answer; a queued one needs a few polls.
    for _ in 0..64 {
        if orch.in_flight() == 2 {
            break;
        }
        tokio::task::yield_now().await;
    }
    ensure!(orch.in_flight() == 2, "optimistic edits were not applied");
    let letters = orch
        .store()
        .read(&JOINING_LETTERS)
        .context("letters slice missing")?;
    tracing::info!(in_flight = orch.in_flight(), ?letters, "optimistic view");

    let first = verified.await.context("verify task panicked")?;
    let second = rejected.await.context("reject task panicked")?;
    tracing::info!(txn = %first.txn(), state = %first.state(), "first settled");
    tracing::info!(txn = %second.txn(), state = %second.state(), "second settled");

    let letters = orch
        .store()
        .read(&JOINING_LETTERS)
        .context("letters slice missing")?;
    tracing::info!(?letters, "settled view");
    Ok(())
}
