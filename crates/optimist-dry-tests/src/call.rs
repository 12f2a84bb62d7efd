// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Server calls whose result the test decides, after the optimistic edit is visible.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use optimist_core::MutationError;
use tokio::sync::oneshot;

/// Create a call future plus the handle that resolves it.
///
/// Dropping the handle without resolving fails the call with a transport error.
pub fn pending_call<T>() -> (PendingCall<T>, CallHandle<T>) {
    let (tx, rx) = oneshot::channel();
    (PendingCall { rx }, CallHandle { tx })
}

/// Future side of [`pending_call`]; hand it to the orchestrator.
#[derive(Debug)]
pub struct PendingCall<T> {
    rx: oneshot::Receiver<Result<T, MutationError>>,
}

impl<T> Future for PendingCall<T> {
    type Output = Result<T, MutationError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| Err(MutationError::Transport("call dropped".into())))
        })
    }
}

/// Test side of [`pending_call`].
#[derive(Debug)]
pub struct CallHandle<T> {
    tx: oneshot::Sender<Result<T, MutationError>>,
}

impl<T> CallHandle<T> {
    /// Resolve the call successfully.
    pub fn succeed(self, value: T) {
        let _ = self.tx.send(Ok(value));
    }

    /// Fail the call with `error`.
    pub fn fail(self, error: MutationError) {
        let _ = self.tx.send(Err(error));
    }

    /// Fail the call with a server rejection carrying `message`.
    pub fn reject(self, message: &str) {
        self.fail(MutationError::rejected(message));
    }
}
