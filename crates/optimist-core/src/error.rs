// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Failure of the server call behind an optimistic mutation.

use std::time::Duration;

use thiserror::Error;

/// Why a mutation did not commit. Every variant triggers a rollback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// The server refused the mutation (validation, not found, forbidden, ...).
    #[error("rejected by server: {message}")]
    Rejected {
        /// HTTP-style status code, when the transport exposes one.
        status: Option<u16>,
        /// Server-supplied reason, shown to the user as-is.
        message: String,
    },
    /// The request never produced a server answer.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The configured call timeout elapsed first.
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
    /// The caller dropped the transaction before the call answered.
    #[error("abandoned before the server answered")]
    Abandoned,
}

impl MutationError {
    /// Server rejection without a status code.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            status: None,
            message: message.into(),
        }
    }

    /// The server's reason, if it sent a non-empty one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }

    /// Text for the error notice: the server's reason, or `fallback`.
    pub fn user_message<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.server_message().unwrap_or(fallback)
    }
}
