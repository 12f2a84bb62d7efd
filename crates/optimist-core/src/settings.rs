// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tunables for the orchestrator and notifier, persisted through [`ConfigService`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigService, ConfigStore};
use crate::notify::DismissDelays;

/// Config key the settings live under.
pub const SETTINGS_KEY: &str = "optimist_txn";

/// What happens when two transactions target the same record at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentionPolicy {
    /// Run independently; whichever settles last decides the visible state.
    #[default]
    LastResolvedWins,
    /// Queue transactions per `(slice, record)` so each starts after the previous settles.
    SerializePerEntity,
}

/// Saved transaction settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxnSettings {
    /// How long a success notice stays up (ms).
    pub success_dismiss_ms: u64,
    /// How long an error notice stays up (ms).
    pub error_dismiss_ms: u64,
    /// Server call budget (ms); `None` waits forever.
    pub call_timeout_ms: Option<u64>,
    /// Error text when a failure carries no server message and the recipe has none.
    pub fallback_error: String,
    /// Same-record concurrency.
    pub contention: ContentionPolicy,
}

impl Default for TxnSettings {
    fn default() -> Self {
        Self {
            success_dismiss_ms: 2000,
            error_dismiss_ms: 4000,
            call_timeout_ms: Some(30_000),
            fallback_error: "Something went wrong. Please try again.".into(),
            contention: ContentionPolicy::LastResolvedWins,
        }
    }
}

impl TxnSettings {
    /// Dismiss delays for [`crate::StatusNotifier`].
    pub const fn dismiss_delays(&self) -> DismissDelays {
        DismissDelays {
            success: Duration::from_millis(self.success_dismiss_ms),
            error: Duration::from_millis(self.error_dismiss_ms),
        }
    }

    /// Server call budget.
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    /// Saved settings, or defaults when missing or unreadable.
    ///
    /// Defaults are written back once when nothing was stored (best-effort).
    pub fn load_or_init<S: ConfigStore>(config: &ConfigService<S>) -> Self {
        config.load_or_init(SETTINGS_KEY)
    }
}
