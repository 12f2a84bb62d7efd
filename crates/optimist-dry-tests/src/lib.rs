// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for Optimist crates.
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`call`] - Server calls the test resolves by hand
//! - [`fixtures`] - Slices and records for each entity family
//! - [`sink`] - Notification sink that records what it was told
#![forbid(unsafe_code)]

pub mod call;
pub mod config;
pub mod fixtures;
pub mod sink;

pub use call::{pending_call, CallHandle, PendingCall};
pub use config::InMemoryConfigStore;
pub use fixtures::{letter_slice, report_slice, ticket_slice, REVIEWED_AT, SERVER_AT};
pub use sink::{RecordingSink, SinkEvent};
