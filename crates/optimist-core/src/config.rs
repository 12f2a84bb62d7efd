// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted settings: a byte-blob storage port plus a JSON layer over it.
//!
//! Callers that only need "saved value or defaults" use
//! [`ConfigService::load_or_init`], which never fails: unreadable blobs are
//! logged and left on disk, and missing ones are seeded with the default.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Where settings blobs live. Keys are short logical names such as `optimist_txn`.
pub trait ConfigStore {
    /// Raw bytes stored under `key`, or [`ConfigError::NotFound`].
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replace the bytes stored under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Failure reading or writing a settings blob.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing stored under the key.
    #[error("not found")]
    NotFound,
    /// The backing store failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The stored blob is not valid JSON for the requested type.
    #[error("settings {key:?} are malformed: {source}")]
    Malformed {
        /// Key that was read.
        key: String,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// The value could not be turned into JSON.
    #[error("settings {key:?} could not be encoded: {source}")]
    Encode {
        /// Key that was written.
        key: String,
        /// Encoder error.
        #[source]
        source: serde_json::Error,
    },
    /// Store-specific failure (bad key, unresolvable directory, ...).
    #[error("other: {0}")]
    Other(String),
}

/// JSON settings on top of a [`ConfigStore`].
#[derive(Debug, Clone)]
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Wrap `store`.
    pub const fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: ConfigStore> ConfigService<S> {
    /// Value under `key`; `Ok(None)` when nothing (or an empty blob) is stored.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let bytes = match self.store.load_raw(key) {
            Ok(bytes) => bytes,
            Err(ConfigError::NotFound) => return Ok(None),
            Err(err) => return Err(err),
        };
        if bytes.is_empty() {
            return Ok(None);
        }
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| ConfigError::Malformed {
                key: key.to_owned(),
                source,
            })
    }

    /// Store `value` under `key` as indented JSON.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(value).map_err(|source| ConfigError::Encode {
            key: key.to_owned(),
            source,
        })?;
        self.store.save_raw(key, &data)
    }

    /// Saved value under `key`, or `T::default()`.
    ///
    /// A missing value is seeded with the default (best-effort). A broken one
    /// is left in place so a hand edit can be fixed rather than lost.
    pub fn load_or_init<T>(&self, key: &str) -> T
    where
        T: Default + Serialize + DeserializeOwned,
    {
        match self.load::<T>(key) {
            Ok(Some(value)) => value,
            Ok(None) => {
                let value = T::default();
                match self.save(key, &value) {
                    Ok(()) => debug!(key, "seeded default settings"),
                    Err(err) => warn!(key, %err, "could not persist default settings"),
                }
                value
            }
            Err(err) => {
                warn!(key, %err, "unreadable settings; using defaults");
                T::default()
            }
        }
    }
}
