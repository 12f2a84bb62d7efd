// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem-backed `ConfigStore`: one JSON file per key under the platform
//! config directory (or any directory the caller picks).

use directories::ProjectDirs;
use optimist_core::config::{ConfigError, ConfigStore};
use std::fs;
use std::path::{Path, PathBuf};

/// Store configs as `<key>.json` files in a base directory.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Create a store rooted at the user config directory (e.g., `~/.config/Optimist`).
    pub fn new() -> Result<Self, ConfigError> {
        let proj = ProjectDirs::from("dev", "flyingrobots", "Optimist")
            .ok_or_else(|| ConfigError::Other("could not resolve config dir".into()))?;
        Self::at(proj.config_dir())
    }

    /// Create a store rooted at `base`, creating the directory if needed.
    pub fn at(base: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let base = base.as_ref().to_path_buf();
        fs::create_dir_all(&base)?;
        tracing::debug!(dir = %base.display(), "config store ready");
        Ok(Self { base })
    }

    /// Directory holding the config files.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ConfigError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(ConfigError::Other(format!("invalid config key {key:?}")));
        }
        Ok(self.base.join(format!("{key}.json")))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        match fs::read(self.path_for(key)?) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key)?;
        // Write beside the target then rename, so a crash never leaves half a file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optimist_core::config::ConfigService;
    use optimist_core::settings::SETTINGS_KEY;
    use optimist_core::{ContentionPolicy, TxnSettings};

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path()).unwrap();
        assert!(matches!(store.load_raw("absent"), Err(ConfigError::NotFound)));
    }

    #[test]
    fn settings_survive_a_new_store() {
        let dir = tempfile::tempdir().unwrap();
        let first = ConfigService::new(FsConfigStore::at(dir.path()).unwrap());
        let defaults = TxnSettings::load_or_init(&first);
        assert!(dir.path().join(format!("{SETTINGS_KEY}.json")).exists());

        let tuned = TxnSettings {
            contention: ContentionPolicy::SerializePerEntity,
            ..defaults
        };
        first.save(SETTINGS_KEY, &tuned).unwrap();

        let second = ConfigService::new(FsConfigStore::at(dir.path()).unwrap());
        assert_eq!(TxnSettings::load_or_init(&second), tuned);
    }

    #[test]
    fn nested_base_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FsConfigStore::at(&nested).unwrap();
        store.save_raw("k", b"{}").unwrap();
        assert_eq!(store.load_raw("k").unwrap(), b"{}");
        assert_eq!(store.base(), nested.as_path());
    }

    #[test]
    fn path_like_keys_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path()).unwrap();
        assert!(matches!(store.save_raw("../escape", b"x"), Err(ConfigError::Other(_))));
        assert!(matches!(store.load_raw(""), Err(ConfigError::Other(_))));
    }
}
