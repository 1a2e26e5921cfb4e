//! # Configuration
//!
//! Configuration is loaded with [`confique`] from layered sources.
//!
//! ## Storage Hierarchy
//!
//! Values are resolved in priority order:
//! 1. **Environment variables**: `TAGHIST_DATABASE`, `TAGHIST_BACKEND`.
//! 2. **Local Config**: `taghist.toml` in the working directory.
//! 3. **Global Config**: OS-appropriate config directory (via `directories` crate).
//! 4. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! Command-line flags override all of the above; that happens in the CLI.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `database` | `history.db` | Path of the history store |
//! | `backend` | `sqlite` | Storage engine: `sqlite` or `json` |

use crate::error::{HistoryError, Result};
use crate::store::Backend;
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "taghist.toml";

/// Configuration for taghist, stored in `taghist.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TagHistConfig {
    /// Path of the history store.
    #[config(env = "TAGHIST_DATABASE", default = "history.db")]
    pub database: PathBuf,

    /// Storage engine used for the history store ("sqlite" or "json").
    #[config(env = "TAGHIST_BACKEND", default = "sqlite")]
    pub backend: Backend,
}

impl Default for TagHistConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("history.db"),
            backend: Backend::Sqlite,
        }
    }
}

impl TagHistConfig {
    /// Loads configuration for a process running in `working_dir`.
    pub fn load(working_dir: &Path) -> Result<Self> {
        let mut builder = Self::builder().env().file(working_dir.join(CONFIG_FILE));
        if let Some(global) = global_config_path() {
            builder = builder.file(global);
        }
        builder
            .load()
            .map_err(|e| HistoryError::Store(format!("configuration: {}", e)))
    }
}

/// `taghist.toml` inside the user's config directory, if one can be determined.
pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "taghist", "taghist").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = TagHistConfig::default();
        assert_eq!(config.database, PathBuf::from("history.db"));
        assert_eq!(config.backend, Backend::Sqlite);
    }

    #[test]
    fn test_local_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "database = \"tags.json\"\nbackend = \"json\"\n",
        )
        .unwrap();
        let config = TagHistConfig::builder()
            .file(dir.path().join(CONFIG_FILE))
            .load()
            .unwrap();
        assert_eq!(config.database, PathBuf::from("tags.json"));
        assert_eq!(config.backend, Backend::Json);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = TagHistConfig::builder()
            .file(dir.path().join(CONFIG_FILE))
            .load()
            .unwrap();
        assert_eq!(config, TagHistConfig::default());
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "backend = \"redis\"\n").unwrap();
        let result = TagHistConfig::builder()
            .file(dir.path().join(CONFIG_FILE))
            .load();
        assert!(result.is_err());
    }
}
