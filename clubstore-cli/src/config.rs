//! CLI configuration handling.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use clubstore_store::{EnvSource, LogConfig, StdEnvSource, StoreConfig};

use crate::error::{CliError, CliResult};

/// Default config file name (looked up in the current directory)
pub const CONFIG_FILE_NAME: &str = "clubstore.toml";

/// Clubstore CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store location and driver selection
    pub store: StoreConfig,

    /// File logging
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `explicit` if given, otherwise `clubstore.toml` from the current
    /// directory when it exists, otherwise the defaults.
    pub fn discover(explicit: Option<&Path>) -> CliResult<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let local = PathBuf::from(CONFIG_FILE_NAME);
                if local.is_file() {
                    Self::load(&local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Store configuration for one command: `db` wins, then the environment,
    /// then the file.
    pub fn store_for(&self, db: Option<&Path>) -> StoreConfig {
        self.store_with_env(db, &StdEnvSource)
    }

    fn store_with_env<S: EnvSource>(&self, db: Option<&Path>, env: &S) -> StoreConfig {
        // `with_env` keeps values already set, so the file's pins are applied
        // after the environment has had its say.
        let file = self.store.clone();
        let mut store = StoreConfig {
            path: None,
            driver: None,
            ..file.clone()
        }
        .with_env(env);
        if store.path.is_none() {
            store.path = file.path;
        }
        if store.driver.is_none() {
            store.driver = file.driver;
        }
        if let Some(db) = db {
            store = store.path(db);
        }
        store
    }
}
