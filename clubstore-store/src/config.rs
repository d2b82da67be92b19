//! Store configuration and database location resolution.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Default store file name, looked up under the root directory.
pub const DEFAULT_FILE_NAME: &str = "sports_management_system.db";

/// Default driver family prefix.
pub const DEFAULT_DRIVER_FAMILY: &str = "SQLite";

/// Default lock wait before a busy store turns into a timeout.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Overrides the store path.
pub const ENV_DB_PATH: &str = "CLUBSTORE_DB_PATH";

/// Overrides driver selection.
pub const ENV_DRIVER: &str = "CLUBSTORE_DRIVER";

/// Overrides the driver family prefix.
pub const ENV_DRIVER_FAMILY: &str = "CLUBSTORE_DRIVER_FAMILY";

/// Connection manager configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Explicit store path. Takes precedence over `root_dir`/`file_name`.
    pub path: Option<PathBuf>,
    /// Directory the default file name is resolved against (default: cwd).
    pub root_dir: Option<PathBuf>,
    /// File name used when no explicit path is given.
    pub file_name: String,
    /// Name prefix a driver must have to be considered.
    pub driver_family: String,
    /// Use this driver instead of the first family match.
    pub driver: Option<String>,
    /// Lock wait in milliseconds; `None` disables the wait.
    pub busy_timeout_ms: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            root_dir: None,
            file_name: DEFAULT_FILE_NAME.to_string(),
            driver_family: DEFAULT_DRIVER_FAMILY.to_string(),
            driver: None,
            busy_timeout_ms: Some(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }
}

impl StoreConfig {
    /// Configuration for an explicit store file.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    /// Set the explicit store path.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the root directory for the default file name.
    pub fn root_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.root_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set the default file name.
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    /// Set the driver family prefix.
    pub fn driver_family(mut self, family: impl Into<String>) -> Self {
        self.driver_family = family.into();
        self
    }

    /// Pin a specific driver by name.
    pub fn driver(mut self, name: impl Into<String>) -> Self {
        self.driver = Some(name.into());
        self
    }

    /// Set the busy timeout in milliseconds.
    pub fn busy_timeout(mut self, ms: u64) -> Self {
        self.busy_timeout_ms = Some(ms);
        self
    }

    /// Apply environment overrides. Values already set explicitly win over
    /// the environment, except for the family which has a non-empty default.
    pub fn with_env<S: EnvSource>(mut self, env: &S) -> Self {
        if self.path.is_none() {
            if let Some(path) = env.get(ENV_DB_PATH).filter(|p| !p.is_empty()) {
                self.path = Some(PathBuf::from(path));
            }
        }
        if self.driver.is_none() {
            self.driver = env.get(ENV_DRIVER).filter(|d| !d.is_empty());
        }
        if let Some(family) = env.get(ENV_DRIVER_FAMILY).filter(|f| !f.is_empty()) {
            self.driver_family = family;
        }
        self
    }

    /// The path the store is expected at, before normalization.
    pub fn candidate_path(&self) -> StoreResult<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        let root = match &self.root_dir {
            Some(dir) => dir.clone(),
            None => current_dir()?,
        };
        Ok(root.join(&self.file_name))
    }

    /// Resolve, normalize and check the store location.
    pub fn resolve_location(&self) -> StoreResult<DatabaseLocation> {
        DatabaseLocation::resolve(self.candidate_path()?)
    }
}

/// Absolute, normalized path to an existing, readable store file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatabaseLocation {
    path: PathBuf,
}

impl DatabaseLocation {
    /// Normalize `path` and check that it names a readable file.
    pub fn resolve(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = normalize_path(path.as_ref())?;

        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::config(path, "database file not found"));
            }
            Err(e) => {
                return Err(StoreError::config(
                    path,
                    format!("cannot access database file: {}", e),
                ));
            }
        };
        if !metadata.is_file() {
            return Err(StoreError::config(path, "database path is not a regular file"));
        }
        if let Err(e) = std::fs::File::open(&path) {
            return Err(StoreError::config(
                path,
                format!("database file is not readable: {}", e),
            ));
        }

        Ok(Self { path })
    }

    /// The normalized path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lower-cased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

impl std::fmt::Display for DatabaseLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

fn current_dir() -> StoreResult<PathBuf> {
    std::env::current_dir().map_err(|e| {
        StoreError::config(".", format!("cannot determine current directory: {}", e))
    })
}

/// Make `path` absolute and remove `.` and `..` components without touching
/// the filesystem.
pub fn normalize_path(path: &Path) -> StoreResult<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        current_dir()?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

/// Source for environment variables.
pub trait EnvSource: Send + Sync {
    /// Get an environment variable value.
    fn get(&self, name: &str) -> Option<String>;
}

/// Environment source using the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Environment source backed by a map.
#[derive(Debug, Clone, Default)]
pub struct MapEnvSource {
    vars: HashMap<String, String>,
}

impl MapEnvSource {
    /// Create an empty map source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvSource for MapEnvSource {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.file_name, DEFAULT_FILE_NAME);
        assert_eq!(config.driver_family, "SQLite");
        assert_eq!(config.busy_timeout_ms, Some(5000));
        assert!(config.driver.is_none());
    }

    #[test]
    fn test_candidate_path_prefers_explicit_path() {
        let config = StoreConfig::default()
            .root_dir("/srv/club")
            .path("/data/other.db");
        assert_eq!(config.candidate_path().unwrap(), PathBuf::from("/data/other.db"));

        let config = StoreConfig::default().root_dir("/srv/club");
        assert_eq!(
            config.candidate_path().unwrap(),
            PathBuf::from("/srv/club").join(DEFAULT_FILE_NAME)
        );
    }

    #[test]
    fn test_env_overrides() {
        let env = MapEnvSource::new()
            .set(ENV_DB_PATH, "/tmp/from-env.db")
            .set(ENV_DRIVER, "SQLite3 Driver")
            .set(ENV_DRIVER_FAMILY, "Microsoft Access");
        let config = StoreConfig::default().with_env(&env);
        assert_eq!(config.path, Some(PathBuf::from("/tmp/from-env.db")));
        assert_eq!(config.driver.as_deref(), Some("SQLite3 Driver"));
        assert_eq!(config.driver_family, "Microsoft Access");
    }

    #[test]
    fn test_explicit_values_beat_env() {
        let env = MapEnvSource::new()
            .set(ENV_DB_PATH, "/tmp/from-env.db")
            .set(ENV_DRIVER, "");
        let config = StoreConfig::file("/tmp/explicit.db").with_env(&env);
        assert_eq!(config.path, Some(PathBuf::from("/tmp/explicit.db")));
        assert!(config.driver.is_none());
    }

    #[test]
    fn test_normalize_path() {
        let normalized = normalize_path(Path::new("/srv/club/./data/../club.db")).unwrap();
        assert_eq!(normalized, PathBuf::from("/srv/club/club.db"));

        let relative = normalize_path(Path::new("club.db")).unwrap();
        assert!(relative.is_absolute());
        assert!(relative.ends_with("club.db"));
    }

    #[test]
    fn test_resolve_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DatabaseLocation::resolve(dir.path().join("missing.db")).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_resolve_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = DatabaseLocation::resolve(dir.path()).unwrap_err();
        assert!(err.to_string().contains("not a regular file"));
    }

    #[test]
    fn test_resolve_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Club.DB");
        std::fs::write(&file, b"").unwrap();

        let location = DatabaseLocation::resolve(dir.path().join("sub/../Club.DB")).unwrap();
        assert_eq!(location.path(), file.as_path());
        assert_eq!(location.extension().as_deref(), Some("db"));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: StoreConfig = serde_json::from_str(r#"{"driver": "SQLite3 Driver"}"#).unwrap();
        assert_eq!(config.driver.as_deref(), Some("SQLite3 Driver"));
        assert_eq!(config.file_name, DEFAULT_FILE_NAME);
    }
}
