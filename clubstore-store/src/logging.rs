//! File logging for the store.
//!
//! Store code logs through the `tracing` macros; this module only decides
//! where those events go. With the `log-file` feature, [`init`] installs a
//! subscriber that appends to a plain-text log file (`database.log` by
//! default).
//!
//! # Environment Variables
//!
//! - `CLUBSTORE_DEBUG=true` - Log at debug level
//! - `CLUBSTORE_LOG_LEVEL=trace|debug|info|warn|error` - Set the level
//! - `CLUBSTORE_LOG_FORMAT=full|compact|json` - Set the line format
//!
//! ```rust,ignore
//! use clubstore_store::logging::{self, LogConfig};
//!
//! logging::init(&LogConfig::default().from_env());
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{EnvSource, StdEnvSource};

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "database.log";

/// Default level when nothing is configured.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment flag that raises the level to debug.
pub const ENV_DEBUG: &str = "CLUBSTORE_DEBUG";

/// Environment variable naming the minimum level.
pub const ENV_LOG_LEVEL: &str = "CLUBSTORE_LOG_LEVEL";

/// Environment variable naming the line format.
pub const ENV_LOG_FORMAT: &str = "CLUBSTORE_LOG_FORMAT";

/// Line format of the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// `timestamp LEVEL target: message fields`
    #[default]
    Full,
    /// Abbreviated single-line output.
    Compact,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parse a format name. Unknown names fall back to [`LogFormat::Full`].
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "compact" => Self::Compact,
            "json" => Self::Json,
            _ => Self::Full,
        }
    }
}

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Whether file logging is wanted at all.
    pub enabled: bool,
    /// Log file, opened in append mode.
    pub file: PathBuf,
    /// Minimum level.
    pub level: String,
    /// Line format.
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: PathBuf::from(DEFAULT_LOG_FILE),
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::Full,
        }
    }
}

impl LogConfig {
    /// Log to `file`.
    pub fn file(mut self, file: impl AsRef<Path>) -> Self {
        self.file = file.as_ref().to_path_buf();
        self
    }

    /// Set the minimum level.
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Set the line format.
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Turn file logging off.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Apply the process environment.
    pub fn from_env(self) -> Self {
        self.with_env(&StdEnvSource)
    }

    /// Apply overrides from `env`. An explicit level wins over the debug flag.
    pub fn with_env<S: EnvSource>(mut self, env: &S) -> Self {
        if env
            .get(ENV_DEBUG)
            .is_some_and(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        {
            self.level = "debug".to_string();
        }
        if let Some(level) = env.get(ENV_LOG_LEVEL).and_then(|l| normalize_level(&l)) {
            self.level = level.to_string();
        }
        if let Some(format) = env.get(ENV_LOG_FORMAT) {
            self.format = LogFormat::parse(&format);
        }
        self
    }

    /// The configured level, or the default when it is not a level name.
    pub fn effective_level(&self) -> &'static str {
        normalize_level(&self.level).unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

fn normalize_level(level: &str) -> Option<&'static str> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

/// Install the file subscriber. Only the first call in a process has an
/// effect; later calls return what the first one did.
///
/// Returns whether file logging is active. A log file that cannot be opened
/// leaves logging off; it never fails the caller.
#[cfg(feature = "log-file")]
pub fn init(config: &LogConfig) -> bool {
    use std::fs::OpenOptions;
    use std::sync::{Mutex, OnceLock};

    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    static ACTIVE: OnceLock<bool> = OnceLock::new();

    *ACTIVE.get_or_init(|| {
        if !config.enabled {
            return false;
        }

        let file = match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.file)
        {
            Ok(file) => file,
            Err(e) => {
                eprintln!(
                    "warning: cannot open log file {}: {}; file logging disabled",
                    config.file.display(),
                    e
                );
                return false;
            }
        };

        let level = config.effective_level();
        let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
        let layer = fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(true);

        let installed = match config.format {
            LogFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(layer.json())
                .try_init(),
            LogFormat::Compact => tracing_subscriber::registry()
                .with(filter)
                .with(layer.compact())
                .try_init(),
            LogFormat::Full => tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init(),
        };

        if installed.is_ok() {
            tracing::info!(
                file = %config.file.display(),
                max_level = level,
                format = ?config.format,
                "Logging initialized"
            );
        }
        installed.is_ok()
    })
}
