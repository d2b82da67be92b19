//! Error types for store operations.
//!
//! Everything the manager can fail with is a [`StoreError`]. Drivers report
//! their own failures as [`DriverError`], which the manager classifies into a
//! `StoreError` variant depending on where in the call the failure happened.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for driver-level operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors raised by the connection manager.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store file is missing, not a file, or unreadable.
    #[error("configuration error: {message} ({})", .path.display())]
    Configuration {
        /// The resolved store path.
        path: PathBuf,
        /// What is wrong with it.
        message: String,
    },

    /// No registered driver matches the store family (or the requested name).
    #[error("{}", driver_not_found_message(.family, .requested.as_deref(), .available))]
    DriverNotFound {
        /// Family prefix that was searched for.
        family: String,
        /// Explicitly requested driver name, if any.
        requested: Option<String>,
        /// Every driver the registry reported.
        available: Vec<String>,
    },

    /// A driver was found but opening the store failed.
    #[error("connection failed with driver '{driver}': {message}")]
    ConnectionFailed {
        /// Driver used for the attempt.
        driver: String,
        /// Store path.
        path: PathBuf,
        /// Driver message, verbatim.
        message: String,
    },

    /// A statement or commit failed on an established connection.
    #[error("query error: {message}")]
    Query {
        /// Driver message, verbatim.
        message: String,
        /// Log-safe statement shape.
        statement: String,
    },

    /// A lock wait or other bounded operation ran out of time.
    #[error("timeout during {operation}: {message}")]
    Timeout {
        /// What was being attempted (`connect`, `execute`, `commit`).
        operation: String,
        /// Driver message, verbatim.
        message: String,
    },
}

fn driver_not_found_message(family: &str, requested: Option<&str>, available: &[String]) -> String {
    let installed = if available.is_empty() {
        "none".to_string()
    } else {
        available.join(", ")
    };
    match requested {
        Some(name) => format!(
            "driver '{}' is not a registered {} driver (installed: {})",
            name, family, installed
        ),
        None => format!("no {} drivers found (installed: {})", family, installed),
    }
}

impl StoreError {
    /// Create a configuration error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Configuration {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a query error.
    pub fn query(message: impl Into<String>, statement: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            statement: statement.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Short stable code, used in log lines and CLI diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "store::config",
            Self::DriverNotFound { .. } => "store::driver_not_found",
            Self::ConnectionFailed { .. } => "store::connection",
            Self::Query { .. } => "store::query",
            Self::Timeout { .. } => "store::timeout",
        }
    }

    /// Whether a caller may reasonably try the same call again.
    ///
    /// Configuration and driver errors need an operator to fix the host first.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::Query { .. } | Self::Timeout { .. }
        )
    }

    /// Check if this is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Check if this is a missing-driver error.
    pub fn is_driver_not_found(&self) -> bool {
        matches!(self, Self::DriverNotFound { .. })
    }

    /// Check if this is a query error.
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query { .. })
    }

    /// Check if this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Remediation text for operators.
    pub fn hint(&self) -> String {
        match self {
            Self::Configuration { path, .. } => format!(
                "check that {} exists and is readable, or point the store path at the right file",
                path.display()
            ),
            Self::DriverNotFound {
                family, requested, ..
            } => match requested {
                Some(_) => format!(
                    "remove the driver override or pick one of the installed {} drivers",
                    family
                ),
                None => format!(
                    "install a {} connectivity driver whose architecture matches this process",
                    family
                ),
            },
            Self::ConnectionFailed { .. } => {
                "check file permissions, make sure the file is not corrupt or locked by another program, and retry"
                    .to_string()
            }
            Self::Query { .. } => {
                "the transaction was rolled back; fix the statement or its parameters and retry"
                    .to_string()
            }
            Self::Timeout { .. } => {
                "another process holds the store; retry later or raise busy_timeout_ms".to_string()
            }
        }
    }
}

/// Classification of a driver failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// The store is locked by another session.
    Busy,
    /// The store could not be opened.
    Open,
    /// A statement failed to prepare or run.
    Statement,
    /// Anything else.
    Other,
}

/// Error reported by a driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DriverError {
    /// What kind of failure this is.
    pub kind: DriverErrorKind,
    /// Driver message, verbatim.
    pub message: String,
}

impl DriverError {
    /// Create a driver error.
    pub fn new(kind: DriverErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create an open failure.
    pub fn open(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Open, message)
    }

    /// Create a statement failure.
    pub fn statement(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Statement, message)
    }

    /// Create a busy failure.
    pub fn busy(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Busy, message)
    }

    /// Whether the store was locked.
    pub fn is_busy(&self) -> bool {
        self.kind == DriverErrorKind::Busy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::config("/srv/club.db", "database file not found");
        let msg = err.to_string();
        assert!(msg.contains("configuration error"));
        assert!(msg.contains("database file not found"));
        assert!(msg.contains("club.db"));
    }

    #[test]
    fn test_driver_not_found_display() {
        let err = StoreError::DriverNotFound {
            family: "Microsoft Access".to_string(),
            requested: None,
            available: vec!["SQL Server".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("no Microsoft Access drivers found"));
        assert!(msg.contains("SQL Server"));
        assert!(err.hint().contains("install"));

        let err = StoreError::DriverNotFound {
            family: "SQLite".to_string(),
            requested: Some("SQLite2".to_string()),
            available: vec![],
        };
        assert!(err.to_string().contains("'SQLite2'"));
        assert!(err.to_string().contains("installed: none"));
    }

    #[test]
    fn test_retryable() {
        assert!(!StoreError::config("x", "missing").is_retryable());
        assert!(StoreError::query("no such column: Foo", "SELECT Foo").is_retryable());
        assert!(StoreError::timeout("execute", "database is locked").is_retryable());
        assert!(
            !StoreError::DriverNotFound {
                family: "SQLite".into(),
                requested: None,
                available: vec![],
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(StoreError::config("x", "y").code(), "store::config");
        assert_eq!(StoreError::query("x", "y").code(), "store::query");
        assert_eq!(StoreError::timeout("x", "y").code(), "store::timeout");
    }

    #[test]
    fn test_driver_error_constructors() {
        assert!(DriverError::busy("database is locked").is_busy());
        assert!(!DriverError::statement("syntax error").is_busy());
        assert_eq!(DriverError::open("unable to open").kind, DriverErrorKind::Open);
        assert_eq!(DriverError::open("unable to open").to_string(), "unable to open");
    }
}
