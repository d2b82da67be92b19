//! CLI error types and result alias.

use clubstore_store::StoreError;
use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(clubstore::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(code(clubstore::config))]
    Config(String),

    /// Store error, carrying the store's remediation hint
    #[error("{source}")]
    #[diagnostic(code(clubstore::store))]
    Store {
        #[source]
        source: StoreError,
        #[help]
        hint: String,
    },

    /// No driver could open the database
    #[error("Diagnostics failed: {0}")]
    #[diagnostic(
        code(clubstore::diagnostics),
        help("follow the suggested fixes above, then run `clubstore doctor` again")
    )]
    Diagnostics(String),

    /// Output error
    #[error("Output error: {0}")]
    #[diagnostic(code(clubstore::output))]
    Output(String),
}

impl CliError {
    /// Stable code of the underlying store error, if any.
    pub fn store_code(&self) -> Option<&'static str> {
        match self {
            CliError::Store { source, .. } => Some(source.code()),
            _ => None,
        }
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        let hint = err.hint();
        CliError::Store { source: err, hint }
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Output(format!("Failed to serialize JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_carries_hint() {
        let err: CliError = StoreError::timeout("execute", "database is locked").into();
        assert_eq!(err.store_code(), Some("store::timeout"));
        let help = Diagnostic::help(&err).unwrap().to_string();
        assert!(help.contains("busy_timeout_ms"));
        assert!(err.to_string().contains("database is locked"));
    }

    #[test]
    fn test_toml_error_is_config() {
        let err: CliError = toml::from_str::<toml::Value>("store = [").unwrap_err().into();
        assert!(matches!(err, CliError::Config(_)));
    }
}
