//! Connection management for a single-file, driver-mediated store.
//!
//! This crate is the only path from application code to the club database.
//! It resolves the store file, discovers a driver for the configured family,
//! and runs statements with strict transaction discipline: reads never
//! commit, writes commit or roll back, and every connection is released
//! before the call returns.
//!
//! # Features
//!
//! - Driver discovery by family prefix, with an optional named override
//! - Bundled SQLite driver (`rusqlite`)
//! - Atomic batch execution
//! - Typed error taxonomy with stable codes
//! - Operator diagnostics that probe every installed driver
//! - Optional file logging (`log-file` feature)
//!
//! # Example
//!
//! ```rust,no_run
//! use clubstore_store::{ConnectionManager, Statement};
//!
//! let manager = ConnectionManager::builder()
//!     .root_dir("/srv/club")
//!     .from_env()
//!     .build()?;
//!
//! for row in manager.query(&Statement::new("SELECT TeamName FROM TEAMS"))? {
//!     println!("{}", row.get::<String>(0).unwrap_or_default());
//! }
//! # Ok::<(), clubstore_store::StoreError>(())
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod connection;
pub mod diagnose;
pub mod driver;
pub mod error;
pub mod logging;
pub mod manager;
pub mod row;
pub mod sqlite;
pub mod statement;
pub mod types;

pub use config::{DatabaseLocation, EnvSource, MapEnvSource, StdEnvSource, StoreConfig};
pub use connection::ConnectionHandle;
pub use diagnose::{DiagnosticReport, ProbeOutcome, ProbeSuccess, SystemInfo};
pub use driver::{
    ConnectionDescriptor, DescriptorParseError, Driver, DriverDescriptor, DriverFamily,
    DriverRegistry, HostRegistry, Session, StaticRegistry,
};
pub use error::{DriverError, DriverErrorKind, DriverResult, StoreError, StoreResult};
pub use logging::{LogConfig, LogFormat};
pub use manager::{ConnectionManager, ConnectionManagerBuilder};
pub use row::{Row, RowError};
pub use sqlite::SqliteDriver;
pub use statement::{ExecutionResult, ResultMode, Statement};
pub use types::{FromValue, FromValueError, Value};
