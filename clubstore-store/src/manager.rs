//! The connection manager.
//!
//! [`ConnectionManager`] owns the resolved store location and the driver
//! selection policy. Every operation opens a fresh [`ConnectionHandle`],
//! uses it, and releases it before returning; nothing is pooled and no
//! handle outlives the call that opened it.
//!
//! # Example
//!
//! ```rust,no_run
//! use clubstore_store::{ConnectionManager, ResultMode, Statement, StoreConfig};
//!
//! let manager = ConnectionManager::new(StoreConfig::file("club.db"))?;
//!
//! let teams = manager.query(&Statement::new(
//!     "SELECT TeamID, TeamName FROM TEAMS ORDER BY TeamID",
//! ))?;
//!
//! let inserted = manager
//!     .execute(
//!         &Statement::new("INSERT INTO TEAMS (TeamName) VALUES (?)").bind("Falcons"),
//!         ResultMode::AffectedCount,
//!     )?
//!     .affected();
//! # Ok::<(), clubstore_store::StoreError>(())
//! ```

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::{DatabaseLocation, EnvSource, StdEnvSource, StoreConfig};
use crate::connection::ConnectionHandle;
use crate::driver::{ConnectionDescriptor, Driver, DriverDescriptor, DriverFamily, DriverRegistry, HostRegistry};
use crate::error::{StoreError, StoreResult};
use crate::row::Row;
use crate::statement::{ExecutionResult, ResultMode, Statement, shape_of};
use crate::types::Value;

/// Resolves the store, selects a driver, and runs statements with
/// commit/rollback/release discipline.
///
/// Construct one per process (or per test) and pass it to whatever needs the
/// store. It is `Send + Sync`; concurrent callers each get their own handle.
pub struct ConnectionManager {
    location: DatabaseLocation,
    family: DriverFamily,
    driver_override: Option<String>,
    registry: Arc<dyn DriverRegistry>,
    selected: Mutex<Option<Arc<dyn Driver>>>,
    live: Arc<AtomicUsize>,
}

impl ConnectionManager {
    /// Create a manager over the drivers compiled into this build.
    ///
    /// Fails with [`StoreError::Configuration`] when the store file does not
    /// exist or cannot be read.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        let registry = HostRegistry::new().busy_timeout(config.busy_timeout_ms);
        Self::with_registry(config, Arc::new(registry))
    }

    /// Create a manager over an explicit driver registry.
    pub fn with_registry(config: StoreConfig, registry: Arc<dyn DriverRegistry>) -> StoreResult<Self> {
        let location = config.resolve_location().inspect_err(|e| {
            error!(code = e.code(), error = %e, "Database location could not be resolved");
        })?;
        info!(path = %location, family = %config.driver_family, "Database path set");

        Ok(Self {
            location,
            family: DriverFamily::new(config.driver_family),
            driver_override: config.driver,
            registry,
            selected: Mutex::new(None),
            live: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Create a builder.
    pub fn builder() -> ConnectionManagerBuilder {
        ConnectionManagerBuilder::new()
    }

    /// The resolved store location.
    pub fn location(&self) -> &DatabaseLocation {
        &self.location
    }

    /// The driver family searched for.
    pub fn family(&self) -> &DriverFamily {
        &self.family
    }

    /// The pinned driver name, if any.
    pub fn driver_override(&self) -> Option<&str> {
        self.driver_override.as_deref()
    }

    /// The driver registry.
    pub fn registry(&self) -> &Arc<dyn DriverRegistry> {
        &self.registry
    }

    /// The driver selected by an earlier successful discovery.
    pub fn selected_driver(&self) -> Option<DriverDescriptor> {
        self.selected
            .lock()
            .as_ref()
            .map(|d| d.descriptor().clone())
    }

    /// Number of handles from this manager that are currently open.
    pub fn open_handles(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Discover the driver to use, caching it after the first success.
    fn select_driver(&self) -> StoreResult<Arc<dyn Driver>> {
        let mut selected = self.selected.lock();
        if let Some(driver) = selected.as_ref() {
            return Ok(Arc::clone(driver));
        }

        let installed = self.registry.drivers();
        let available: Vec<String> = installed
            .iter()
            .map(|d| d.descriptor().name().to_string())
            .collect();
        let matching = self.family.filter(installed);
        let matching_names: Vec<&str> = matching.iter().map(|d| d.descriptor().name()).collect();
        info!(family = %self.family, drivers = ?matching_names, "Available drivers");

        let chosen = match &self.driver_override {
            Some(name) => matching
                .iter()
                .find(|d| d.descriptor().name().eq_ignore_ascii_case(name))
                .cloned(),
            None => {
                if matching.len() > 1 {
                    warn!(
                        drivers = ?matching_names,
                        "Several drivers match; using the first. Set a driver override to choose another"
                    );
                }
                matching.first().cloned()
            }
        };

        let Some(driver) = chosen else {
            let err = StoreError::DriverNotFound {
                family: self.family.prefix().to_string(),
                requested: self.driver_override.clone(),
                available,
            };
            error!(code = err.code(), error = %err, hint = %err.hint(), "Driver discovery failed");
            return Err(err);
        };

        debug!(driver = %driver.descriptor(), "Driver selected");
        *selected = Some(Arc::clone(&driver));
        Ok(driver)
    }

    /// Open a connection to the store.
    ///
    /// The caller owns the handle; it is closed when dropped.
    pub fn open_connection(&self) -> StoreResult<ConnectionHandle> {
        let path = self.location.path();
        if !path.is_file() {
            let err = StoreError::config(path, "database file not found");
            error!(code = err.code(), error = %err, "Database file disappeared");
            return Err(err);
        }

        let driver = self.select_driver()?;
        let descriptor = ConnectionDescriptor::new(driver.descriptor().name(), path);

        match driver.connect(&descriptor) {
            Ok(session) => {
                info!(driver = %driver.descriptor(), path = %self.location, "Database connection established");
                Ok(ConnectionHandle::new(
                    session,
                    driver.descriptor().clone(),
                    path.to_path_buf(),
                    Arc::clone(&self.live),
                ))
            }
            Err(e) => {
                let err = if e.is_busy() {
                    StoreError::timeout("connect", e.message)
                } else {
                    StoreError::ConnectionFailed {
                        driver: driver.descriptor().name().to_string(),
                        path: path.to_path_buf(),
                        message: e.message,
                    }
                };
                error!(
                    code = err.code(),
                    error = %err,
                    driver = %driver.descriptor(),
                    path = %self.location,
                    "Database connection failed"
                );
                Err(err)
            }
        }
    }

    /// Run one statement on a fresh connection.
    ///
    /// In [`ResultMode::Rows`] every row is fetched and nothing is committed.
    /// In [`ResultMode::AffectedCount`] the write is committed and the
    /// affected-row count returned. On any failure the transaction is rolled
    /// back before the connection is released. No retry is attempted.
    pub fn execute(&self, statement: &Statement, mode: ResultMode) -> StoreResult<ExecutionResult> {
        let mut handle = self.open_connection()?;

        let outcome: StoreResult<ExecutionResult> = (|| {
            handle.begin_transaction()?;
            match mode {
                ResultMode::Rows => {
                    let rows = handle.query_rows(statement)?;
                    handle.rollback_transaction()?;
                    Ok(ExecutionResult::Rows(rows))
                }
                ResultMode::AffectedCount => {
                    let affected = handle.execute_statement(statement)?;
                    handle.commit_transaction()?;
                    Ok(ExecutionResult::Affected(affected))
                }
            }
        })();

        self.finish(handle, &statement.shape(), outcome)
    }

    /// Run one statement once per parameter set, on one connection, inside
    /// one transaction. Parameters bound on `statement` itself are ignored.
    ///
    /// With the bundled SQLite driver the batch is atomic: a failure on any
    /// row rolls back every row of the batch. An empty batch commits nothing
    /// and returns 0.
    pub fn execute_many(&self, statement: &Statement, params_list: &[Vec<Value>]) -> StoreResult<u64> {
        let shape = format!(
            "{} x{}",
            shape_of(statement.sql(), params_list.first().map_or(0, Vec::len)),
            params_list.len()
        );
        let mut handle = self.open_connection()?;

        let outcome: StoreResult<u64> = (|| {
            handle.begin_transaction()?;
            let total = handle.execute_batch(statement, params_list)?;
            handle.commit_transaction()?;
            Ok(total)
        })();

        self.finish(handle, &shape, outcome)
    }

    /// Fetch every row of a read.
    pub fn query(&self, statement: &Statement) -> StoreResult<Vec<Row>> {
        Ok(self.execute(statement, ResultMode::Rows)?.into_rows())
    }

    /// Fetch the first row of a read, if any.
    pub fn query_one(&self, statement: &Statement) -> StoreResult<Option<Row>> {
        Ok(self.query(statement)?.into_iter().next())
    }

    /// Commit a write and return the affected-row count.
    pub fn execute_write(&self, statement: &Statement) -> StoreResult<u64> {
        Ok(self
            .execute(statement, ResultMode::AffectedCount)?
            .affected()
            .unwrap_or(0))
    }

    /// Names of the user tables in the store.
    pub fn tables(&self) -> StoreResult<Vec<String>> {
        let mut handle = self.open_connection()?;
        let outcome = handle.tables();
        self.finish(handle, "list tables", outcome)
    }

    /// Roll back on failure, release the handle, and log the failure once.
    fn finish<T>(&self, mut handle: ConnectionHandle, shape: &str, outcome: StoreResult<T>) -> StoreResult<T> {
        if let Err(err) = &outcome {
            if let Err(rollback) = handle.rollback_transaction() {
                warn!(error = %rollback, "Rollback failed");
            }
            error!(
                code = err.code(),
                error = %err,
                driver = %handle.driver(),
                path = %self.location,
                sql = %shape,
                "Query execution error"
            );
        }

        if let Err(e) = handle.close() {
            warn!(error = %e, path = %self.location, "Error closing connection");
        }
        outcome
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("location", &self.location)
            .field("family", &self.family)
            .field("driver_override", &self.driver_override)
            .field("selected", &self.selected_driver())
            .field("open_handles", &self.open_handles())
            .finish()
    }
}

/// Builder for a [`ConnectionManager`].
#[derive(Default)]
pub struct ConnectionManagerBuilder {
    config: StoreConfig,
    registry: Option<Arc<dyn DriverRegistry>>,
}

impl ConnectionManagerBuilder {
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the store path.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.config = self.config.path(path);
        self
    }

    /// Set the root directory for the default file name.
    pub fn root_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config = self.config.root_dir(dir);
        self
    }

    /// Set the driver family prefix.
    pub fn driver_family(mut self, family: impl Into<String>) -> Self {
        self.config = self.config.driver_family(family);
        self
    }

    /// Pin a driver by name.
    pub fn driver(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.driver(name);
        self
    }

    /// Set the busy timeout in milliseconds.
    pub fn busy_timeout(mut self, ms: u64) -> Self {
        self.config = self.config.busy_timeout(ms);
        self
    }

    /// Use a specific driver registry.
    pub fn registry(mut self, registry: Arc<dyn DriverRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Apply `CLUBSTORE_*` overrides from the process environment.
    pub fn from_env(self) -> Self {
        self.env(&StdEnvSource)
    }

    /// Apply `CLUBSTORE_*` overrides from an environment source.
    pub fn env<S: EnvSource>(mut self, env: &S) -> Self {
        self.config = self.config.with_env(env);
        self
    }

    /// Build the manager, resolving the store location now.
    pub fn build(self) -> StoreResult<ConnectionManager> {
        match self.registry {
            Some(registry) => ConnectionManager::with_registry(self.config, registry),
            None => ConnectionManager::new(self.config),
        }
    }
}
