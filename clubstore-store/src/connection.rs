//! Connection handles.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, error, trace, warn};

use crate::driver::{DriverDescriptor, Session};
use crate::error::{DriverError, StoreError, StoreResult};
use crate::row::Row;
use crate::statement::Statement;

/// A live, exclusively owned session to the store.
///
/// The session is closed when the handle is closed or dropped. A handle that
/// is dropped with an open transaction rolls it back first, so a handle
/// abandoned on an error path never leaves a write behind.
pub struct ConnectionHandle {
    session: Option<Box<dyn Session>>,
    driver: DriverDescriptor,
    path: PathBuf,
    live: Arc<AtomicUsize>,
}

impl ConnectionHandle {
    pub(crate) fn new(
        session: Box<dyn Session>,
        driver: DriverDescriptor,
        path: PathBuf,
        live: Arc<AtomicUsize>,
    ) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self {
            session: Some(session),
            driver,
            path,
            live,
        }
    }

    fn session(&mut self) -> StoreResult<&mut (dyn Session + 'static)> {
        self.session
            .as_deref_mut()
            .ok_or_else(|| StoreError::query("connection is closed", ""))
    }

    /// Driver this handle was opened with.
    pub fn driver(&self) -> &DriverDescriptor {
        &self.driver
    }

    /// Store path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a transaction is open on this handle.
    pub fn in_transaction(&self) -> bool {
        self.session
            .as_deref()
            .map(|s| s.in_transaction())
            .unwrap_or(false)
    }

    /// Run a statement and fetch every row.
    pub fn query(&mut self, statement: &Statement) -> StoreResult<Vec<Row>> {
        self.query_rows(statement).inspect_err(|e| self.log_failure(statement, e))
    }

    /// Run a statement and fetch the first row, if any.
    pub fn query_one(&mut self, statement: &Statement) -> StoreResult<Option<Row>> {
        Ok(self.query(statement)?.into_iter().next())
    }

    /// Run a statement and return the affected-row count. Nothing is
    /// committed unless the handle is in autocommit mode.
    pub fn execute(&mut self, statement: &Statement) -> StoreResult<u64> {
        self.execute_statement(statement)
            .inspect_err(|e| self.log_failure(statement, e))
    }

    /// Start a transaction.
    pub fn begin(&mut self) -> StoreResult<()> {
        self.begin_transaction()
    }

    /// Commit the open transaction.
    pub fn commit(&mut self) -> StoreResult<()> {
        self.commit_transaction()
            .inspect_err(|e| error!(error = %e, path = %self.path.display(), "Commit failed"))
    }

    /// Roll back the open transaction.
    pub fn rollback(&mut self) -> StoreResult<()> {
        self.rollback_transaction()
    }

    /// Names of the user tables.
    pub fn tables(&mut self) -> StoreResult<Vec<String>> {
        self.session()?
            .tables()
            .map_err(|e| classify("tables", "list tables", e))
    }

    /// Run `SELECT 1`, proving the session can execute statements.
    pub fn probe(&mut self) -> StoreResult<()> {
        self.query(&Statement::new("SELECT 1")).map(|_| ())
    }

    /// Close the session, rolling back any open transaction.
    pub fn close(mut self) -> StoreResult<()> {
        self.release()
    }

    pub(crate) fn query_rows(&mut self, statement: &Statement) -> StoreResult<Vec<Row>> {
        trace!(sql = %statement.shape(), "Querying");
        self.session()?
            .query(statement.sql(), statement.params())
            .map_err(|e| classify("execute", &statement.shape(), e))
    }

    pub(crate) fn execute_statement(&mut self, statement: &Statement) -> StoreResult<u64> {
        trace!(sql = %statement.shape(), "Executing");
        self.session()?
            .execute(statement.sql(), statement.params())
            .map_err(|e| classify("execute", &statement.shape(), e))
    }

    pub(crate) fn execute_batch(
        &mut self,
        statement: &Statement,
        params_list: &[Vec<crate::types::Value>],
    ) -> StoreResult<u64> {
        trace!(sql = %statement.shape(), batch = params_list.len(), "Executing batch");
        self.session()?
            .execute_batch(statement.sql(), params_list)
            .map_err(|e| classify("execute", &statement.shape(), e))
    }

    pub(crate) fn begin_transaction(&mut self) -> StoreResult<()> {
        self.session()?
            .begin()
            .map_err(|e| classify("begin", "BEGIN", e))
    }

    pub(crate) fn commit_transaction(&mut self) -> StoreResult<()> {
        self.session()?
            .commit()
            .map_err(|e| classify("commit", "COMMIT", e))
    }

    pub(crate) fn rollback_transaction(&mut self) -> StoreResult<()> {
        let session = self.session()?;
        if !session.in_transaction() {
            return Ok(());
        }
        session
            .rollback()
            .map_err(|e| classify("rollback", "ROLLBACK", e))
    }

    fn release(&mut self) -> StoreResult<()> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };

        let rollback = if session.in_transaction() {
            debug!(path = %self.path.display(), "Rolling back open transaction on release");
            session.rollback()
        } else {
            Ok(())
        };
        let closed = session.close();

        rollback
            .and(closed)
            .map_err(|e| classify("close", "release connection", e))
    }

    fn log_failure(&self, statement: &Statement, err: &StoreError) {
        error!(
            code = err.code(),
            error = %err,
            driver = %self.driver,
            path = %self.path.display(),
            sql = %statement.shape(),
            "Statement failed"
        );
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(error = %e, path = %self.path.display(), "Error releasing connection");
        }
        self.live.fetch_sub(1, Ordering::SeqCst);
        trace!(path = %self.path.display(), "Connection released");
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("driver", &self.driver.name())
            .field("path", &self.path)
            .field("open", &self.session.is_some())
            .finish()
    }
}

/// Map a driver failure on an established session: lock waits become
/// timeouts, everything else is a query error carrying the driver message.
pub(crate) fn classify(operation: &str, statement: &str, err: DriverError) -> StoreError {
    if err.is_busy() {
        StoreError::timeout(operation, err.message)
    } else {
        StoreError::query(err.message, statement)
    }
}
