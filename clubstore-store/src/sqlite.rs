//! Bundled SQLite driver.

use std::sync::Arc;
use std::time::Duration;

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, ErrorCode, OpenFlags, ToSql, params_from_iter};
use tracing::trace;

use crate::driver::{ConnectionDescriptor, Driver, DriverDescriptor, Session};
use crate::error::{DriverError, DriverErrorKind, DriverResult};
use crate::row::Row;
use crate::types::Value;

/// Registry name of the bundled driver.
pub const SQLITE_DRIVER_NAME: &str = "SQLite3 Driver (*.db, *.sqlite, *.sqlite3)";

/// Extensions the bundled driver claims.
pub const SQLITE_EXTENSIONS: [&str; 3] = ["db", "sqlite", "sqlite3"];

/// Version of the linked SQLite library.
pub fn library_version() -> &'static str {
    rusqlite::version()
}

const USER_TABLES_SQL: &str =
    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

/// Driver for single-file SQLite stores.
///
/// Opens read-write without create, so a missing file is an open failure
/// instead of a fresh empty store.
#[derive(Debug, Clone)]
pub struct SqliteDriver {
    descriptor: DriverDescriptor,
    busy_timeout_ms: Option<u64>,
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SqliteDriver {
    /// Create the driver with the default registry name.
    pub fn new() -> Self {
        Self::named(SQLITE_DRIVER_NAME)
    }

    /// Create the driver under a different registry name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            descriptor: DriverDescriptor::new(name, SQLITE_EXTENSIONS),
            busy_timeout_ms: None,
        }
    }

    /// Set how long a session waits on a locked store.
    pub fn busy_timeout(mut self, ms: Option<u64>) -> Self {
        self.busy_timeout_ms = ms;
        self
    }
}

impl Driver for SqliteDriver {
    fn descriptor(&self) -> &DriverDescriptor {
        &self.descriptor
    }

    fn connect(&self, descriptor: &ConnectionDescriptor) -> DriverResult<Box<dyn Session>> {
        trace!(descriptor = %descriptor, "Opening SQLite session");

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
            | OpenFlags::SQLITE_OPEN_URI;
        let conn = Connection::open_with_flags(&descriptor.path, flags)
            .map_err(|e| classify(e, DriverErrorKind::Open))?;

        if let Some(ms) = self.busy_timeout_ms {
            conn.busy_timeout(Duration::from_millis(ms))
                .map_err(|e| classify(e, DriverErrorKind::Open))?;
        }

        // SQLite opens lazily; reading the header rejects files that are not
        // databases.
        conn.query_row("PRAGMA schema_version", [], |row| row.get::<_, i64>(0))
            .map_err(|e| classify(e, DriverErrorKind::Open))?;

        Ok(Box::new(SqliteSession { conn }))
    }
}

struct SqliteSession {
    conn: Connection,
}

impl Session for SqliteSession {
    fn begin(&mut self) -> DriverResult<()> {
        self.conn.execute_batch("BEGIN").map_err(statement_error)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> DriverResult<Vec<Row>> {
        let mut stmt = self.conn.prepare(sql).map_err(statement_error)?;
        // Fetching from a write would run it and then roll it back unseen.
        if stmt.column_count() == 0 {
            return Err(DriverError::statement(
                "statement returns no rows; execute it in AffectedCount mode",
            ));
        }
        let columns: Arc<[String]> = stmt
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into();

        let mut rows = stmt
            .query(params_from_iter(params.iter()))
            .map_err(statement_error)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(statement_error)? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(from_value_ref(row.get_ref(i).map_err(statement_error)?));
            }
            out.push(Row::new(Arc::clone(&columns), values));
        }
        Ok(out)
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> DriverResult<u64> {
        let affected = self
            .conn
            .execute(sql, params_from_iter(params.iter()))
            .map_err(statement_error)?;
        Ok(affected as u64)
    }

    fn execute_batch(&mut self, sql: &str, params_list: &[Vec<Value>]) -> DriverResult<u64> {
        let mut stmt = self.conn.prepare(sql).map_err(statement_error)?;
        let mut total = 0u64;
        for params in params_list {
            total += stmt
                .execute(params_from_iter(params.iter()))
                .map_err(statement_error)? as u64;
        }
        Ok(total)
    }

    fn commit(&mut self) -> DriverResult<()> {
        self.conn.execute_batch("COMMIT").map_err(statement_error)
    }

    fn rollback(&mut self) -> DriverResult<()> {
        self.conn.execute_batch("ROLLBACK").map_err(statement_error)
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn tables(&mut self) -> DriverResult<Vec<String>> {
        let mut stmt = self.conn.prepare(USER_TABLES_SQL).map_err(statement_error)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(statement_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(statement_error)?;
        Ok(names)
    }

    fn close(self: Box<Self>) -> DriverResult<()> {
        self.conn
            .close()
            .map_err(|(_, e)| classify(e, DriverErrorKind::Other))
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(match self {
            Value::Null => ValueRef::Null,
            Value::Integer(i) => ValueRef::Integer(*i),
            Value::Real(f) => ValueRef::Real(*f),
            Value::Text(s) => ValueRef::Text(s.as_bytes()),
            Value::Blob(b) => ValueRef::Blob(b.as_slice()),
        }))
    }
}

/// Convert a borrowed SQLite value into an owned [`Value`].
pub fn from_value_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

fn statement_error(err: rusqlite::Error) -> DriverError {
    classify(err, DriverErrorKind::Statement)
}

/// Busy and locked failures are reported as [`DriverErrorKind::Busy`]
/// regardless of where they happened.
fn classify(err: rusqlite::Error, fallback: DriverErrorKind) -> DriverError {
    let kind = match err.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => DriverErrorKind::Busy,
        _ => fallback,
    };
    DriverError::new(kind, err.to_string())
}
