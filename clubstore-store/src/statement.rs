//! Parameterized statements and their results.

use std::fmt;

use crate::row::Row;
use crate::types::Value;

/// Longest SQL prefix that goes into log lines.
const SHAPE_MAX_LEN: usize = 80;

/// SQL text plus positional parameters.
///
/// Parameters are always bound through `?` placeholders by the driver; the
/// SQL text itself is never assembled from parameter values.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<Value>,
}

impl Statement {
    /// Create a statement with no parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Create a statement with parameters.
    pub fn with_params<I, V>(sql: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            sql: sql.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Append one positional parameter.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// The SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound parameter values.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Number of `?` placeholders outside of quoted literals.
    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.sql)
    }

    /// A log-safe description of the statement: the first line of SQL
    /// (truncated) and parameter counts, never the values.
    pub fn shape(&self) -> String {
        shape_of(&self.sql, self.params.len())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.shape())
    }
}

/// Log-safe shape of `sql` executed with `param_count` parameters.
pub fn shape_of(sql: &str, param_count: usize) -> String {
    let collapsed = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut head: String = collapsed.chars().take(SHAPE_MAX_LEN).collect();
    if collapsed.chars().count() > SHAPE_MAX_LEN {
        head.push_str("...");
    }
    format!(
        "{} [{} placeholders, {} params]",
        head,
        count_placeholders(sql),
        param_count
    )
}

fn count_placeholders(sql: &str) -> usize {
    let mut count = 0;
    let mut quote: Option<char> = None;
    for c in sql.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, '[') => quote = Some(']'),
            (None, '?') => count += 1,
            (None, _) => {}
        }
    }
    count
}

/// What the caller expects back from [`execute`](crate::ConnectionManager::execute).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResultMode {
    /// Fetch and return every row. Nothing is committed.
    #[default]
    Rows,
    /// Commit and return the affected-row count.
    AffectedCount,
}

impl ResultMode {
    /// Map the familiar `expect_rows` flag onto a mode.
    pub fn from_expect_rows(expect_rows: bool) -> Self {
        if expect_rows {
            Self::Rows
        } else {
            Self::AffectedCount
        }
    }
}

/// Outcome of one statement execution.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// Rows of a read.
    Rows(Vec<Row>),
    /// Affected-row count of a committed write.
    Affected(u64),
}

impl ExecutionResult {
    /// Rows, if this was a read.
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            Self::Rows(rows) => Some(rows),
            Self::Affected(_) => None,
        }
    }

    /// Affected-row count, if this was a write.
    pub fn affected(&self) -> Option<u64> {
        match self {
            Self::Rows(_) => None,
            Self::Affected(n) => Some(*n),
        }
    }

    /// Consume into rows; a write yields no rows.
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Self::Rows(rows) => rows,
            Self::Affected(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind() {
        let stmt = Statement::new("INSERT INTO TEAMS (TeamName, Founded) VALUES (?, ?)")
            .bind("Falcons")
            .bind(1921);
        assert_eq!(stmt.params(), &[Value::from("Falcons"), Value::Integer(1921)]);
        assert_eq!(stmt.placeholder_count(), 2);
    }

    #[test]
    fn test_with_params() {
        let stmt = Statement::with_params("SELECT * FROM TEAMS WHERE TeamID = ?", [2i64]);
        assert_eq!(stmt.params(), &[Value::Integer(2)]);
    }

    #[test]
    fn test_placeholders_ignore_literals() {
        let stmt = Statement::new("SELECT '?' AS q, [Why?] FROM T WHERE a = ? AND b = \"?\"");
        assert_eq!(stmt.placeholder_count(), 1);
    }

    #[test]
    fn test_shape_hides_values() {
        let stmt = Statement::new("INSERT INTO USERS (Username, Password)\n   VALUES (?, ?)")
            .bind("admin")
            .bind("hunter2");
        let shape = stmt.shape();
        assert_eq!(
            shape,
            "INSERT INTO USERS (Username, Password) VALUES (?, ?) [2 placeholders, 2 params]"
        );
        assert!(!shape.contains("hunter2"));
    }

    #[test]
    fn test_shape_truncates() {
        let sql = format!("SELECT {} FROM T", "x, ".repeat(60));
        assert!(shape_of(&sql, 0).contains("..."));
    }

    #[test]
    fn test_result_mode() {
        assert_eq!(ResultMode::from_expect_rows(true), ResultMode::Rows);
        assert_eq!(ResultMode::from_expect_rows(false), ResultMode::AffectedCount);
        assert_eq!(ResultMode::default(), ResultMode::Rows);
    }

    #[test]
    fn test_execution_result_accessors() {
        assert_eq!(ExecutionResult::Affected(3).affected(), Some(3));
        assert!(ExecutionResult::Affected(3).rows().is_none());
        assert!(ExecutionResult::Rows(vec![]).into_rows().is_empty());
    }
}
