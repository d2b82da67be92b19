//! Result rows.

use std::sync::Arc;

use serde::Serialize;

use crate::types::{FromValue, FromValueError, Value};

/// One row of a result set.
///
/// Column names are shared between all rows of the same result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    #[serde(skip)]
    columns: Arc<[String]>,
    values: Vec<Value>,
}

/// Error reading a column from a [`Row`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    /// Index past the last column.
    #[error("column index {index} out of range ({len} columns)")]
    OutOfRange {
        /// Requested index.
        index: usize,
        /// Number of columns.
        len: usize,
    },
    /// No column with this name.
    #[error("no column named '{0}'")]
    NoSuchColumn(String),
    /// The value has the wrong type.
    #[error("column '{column}': {source}")]
    Conversion {
        /// Column name.
        column: String,
        /// Underlying conversion error.
        #[source]
        source: FromValueError,
    },
}

impl Row {
    /// Create a row. `values` must line up with `columns`.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Raw values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consume the row, returning its values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read a column by position.
    pub fn get<T: FromValue>(&self, index: usize) -> Result<T, RowError> {
        let value = self.values.get(index).ok_or(RowError::OutOfRange {
            index,
            len: self.values.len(),
        })?;
        T::from_value(value).map_err(|source| RowError::Conversion {
            column: self.columns[index].clone(),
            source,
        })
    }

    /// Read a column by name, ignoring ASCII case.
    pub fn get_by_name<T: FromValue>(&self, column: &str) -> Result<T, RowError> {
        let index = self
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .ok_or_else(|| RowError::NoSuchColumn(column.to_string()))?;
        self.get(index)
    }
}
