use std::collections::HashMap;
use std::sync::Arc;

use super::row::{CustomDbRow, index_columns};
use crate::error::SqlHelperError;
use crate::types::RowValues;

/// An in-memory table: shared column names plus rows.
///
/// It is the source of a bulk insert and the backing store of
/// [`ResultSetCursor`](crate::cursor::ResultSetCursor).
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows of the table
    pub results: Vec<CustomDbRow>,
    /// Rows affected as reported for the statement that produced this set
    pub rows_affected: usize,
    column_names: Arc<Vec<String>>,
    column_index: Arc<HashMap<String, usize>>,
}

impl ResultSet {
    /// Create an empty table with the given columns.
    #[must_use]
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let column_names: Vec<String> = columns.into_iter().map(Into::into).collect();
        let column_index = Arc::new(index_columns(&column_names));
        Self {
            results: Vec::new(),
            rows_affected: 0,
            column_names: Arc::new(column_names),
            column_index,
        }
    }

    #[must_use]
    pub fn get_column_names(&self) -> &Arc<Vec<String>> {
        &self.column_names
    }

    /// Position of a column, matched exactly (case-sensitive).
    #[must_use]
    pub fn column_position(&self, column_name: &str) -> Option<usize> {
        self.column_index.get(column_name).copied()
    }

    /// Append a row.
    ///
    /// # Errors
    ///
    /// Returns `SqlHelperError::ParameterError` if the row width does not match the columns.
    pub fn add_row_values(&mut self, row_values: Vec<RowValues>) -> Result<(), SqlHelperError> {
        if row_values.len() != self.column_names.len() {
            return Err(SqlHelperError::ParameterError(format!(
                "row has {} values but the table has {} columns",
                row_values.len(),
                self.column_names.len()
            )));
        }
        self.results.push(CustomDbRow {
            column_names: Arc::clone(&self.column_names),
            rows: row_values,
            column_index: Arc::clone(&self.column_index),
        });
        self.rows_affected += 1;
        Ok(())
    }

    /// Builder-style [`add_row_values`](Self::add_row_values).
    ///
    /// # Errors
    ///
    /// Returns `SqlHelperError::ParameterError` if the row width does not match the columns.
    pub fn with_row(mut self, row_values: Vec<RowValues>) -> Result<Self, SqlHelperError> {
        self.add_row_values(row_values)?;
        Ok(self)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
