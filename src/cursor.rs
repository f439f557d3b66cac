//! Forward-only result cursors.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SqlHelperError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// A forward-only, single-pass view over the rows of one result set.
///
/// A cursor returned by [`execute_reader`](crate::helper::execute_reader) owns its
/// connection: dropping the cursor (or calling [`close`](Cursor::close)) releases it.
/// It cannot be rewound; run the command again for a fresh pass.
#[async_trait]
pub trait Cursor: Send {
    /// Column names of the result set, in ordinal order.
    fn column_names(&self) -> &[String];

    /// Advance to the next row. `Ok(None)` once the result set is exhausted.
    async fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, SqlHelperError>;

    /// Release the cursor and whatever connection it holds.
    fn close(self)
    where
        Self: Sized,
    {
        drop(self);
    }
}

/// Cursor over an in-memory [`ResultSet`].
#[derive(Debug)]
pub struct ResultSetCursor {
    column_names: Arc<Vec<String>>,
    rows: std::vec::IntoIter<Vec<RowValues>>,
}

impl ResultSetCursor {
    #[must_use]
    pub fn new(result_set: ResultSet) -> Self {
        let column_names = Arc::clone(result_set.get_column_names());
        let rows: Vec<Vec<RowValues>> = result_set.results.into_iter().map(|r| r.rows).collect();
        Self {
            column_names,
            rows: rows.into_iter(),
        }
    }

    /// Rows not yet read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

#[async_trait]
impl Cursor for ResultSetCursor {
    fn column_names(&self) -> &[String] {
        &self.column_names
    }

    async fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, SqlHelperError> {
        Ok(self.rows.next())
    }
}

impl From<ResultSet> for ResultSetCursor {
    fn from(result_set: ResultSet) -> Self {
        Self::new(result_set)
    }
}
