//! The connection seam the execution helpers are written against.

use std::time::Duration;

use async_trait::async_trait;

use crate::bulk::BulkColumn;
use crate::cursor::Cursor;
use crate::error::SqlHelperError;
use crate::types::RowValues;

/// An open connection able to run rendered SQL.
///
/// SQL handed to a session is already rendered: positional `@P1..@Pn`
/// placeholders with `params` in the same order.
#[async_trait]
pub trait SqlSession: Send + Sized + 'static {
    type Cursor: Cursor + 'static;

    /// Run a statement; returns the affected-row count of every statement the
    /// server reported one for (possibly none).
    async fn execute(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Vec<u64>, SqlHelperError>;

    /// First column of the first row, or `None` for an empty result.
    async fn query_scalar(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Option<RowValues>, SqlHelperError>;

    /// Run parameterless batch text (transaction control).
    async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlHelperError>;

    /// Run a query and hand the connection over to the returned cursor.
    ///
    /// `timeout` bounds every wait on the server, later row fetches included.
    async fn open_cursor(
        self,
        sql: String,
        params: Vec<RowValues>,
        timeout: Duration,
    ) -> Result<Self::Cursor, SqlHelperError>;

    /// Insertable columns of `table`, in the order a bulk load must supply them.
    async fn bulk_columns(&mut self, table: &str) -> Result<Vec<BulkColumn>, SqlHelperError>;

    /// Bulk-load rows already aligned with `columns` (as returned by
    /// [`bulk_columns`](SqlSession::bulk_columns)). Returns the number of rows written.
    async fn bulk_load(
        &mut self,
        table: &str,
        columns: &[BulkColumn],
        rows: &[Vec<RowValues>],
    ) -> Result<u64, SqlHelperError>;
}

/// Something that yields an open session: a descriptor to connect with, or a
/// session that is already open.
#[async_trait]
pub trait Connect: Send {
    type Session: SqlSession;

    async fn connect(self) -> Result<Self::Session, SqlHelperError>;
}
