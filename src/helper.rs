//! Execution helpers: one call, one connection.
//!
//! Each helper consumes a [`Connect`] value, opens (or takes) a session, runs a
//! single [`SqlCommand`] and lets the session go on every exit path. Every
//! round trip is bounded by the command timeout; nothing is retried.

use std::time::Duration;

use tracing::debug;

use crate::bulk::ColumnMappings;
use crate::command::{DEFAULT_COMMAND_TIMEOUT, SqlCommand, validate_object_name};
use crate::error::SqlHelperError;
use crate::results::ResultSet;
use crate::session::{Connect, SqlSession};
use crate::transaction::{Tx, with_timeout};
use crate::types::RowValues;

/// Cursor type produced by [`execute_reader`] for a given connection source.
pub type ReaderCursor<C> = <<C as Connect>::Session as SqlSession>::Cursor;

async fn open<C: Connect>(conn: C, timeout: Duration) -> Result<C::Session, SqlHelperError> {
    with_timeout(timeout, "connect", conn.connect()).await
}

fn affected_rows(counts: &[u64]) -> Result<i64, SqlHelperError> {
    if counts.is_empty() {
        return Ok(-1);
    }
    let total: u64 = counts.iter().sum();
    i64::try_from(total).map_err(|e| {
        SqlHelperError::ExecutionError(format!("affected row count {total} out of range: {e}"))
    })
}

/// Run a command that returns no rows.
///
/// Returns the number of rows affected, summed over every statement, or `-1`
/// when the server reported no counts (e.g. `SET NOCOUNT ON`).
///
/// # Errors
///
/// Returns `ParameterError` for an invalid command, `ConnectionError` if the
/// connection cannot be opened, and `ExecutionError` if the server fails or the
/// timeout elapses.
pub async fn execute_non_query<C: Connect>(
    conn: C,
    command: &SqlCommand,
) -> Result<i64, SqlHelperError> {
    let (sql, params) = command.render()?;
    debug!(command = command.command_text(), params = params.len(), "execute_non_query");

    let mut session = open(conn, command.timeout()).await?;
    let counts = with_timeout(
        command.timeout(),
        "command",
        session.execute(&sql, &params),
    )
    .await?;
    affected_rows(&counts)
}

/// [`execute_non_query`] inside `BEGIN TRANSACTION` / `COMMIT`.
///
/// # Errors
///
/// Fails before the transaction starts with the same errors as
/// [`execute_non_query`]. Once it has started, any failure is rolled back and
/// returned as `TransactionError`.
pub async fn execute_non_query_with_transaction<C: Connect>(
    conn: C,
    command: &SqlCommand,
) -> Result<i64, SqlHelperError> {
    let (sql, params) = command.render()?;
    debug!(
        command = command.command_text(),
        params = params.len(),
        "execute_non_query_with_transaction"
    );

    let mut session = open(conn, command.timeout()).await?;
    let mut tx = Tx::begin(&mut session, command.timeout()).await?;
    let outcome = match with_timeout(
        command.timeout(),
        "command",
        tx.session().execute(&sql, &params),
    )
    .await
    {
        Ok(counts) => affected_rows(&counts),
        Err(e) => Err(e),
    };
    tx.finish(outcome).await
}

/// First column of the first row.
///
/// `Ok(None)` when the command returned no rows; a NULL cell is
/// `Ok(Some(RowValues::Null))`.
///
/// # Errors
///
/// Same as [`execute_non_query`].
pub async fn execute_scalar<C: Connect>(
    conn: C,
    command: &SqlCommand,
) -> Result<Option<RowValues>, SqlHelperError> {
    let (sql, params) = command.render()?;
    debug!(command = command.command_text(), params = params.len(), "execute_scalar");

    let mut session = open(conn, command.timeout()).await?;
    with_timeout(
        command.timeout(),
        "command",
        session.query_scalar(&sql, &params),
    )
    .await
}

/// Run a query and return a cursor over its first result set.
///
/// The command timeout covers opening the reader and every later wait for
/// rows from the server.
///
/// The cursor owns the connection: it is closed when the cursor is dropped or
/// [`close`](crate::cursor::Cursor::close)d, or, through
/// [`SqlReader`](crate::mapping::SqlReader), when the rows run out.
///
/// # Errors
///
/// Same as [`execute_non_query`]; the connection is closed before returning.
pub async fn execute_reader<C: Connect>(
    conn: C,
    command: &SqlCommand,
) -> Result<ReaderCursor<C>, SqlHelperError> {
    let (sql, params) = command.render()?;
    debug!(command = command.command_text(), params = params.len(), "execute_reader");

    let session = open(conn, command.timeout()).await?;
    with_timeout(
        command.timeout(),
        "command",
        session.open_cursor(sql, params, command.timeout()),
    )
    .await
}

/// Copy the rows of `source` into `table` in one transaction.
///
/// Each name in `columns` maps the source column of that name onto the
/// destination column of that name; their order does not matter. Destination
/// columns that are not listed are written as NULL. Returns the number of
/// rows copied.
///
/// # Errors
///
/// Returns `ParameterError` for an invalid table name. Once the transaction
/// has started, any failure (including a column missing on either side) is
/// rolled back and returned as `TransactionError`.
pub async fn bulk_insert<C, S>(
    conn: C,
    table: &str,
    columns: &[S],
    source: &ResultSet,
) -> Result<u64, SqlHelperError>
where
    C: Connect,
    S: AsRef<str>,
{
    validate_object_name(table)?;
    debug!(table, columns = columns.len(), rows = source.len(), "bulk_insert");

    let timeout = DEFAULT_COMMAND_TIMEOUT;
    let mut session = open(conn, timeout).await?;
    let mut tx = Tx::begin(&mut session, timeout).await?;
    let outcome = load(tx.session(), table, columns, source, timeout).await;
    tx.finish(outcome).await
}

async fn load<T: SqlSession, S: AsRef<str>>(
    session: &mut T,
    table: &str,
    columns: &[S],
    source: &ResultSet,
    timeout: Duration,
) -> Result<u64, SqlHelperError> {
    let destination = with_timeout(timeout, "column discovery", session.bulk_columns(table)).await?;
    let mappings = ColumnMappings::resolve(columns, source, &destination)?;
    let rows = mappings.align_all(source);
    let copied = with_timeout(
        timeout,
        "bulk load",
        session.bulk_load(table, &destination, &rows),
    )
    .await?;
    debug!(table, copied, "bulk load complete");
    Ok(copied)
}
