//! Reader cursor for SQL Server.
//!
//! The driver's row stream borrows its client, so a cursor that must own the
//! connection cannot hold the stream directly. Instead a task takes the client,
//! runs the query and feeds rows through a bounded channel. Dropping the cursor
//! aborts the task, which drops the client and closes the connection.
//!
//! The command timeout applies to each wait on the server, not to the time
//! the reader spends between rows.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use tiberius::QueryItem;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use super::MssqlClient;
use super::params::bind_query_params;
use super::query::row_to_values;
use crate::cursor::Cursor;
use crate::error::SqlHelperError;
use crate::transaction::with_timeout;
use crate::types::RowValues;

/// Rows fetched ahead of the reader.
const ROW_BUFFER: usize = 64;

type RowMessage = Result<Vec<RowValues>, SqlHelperError>;

struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Forward-only cursor over the first result set of a query. Owns its connection.
pub struct MssqlCursor {
    column_names: Vec<String>,
    rows: mpsc::Receiver<RowMessage>,
    _producer: AbortOnDrop,
}

impl MssqlCursor {
    /// Run `sql` on `client` and wait for the result metadata.
    ///
    /// # Errors
    ///
    /// Returns `SqlHelperError::ExecutionError` if the server rejects the query
    /// or does not answer within `timeout`. The connection is closed in that case.
    pub async fn open(
        client: MssqlClient,
        sql: String,
        params: Vec<RowValues>,
        timeout: Duration,
    ) -> Result<Self, SqlHelperError> {
        let (columns_tx, columns_rx) = oneshot::channel();
        let (rows_tx, rows_rx) = mpsc::channel(ROW_BUFFER);
        let producer = AbortOnDrop(tokio::spawn(produce_rows(
            client, sql, params, timeout, columns_tx, rows_tx,
        )));

        let column_names = columns_rx.await.map_err(|_| {
            SqlHelperError::ExecutionError(
                "reader stopped before the result metadata arrived".to_string(),
            )
        })??;

        Ok(Self {
            column_names,
            rows: rows_rx,
            _producer: producer,
        })
    }
}

#[async_trait]
impl Cursor for MssqlCursor {
    fn column_names(&self) -> &[String] {
        &self.column_names
    }

    async fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, SqlHelperError> {
        match self.rows.recv().await {
            Some(row) => row.map(Some),
            None => Ok(None),
        }
    }
}

async fn produce_rows(
    mut client: MssqlClient,
    sql: String,
    params: Vec<RowValues>,
    timeout: Duration,
    columns_tx: oneshot::Sender<Result<Vec<String>, SqlHelperError>>,
    rows_tx: mpsc::Sender<RowMessage>,
) {
    let mut columns_tx = Some(columns_tx);
    let outcome = stream_first_result(
        &mut client,
        &sql,
        &params,
        timeout,
        &mut columns_tx,
        &rows_tx,
    )
    .await;

    match (outcome, columns_tx.take()) {
        (Err(e), Some(tx)) => {
            let _ = tx.send(Err(e));
        }
        (Err(e), None) => {
            let _ = rows_tx.send(Err(e)).await;
        }
        // statement produced no result set at all
        (Ok(()), Some(tx)) => {
            let _ = tx.send(Ok(Vec::new()));
        }
        (Ok(()), None) => {}
    }
    debug!("reader finished, closing its connection");
}

async fn stream_first_result(
    client: &mut MssqlClient,
    sql: &str,
    params: &[RowValues],
    timeout: Duration,
    columns_tx: &mut Option<oneshot::Sender<Result<Vec<String>, SqlHelperError>>>,
    rows_tx: &mpsc::Sender<RowMessage>,
) -> Result<(), SqlHelperError> {
    let mut stream = with_timeout(timeout, "reader", async {
        bind_query_params(sql, params)
            .query(client)
            .await
            .map_err(|e| SqlHelperError::ExecutionError(format!("MSSQL query error: {e}")))
    })
    .await?;

    while let Some(item) = with_timeout(timeout, "row fetch", async {
        stream
            .try_next()
            .await
            .map_err(|e| SqlHelperError::ExecutionError(format!("MSSQL row fetch error: {e}")))
    })
    .await?
    {
        match item {
            QueryItem::Metadata(meta) if meta.result_index() == 0 => {
                let names = meta
                    .columns()
                    .iter()
                    .map(|column| column.name().to_string())
                    .collect();
                if let Some(tx) = columns_tx.take()
                    && tx.send(Ok(names)).is_err()
                {
                    return Ok(());
                }
            }
            QueryItem::Metadata(_) => break,
            QueryItem::Row(row) => {
                if row.result_index() != 0 {
                    break;
                }
                let values = row_to_values(row)?;
                // receiver gone: the cursor was closed early
                if rows_tx.send(Ok(values)).await.is_err() {
                    return Ok(());
                }
            }
        }
    }
    Ok(())
}
