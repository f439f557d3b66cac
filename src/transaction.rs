//! Explicit transactions over any [`SqlSession`].

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use crate::error::SqlHelperError;
use crate::session::SqlSession;

/// Await `fut`, failing with `SqlHelperError::ExecutionError` once `limit` elapses.
///
/// # Errors
///
/// Returns the future's own error, or `ExecutionError` naming `what` on timeout.
pub(crate) async fn with_timeout<T, F>(
    limit: Duration,
    what: &str,
    fut: F,
) -> Result<T, SqlHelperError>
where
    F: Future<Output = Result<T, SqlHelperError>>,
{
    tokio::time::timeout(limit, fut).await.map_err(|_| {
        SqlHelperError::ExecutionError(format!("{what} timed out after {}s", limit.as_secs()))
    })?
}

/// A transaction in progress on a borrowed session.
///
/// Dropping a `Tx` without calling [`finish`](Tx::finish) leaves the connection
/// mid-transaction; the server rolls it back when the connection closes.
pub struct Tx<'a, S: SqlSession> {
    session: &'a mut S,
    timeout: Duration,
}

impl<'a, S: SqlSession> Tx<'a, S> {
    /// Issue `BEGIN TRANSACTION`.
    ///
    /// # Errors
    ///
    /// Returns `SqlHelperError::ExecutionError` if the statement fails or times out.
    pub async fn begin(session: &'a mut S, timeout: Duration) -> Result<Self, SqlHelperError> {
        with_timeout(
            timeout,
            "BEGIN TRANSACTION",
            session.execute_batch("BEGIN TRANSACTION"),
        )
        .await?;
        Ok(Self { session, timeout })
    }

    /// The session, for statements that belong to the transaction.
    pub fn session(&mut self) -> &mut S {
        self.session
    }

    /// Commit on `Ok`, roll back on `Err`.
    ///
    /// A failed commit is rolled back as well. Every failure comes back as
    /// `SqlHelperError::TransactionError` carrying the original error and, if
    /// the rollback also failed, the rollback error.
    ///
    /// # Errors
    ///
    /// Returns `SqlHelperError::TransactionError` unless the commit succeeds.
    pub async fn finish<T>(self, outcome: Result<T, SqlHelperError>) -> Result<T, SqlHelperError> {
        let failure = match outcome {
            Ok(value) => {
                match with_timeout(
                    self.timeout,
                    "COMMIT TRANSACTION",
                    self.session.execute_batch("COMMIT TRANSACTION"),
                )
                .await
                {
                    Ok(()) => return Ok(value),
                    Err(e) => e,
                }
            }
            Err(e) => e,
        };

        let rollback = with_timeout(
            self.timeout,
            "ROLLBACK TRANSACTION",
            self.session.execute_batch("ROLLBACK TRANSACTION"),
        )
        .await;

        match rollback {
            Ok(()) => {
                warn!(kind = failure.kind(), error = %failure, "transaction rolled back");
                Err(SqlHelperError::rolled_back(failure, None))
            }
            Err(rollback_error) => {
                error!(
                    error = %failure,
                    rollback_error = %rollback_error,
                    "transaction rollback failed"
                );
                Err(SqlHelperError::rolled_back(failure, Some(rollback_error)))
            }
        }
    }
}
