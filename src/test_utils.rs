//! In-memory stand-ins for a SQL Server connection.
//!
//! [`FakeServer`] plays the part of a connection descriptor: every `connect`
//! opens a [`FakeSession`] that answers statements through a responder
//! closure and records what it was sent. The server keeps count of open
//! sessions so tests can check that helpers and readers release them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::bulk::BulkColumn;
use crate::cursor::{Cursor, ResultSetCursor};
use crate::error::SqlHelperError;
use crate::results::ResultSet;
use crate::session::{Connect, SqlSession};
use crate::types::RowValues;

/// What the fake server answers to one statement.
#[derive(Debug, Clone)]
pub enum FakeResponse {
    /// A result set. As a non-query it reports one count: the number of rows.
    Rows(ResultSet),
    /// Affected-row counts, one per statement (empty = `SET NOCOUNT ON`).
    Affected(Vec<u64>),
    /// The server rejects the statement with this message.
    Fail(String),
}

type Responder = Arc<dyn Fn(&str, &[RowValues]) -> FakeResponse + Send + Sync>;

/// A statement as the session received it: rendered SQL plus positional values.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub sql: String,
    pub params: Vec<RowValues>,
}

#[derive(Default)]
struct FakeLog {
    open: AtomicUsize,
    opened: AtomicUsize,
    statements: Mutex<Vec<ExecutedStatement>>,
    loaded: Mutex<Vec<Vec<RowValues>>>,
    cursor_timeouts: Mutex<Vec<Duration>>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Connection source for tests. Clones share one log.
#[derive(Clone)]
pub struct FakeServer {
    responder: Responder,
    destination: Vec<BulkColumn>,
    fail_connect: Option<String>,
    fail_commit: bool,
    fail_rollback: bool,
    fail_bulk: Option<String>,
    log: Arc<FakeLog>,
}

impl FakeServer {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str, &[RowValues]) -> FakeResponse + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            destination: Vec::new(),
            fail_connect: None,
            fail_commit: false,
            fail_rollback: false,
            fail_bulk: None,
            log: Arc::default(),
        }
    }

    /// Answer every statement with `rows`.
    #[must_use]
    pub fn with_rows(rows: ResultSet) -> Self {
        Self::new(move |_, _| FakeResponse::Rows(rows.clone()))
    }

    /// Answer every statement with the given affected-row counts.
    #[must_use]
    pub fn with_affected(counts: Vec<u64>) -> Self {
        Self::new(move |_, _| FakeResponse::Affected(counts.clone()))
    }

    /// Insertable columns reported for any bulk insert destination.
    #[must_use]
    pub fn with_destination(mut self, columns: Vec<BulkColumn>) -> Self {
        self.destination = columns;
        self
    }

    #[must_use]
    pub fn failing_connect(mut self, message: impl Into<String>) -> Self {
        self.fail_connect = Some(message.into());
        self
    }

    #[must_use]
    pub fn failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    #[must_use]
    pub fn failing_rollback(mut self) -> Self {
        self.fail_rollback = true;
        self
    }

    #[must_use]
    pub fn failing_bulk_load(mut self, message: impl Into<String>) -> Self {
        self.fail_bulk = Some(message.into());
        self
    }

    /// Every statement received so far, transaction control included.
    #[must_use]
    pub fn statements(&self) -> Vec<ExecutedStatement> {
        locked(&self.log.statements).clone()
    }

    /// Just the SQL text of [`statements`](Self::statements).
    #[must_use]
    pub fn sql_log(&self) -> Vec<String> {
        locked(&self.log.statements)
            .iter()
            .map(|s| s.sql.clone())
            .collect()
    }

    /// Rows handed to bulk loads, in destination column order.
    #[must_use]
    pub fn loaded_rows(&self) -> Vec<Vec<RowValues>> {
        locked(&self.log.loaded).clone()
    }

    /// Timeout handed to each reader, in the order they were opened.
    #[must_use]
    pub fn cursor_timeouts(&self) -> Vec<Duration> {
        locked(&self.log.cursor_timeouts).clone()
    }

    /// Sessions currently open.
    #[must_use]
    pub fn connections_open(&self) -> usize {
        self.log.open.load(Ordering::SeqCst)
    }

    /// Sessions opened since the server was created.
    #[must_use]
    pub fn connections_opened(&self) -> usize {
        self.log.opened.load(Ordering::SeqCst)
    }

    fn open_session(&self) -> Result<FakeSession, SqlHelperError> {
        if let Some(message) = &self.fail_connect {
            return Err(SqlHelperError::ConnectionError(message.clone()));
        }
        self.log.open.fetch_add(1, Ordering::SeqCst);
        self.log.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            server: self.clone(),
        })
    }
}

#[async_trait]
impl Connect for FakeServer {
    type Session = FakeSession;

    async fn connect(self) -> Result<FakeSession, SqlHelperError> {
        self.open_session()
    }
}

#[async_trait]
impl Connect for &FakeServer {
    type Session = FakeSession;

    async fn connect(self) -> Result<FakeSession, SqlHelperError> {
        self.open_session()
    }
}

/// One open fake connection. Dropping it closes it.
pub struct FakeSession {
    server: FakeServer,
}

impl FakeSession {
    fn respond(&self, sql: &str, params: &[RowValues]) -> FakeResponse {
        locked(&self.server.log.statements).push(ExecutedStatement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        (self.server.responder)(sql, params)
    }

    fn record(&self, sql: &str) {
        locked(&self.server.log.statements).push(ExecutedStatement {
            sql: sql.to_string(),
            params: Vec::new(),
        });
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.server.log.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SqlSession for FakeSession {
    type Cursor = FakeCursor;

    async fn execute(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Vec<u64>, SqlHelperError> {
        match self.respond(sql, params) {
            FakeResponse::Rows(rows) => Ok(vec![rows.len() as u64]),
            FakeResponse::Affected(counts) => Ok(counts),
            FakeResponse::Fail(message) => Err(SqlHelperError::ExecutionError(message)),
        }
    }

    async fn query_scalar(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Option<RowValues>, SqlHelperError> {
        match self.respond(sql, params) {
            FakeResponse::Rows(rows) => Ok(rows
                .results
                .first()
                .and_then(|row| row.get_by_index(0))
                .cloned()),
            FakeResponse::Affected(_) => Ok(None),
            FakeResponse::Fail(message) => Err(SqlHelperError::ExecutionError(message)),
        }
    }

    async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlHelperError> {
        self.record(sql);
        if self.server.fail_commit && sql.starts_with("COMMIT") {
            return Err(SqlHelperError::ExecutionError("commit failed".to_string()));
        }
        if self.server.fail_rollback && sql.starts_with("ROLLBACK") {
            return Err(SqlHelperError::ConnectionError(
                "connection lost during rollback".to_string(),
            ));
        }
        Ok(())
    }

    async fn open_cursor(
        self,
        sql: String,
        params: Vec<RowValues>,
        timeout: Duration,
    ) -> Result<FakeCursor, SqlHelperError> {
        locked(&self.server.log.cursor_timeouts).push(timeout);
        let rows = match self.respond(&sql, &params) {
            FakeResponse::Rows(rows) => rows,
            FakeResponse::Affected(_) => ResultSet::default(),
            FakeResponse::Fail(message) => return Err(SqlHelperError::ExecutionError(message)),
        };
        Ok(FakeCursor {
            rows: ResultSetCursor::new(rows),
            _session: self,
        })
    }

    async fn bulk_columns(&mut self, table: &str) -> Result<Vec<BulkColumn>, SqlHelperError> {
        self.record(&format!("-- bulk columns of {table}"));
        if self.server.destination.is_empty() {
            return Err(SqlHelperError::ExecutionError(format!(
                "table `{table}` does not exist or has no insertable columns"
            )));
        }
        Ok(self.server.destination.clone())
    }

    async fn bulk_load(
        &mut self,
        table: &str,
        _columns: &[BulkColumn],
        rows: &[Vec<RowValues>],
    ) -> Result<u64, SqlHelperError> {
        self.record(&format!("-- bulk load into {table}"));
        if let Some(message) = &self.server.fail_bulk {
            return Err(SqlHelperError::ExecutionError(message.clone()));
        }
        locked(&self.server.log.loaded).extend(rows.iter().cloned());
        Ok(rows.len() as u64)
    }
}

/// Cursor over a fake result; holds its session open until dropped.
pub struct FakeCursor {
    rows: ResultSetCursor,
    _session: FakeSession,
}

impl FakeCursor {
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rows.remaining()
    }
}

#[async_trait]
impl Cursor for FakeCursor {
    fn column_names(&self) -> &[String] {
        self.rows.column_names()
    }

    async fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, SqlHelperError> {
        self.rows.next_row().await
    }
}
