use std::time::Duration;

use async_trait::async_trait;
use tiberius::{Query, TokenRow};
use tracing::debug;

use super::MssqlClient;
use super::bulk::{BULK_COLUMNS_SQL, bulk_value, check_bulk_columns};
use super::cursor::MssqlCursor;
use super::params::bind_query_params;
use super::query::{column_to_value, row_to_values};
use crate::bulk::BulkColumn;
use crate::error::SqlHelperError;
use crate::session::SqlSession;
use crate::types::RowValues;

#[async_trait]
impl SqlSession for MssqlClient {
    type Cursor = MssqlCursor;

    async fn execute(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Vec<u64>, SqlHelperError> {
        let exec_result = bind_query_params(sql, params)
            .execute(self)
            .await
            .map_err(|e| SqlHelperError::ExecutionError(format!("MSSQL execute error: {e}")))?;
        Ok(exec_result.rows_affected().to_vec())
    }

    async fn query_scalar(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Option<RowValues>, SqlHelperError> {
        let row = bind_query_params(sql, params)
            .query(self)
            .await
            .map_err(|e| SqlHelperError::ExecutionError(format!("MSSQL query error: {e}")))?
            .into_row()
            .await
            .map_err(|e| SqlHelperError::ExecutionError(format!("MSSQL row fetch error: {e}")))?;

        match row {
            Some(row) => Ok(row.into_iter().next().map(column_to_value).transpose()?),
            None => Ok(None),
        }
    }

    async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlHelperError> {
        Query::new(sql).execute(self).await.map_err(|e| {
            SqlHelperError::ExecutionError(format!("MSSQL execute_batch error: {e}"))
        })?;
        Ok(())
    }

    async fn open_cursor(
        self,
        sql: String,
        params: Vec<RowValues>,
        timeout: Duration,
    ) -> Result<MssqlCursor, SqlHelperError> {
        MssqlCursor::open(self, sql, params, timeout).await
    }

    async fn bulk_columns(&mut self, table: &str) -> Result<Vec<BulkColumn>, SqlHelperError> {
        let rows = bind_query_params(BULK_COLUMNS_SQL, &[RowValues::Text(table.to_string())])
            .query(self)
            .await
            .map_err(|e| SqlHelperError::ExecutionError(format!("MSSQL query error: {e}")))?
            .into_first_result()
            .await
            .map_err(|e| SqlHelperError::ExecutionError(format!("MSSQL row fetch error: {e}")))?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            if let [RowValues::Text(name), RowValues::Text(type_name)] =
                row_to_values(row)?.as_slice()
            {
                columns.push(BulkColumn::new(name.clone(), type_name.clone()));
            }
        }
        if columns.is_empty() {
            return Err(SqlHelperError::ExecutionError(format!(
                "table `{table}` does not exist or has no insertable columns"
            )));
        }
        debug!(table, columns = columns.len(), "resolved bulk insert columns");
        Ok(columns)
    }

    async fn bulk_load(
        &mut self,
        table: &str,
        columns: &[BulkColumn],
        rows: &[Vec<RowValues>],
    ) -> Result<u64, SqlHelperError> {
        check_bulk_columns(columns)?;
        let mut request = self.bulk_insert(table).await.map_err(|e| {
            SqlHelperError::ExecutionError(format!("MSSQL bulk insert error: {e}"))
        })?;

        for row in rows {
            let mut token_row = TokenRow::with_capacity(columns.len());
            for (value, column) in row.iter().zip(columns) {
                token_row.push(bulk_value(value, column)?);
            }
            request.send(token_row).await.map_err(|e| {
                SqlHelperError::ExecutionError(format!("MSSQL bulk insert error: {e}"))
            })?;
        }

        let result = request.finalize().await.map_err(|e| {
            SqlHelperError::ExecutionError(format!("MSSQL bulk insert error: {e}"))
        })?;
        Ok(result.total())
    }
}
