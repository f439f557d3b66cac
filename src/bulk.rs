//! Column alignment for bulk inserts.
//!
//! Every mapped column name is copied from the source column of that name into
//! the destination column of that name. Rows are re-laid out in destination
//! order before they reach the driver, so the order in which the caller lists
//! the columns never matters.

use crate::error::SqlHelperError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// An insertable destination column and its SQL Server type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkColumn {
    pub name: String,
    pub type_name: String,
}

impl BulkColumn {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// For each destination column, the source ordinal feeding it (`None` = NULL).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMappings {
    sources: Vec<Option<usize>>,
}

impl ColumnMappings {
    /// Resolve the identity mapping for `columns`.
    ///
    /// Source names match exactly. Destination names match exactly first, then
    /// ASCII case-insensitively, as a default-collation server would.
    ///
    /// # Errors
    ///
    /// Returns `SqlHelperError::ParameterError` if `columns` is empty, a column
    /// is missing on either side, or two entries name the same destination.
    pub fn resolve<S: AsRef<str>>(
        columns: &[S],
        source: &ResultSet,
        destination: &[BulkColumn],
    ) -> Result<Self, SqlHelperError> {
        if columns.is_empty() {
            return Err(SqlHelperError::ParameterError(
                "bulk insert needs at least one mapped column".to_string(),
            ));
        }

        let mut sources = vec![None; destination.len()];
        for column in columns {
            let column = column.as_ref();
            let source_ordinal = source.column_position(column).ok_or_else(|| {
                SqlHelperError::ParameterError(format!(
                    "column `{column}` is not present in the source rows"
                ))
            })?;
            let destination_ordinal = destination
                .iter()
                .position(|d| d.name == column)
                .or_else(|| {
                    destination
                        .iter()
                        .position(|d| d.name.eq_ignore_ascii_case(column))
                })
                .ok_or_else(|| {
                    SqlHelperError::ParameterError(format!(
                        "column `{column}` does not exist in the destination table"
                    ))
                })?;
            if sources[destination_ordinal].replace(source_ordinal).is_some() {
                return Err(SqlHelperError::ParameterError(format!(
                    "destination column `{}` is mapped more than once",
                    destination[destination_ordinal].name
                )));
            }
        }
        Ok(Self { sources })
    }

    /// Lay one source row out in destination order.
    #[must_use]
    pub fn align(&self, row: &[RowValues]) -> Vec<RowValues> {
        self.sources
            .iter()
            .map(|source| {
                source
                    .and_then(|ordinal| row.get(ordinal))
                    .cloned()
                    .unwrap_or(RowValues::Null)
            })
            .collect()
    }

    /// Lay out every row of `source`.
    #[must_use]
    pub fn align_all(&self, source: &ResultSet) -> Vec<Vec<RowValues>> {
        source.results.iter().map(|row| self.align(&row.rows)).collect()
    }
}
