//! Convenient imports for common functionality.

pub use crate::bulk::BulkColumn;
pub use crate::command::{IntoRowValue, NamedParams, ParamBag, SqlCommand, SqlParameter};
pub use crate::config::{ConnectionDescriptor, Environment, SqlConfiguration};
pub use crate::cursor::{Cursor, ResultSetCursor};
pub use crate::error::SqlHelperError;
pub use crate::helper::{
    bulk_insert, execute_non_query, execute_non_query_with_transaction, execute_reader,
    execute_scalar,
};
pub use crate::mapping::{FromRowValue, SqlEntity, SqlReader, read};
pub use crate::models::ProductCategoryPrice;
pub use crate::mssql::{MssqlClient, create_mssql_client};
pub use crate::repository::{ConnectionProvider, ProductRepository, ProductStore};
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::session::{Connect, SqlSession};
pub use crate::sql_entity;
pub use crate::types::{CommandKind, RowValues};
