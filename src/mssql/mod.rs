// MSSQL module - the SQL Server side of the execution helpers
//
// - client: connecting from a connection descriptor
// - params: binding `RowValues` as driver parameters
// - query: converting driver cells into `RowValues`
// - session: `SqlSession` for a connected client
// - cursor: reader cursor that owns its connection
// - bulk: typed values for bulk loads

pub mod bulk;
pub mod client;
pub mod cursor;
pub mod params;
pub mod query;
pub mod session;

use tiberius::Client;
use tokio::net::TcpStream;
use tokio_util::compat::Compat;

/// Type alias for an open SQL Server connection
pub type MssqlClient = Client<Compat<TcpStream>>;

// Re-export the public API
pub use client::create_mssql_client;
pub use cursor::MssqlCursor;
