use std::time::Duration;

use async_trait::async_trait;
use tiberius::{Client, Config as TiberiusConfig, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::TokioAsyncWriteCompatExt;
use tracing::debug;

use super::MssqlClient;
use crate::config::ConnectionDescriptor;
use crate::error::SqlHelperError;
use crate::session::Connect;

/// Limit for establishing a connection, separate from the command timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Open a new SQL Server connection from a descriptor.
///
/// Named instances are resolved through SQL Browser, and one routing redirect
/// (as issued by Azure SQL gateways) is followed.
///
/// # Errors
/// Returns `SqlHelperError::ConfigError` for an unparsable connection string and
/// `SqlHelperError::ConnectionError` if the server cannot be reached, refuses the
/// login, or does not answer within [`CONNECT_TIMEOUT`].
pub async fn create_mssql_client(
    descriptor: &ConnectionDescriptor,
) -> Result<MssqlClient, SqlHelperError> {
    let config = descriptor.tiberius_config()?;
    debug!(connection = %descriptor.name, "opening SQL Server connection");

    tokio::time::timeout(CONNECT_TIMEOUT, connect(config))
        .await
        .map_err(|_| {
            SqlHelperError::ConnectionError(format!(
                "timed out after {}s connecting to `{}`",
                CONNECT_TIMEOUT.as_secs(),
                descriptor.name
            ))
        })?
}

async fn connect(config: TiberiusConfig) -> Result<MssqlClient, SqlHelperError> {
    let tcp = TcpStream::connect_named(&config)
        .await
        .map_err(|e| SqlHelperError::ConnectionError(format!("TCP connection error: {e}")))?;
    tcp.set_nodelay(true)
        .map_err(|e| SqlHelperError::ConnectionError(format!("TCP configuration error: {e}")))?;

    match Client::connect(config.clone(), tcp.compat_write()).await {
        Ok(client) => Ok(client),
        Err(tiberius::error::Error::Routing { host, port }) => {
            debug!(%host, port, "following SQL Server routing redirect");
            let mut config = config;
            config.host(&host);
            config.port(port);
            let tcp = TcpStream::connect(config.get_addr()).await.map_err(|e| {
                SqlHelperError::ConnectionError(format!("TCP connection error after redirect: {e}"))
            })?;
            tcp.set_nodelay(true).map_err(|e| {
                SqlHelperError::ConnectionError(format!("TCP configuration error: {e}"))
            })?;
            Client::connect(config, tcp.compat_write()).await.map_err(|e| {
                SqlHelperError::ConnectionError(format!("SQL Server connection error: {e}"))
            })
        }
        Err(e) => Err(SqlHelperError::ConnectionError(format!(
            "SQL Server connection error: {e}"
        ))),
    }
}

#[async_trait]
impl Connect for &ConnectionDescriptor {
    type Session = MssqlClient;

    async fn connect(self) -> Result<MssqlClient, SqlHelperError> {
        create_mssql_client(self).await
    }
}

#[async_trait]
impl Connect for ConnectionDescriptor {
    type Session = MssqlClient;

    async fn connect(self) -> Result<MssqlClient, SqlHelperError> {
        create_mssql_client(&self).await
    }
}

/// An already-open client is used as is and closed when the helper is done with it.
#[async_trait]
impl Connect for MssqlClient {
    type Session = MssqlClient;

    async fn connect(self) -> Result<MssqlClient, SqlHelperError> {
        Ok(self)
    }
}
