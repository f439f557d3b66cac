//! Async SQL Server execution helpers, a name-based row mapper and the
//! AdventureWorks product repository built on them.
//!
//! ```rust,no_run
//! use adventure_data::prelude::*;
//!
//! # async fn run() -> Result<(), SqlHelperError> {
//! let config = SqlConfiguration::from_settings_file("appsettings.json", Environment::Development)?;
//! let command = SqlCommand::stored_procedure("Production.GetProductPriceCategory")
//!     .bind(&NamedParams::new().with("ProductID", Some(680)));
//! let cursor = execute_reader(config.default_connection(), &command).await?;
//! let products: Vec<ProductCategoryPrice> = read(cursor).collect_all().await?;
//! # let _ = products;
//! # Ok(())
//! # }
//! ```

pub mod bulk;
pub mod command;
pub mod config;
pub mod cursor;
pub mod error;
pub mod helper;
pub mod mapping;
pub mod models;
pub mod mssql;
pub mod prelude;
pub mod repository;
pub mod results;
pub mod session;
pub mod transaction;
pub mod translation;
pub mod types;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use error::SqlHelperError;
