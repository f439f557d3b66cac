use async_trait::async_trait;
use tracing::debug;

use super::ConnectionProvider;
use crate::command::{NamedParams, SqlCommand};
use crate::error::SqlHelperError;
use crate::helper::execute_reader;
use crate::mapping::SqlReader;
use crate::models::ProductCategoryPrice;

/// Stored procedures the product repository calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredProcedure {
    GetProductPriceCategory,
}

impl StoredProcedure {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            StoredProcedure::GetProductPriceCategory => "GetProductPriceCategory",
        }
    }

    /// `<schema>.<name>`, as passed to the server.
    #[must_use]
    pub fn qualified(self, schema: &str) -> String {
        format!("{schema}.{}", self.name())
    }
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Products with their price and category. `None` (or `Some(0)`) asks for all of them.
    async fn get_product_price_category(
        &self,
        product_id: Option<i32>,
    ) -> Result<Vec<ProductCategoryPrice>, SqlHelperError>;
}

pub struct ProductRepository<P> {
    provider: P,
}

impl<P: ConnectionProvider> ProductRepository<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P> ProductStore for ProductRepository<P>
where
    P: ConnectionProvider,
    P::Conn: 'static,
{
    async fn get_product_price_category(
        &self,
        product_id: Option<i32>,
    ) -> Result<Vec<ProductCategoryPrice>, SqlHelperError> {
        let product_id = product_id.filter(|id| *id != 0);
        debug!(?product_id, "get_product_price_category");

        let command = SqlCommand::stored_procedure(
            StoredProcedure::GetProductPriceCategory.qualified("Production"),
        )
        .bind(&NamedParams::new().with("ProductID", product_id));

        let cursor = execute_reader(self.provider.connection(), &command).await?;
        SqlReader::<ProductCategoryPrice, _>::new(cursor)
            .collect_all()
            .await
    }
}
