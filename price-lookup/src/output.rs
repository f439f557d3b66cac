use std::process::ExitCode;

use adventure_data::config::Environment;
use adventure_data::models::ProductCategoryPrice;
use adventure_data::SqlHelperError;

pub(crate) const NOT_FOUND: &str = "No products found";
pub(crate) const INTERNAL_ERROR: &str =
    "Could not complete the product search due to an internal server error, try again later";

/// What the lookup prints, and with which exit status.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Found(String),
    NotFound,
    Failed(String),
}

impl Outcome {
    /// Error detail reaches the user only in development.
    pub(crate) fn from_result(
        result: Result<Vec<ProductCategoryPrice>, SqlHelperError>,
        environment: Environment,
    ) -> Self {
        let failed = |e: &dyn std::fmt::Display| {
            if environment.is_development() {
                Outcome::Failed(e.to_string())
            } else {
                Outcome::Failed(INTERNAL_ERROR.to_string())
            }
        };
        match result {
            Ok(products) if products.is_empty() => Outcome::NotFound,
            Ok(products) => match serde_json::to_string_pretty(&products) {
                Ok(json) => Outcome::Found(json),
                Err(e) => failed(&e),
            },
            Err(e) => failed(&e),
        }
    }

    pub(crate) fn exit_code(&self) -> ExitCode {
        match self {
            Outcome::Found(_) => ExitCode::SUCCESS,
            Outcome::NotFound => ExitCode::from(2),
            Outcome::Failed(_) => ExitCode::FAILURE,
        }
    }
}
