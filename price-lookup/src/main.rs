mod args;
mod output;

use std::process::ExitCode;
use std::sync::Arc;

use adventure_data::config::SqlConfiguration;
use adventure_data::models::ProductCategoryPrice;
use adventure_data::repository::{ProductRepository, ProductStore};
use adventure_data::SqlHelperError;
use clap::Parser;
use tracing::{Level, error};

use crate::args::Args;
use crate::output::{NOT_FOUND, Outcome};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let result = lookup(&args).await;
    if let Err(e) = &result {
        error!(kind = e.kind(), error = %e, "GetProductPriceCategory failed");
    }

    let outcome = Outcome::from_result(result, args.environment);
    match &outcome {
        Outcome::Found(json) => println!("{json}"),
        Outcome::NotFound => eprintln!("{NOT_FOUND}"),
        Outcome::Failed(message) => eprintln!("{message}"),
    }
    outcome.exit_code()
}

async fn lookup(args: &Args) -> Result<Vec<ProductCategoryPrice>, SqlHelperError> {
    let config = SqlConfiguration::from_settings_file(&args.settings, args.environment)?;
    let repository = ProductRepository::new(Arc::new(config));
    repository.get_product_price_category(args.product_id).await
}
