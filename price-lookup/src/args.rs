use std::path::PathBuf;

use adventure_data::config::Environment;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Look up AdventureWorks product prices and categories")]
pub(crate) struct Args {
    /// Product to look up; omit it (or pass 0) to list every product
    pub(crate) product_id: Option<i32>,
    /// appsettings-style JSON file holding the connection strings
    #[arg(long, default_value = "appsettings.json")]
    pub(crate) settings: PathBuf,
    #[arg(long, value_enum, default_value = "development")]
    pub(crate) environment: Environment,
    #[arg(long)]
    pub(crate) verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_every_product_in_development() {
        let args = Args::parse_from(["price-lookup"]);
        assert_eq!(args.product_id, None);
        assert_eq!(args.environment, Environment::Development);
        assert_eq!(args.settings, PathBuf::from("appsettings.json"));
    }

    #[test]
    fn parses_product_and_environment() {
        let args = Args::parse_from(["price-lookup", "680", "--environment", "production"]);
        assert_eq!(args.product_id, Some(680));
        assert_eq!(args.environment, Environment::Production);
    }
}
