//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::product::ProductArgs;
use super::commands::serve::ServeArgs;

#[derive(Parser, Debug)]
#[command(name = "thunderguard")]
#[command(about = "Thunderguard - read-through product cache with stampede protection", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .thunderguard/config.yaml plus local.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the products HTTP API
    Serve(ServeArgs),

    /// Create or read products
    Product(ProductArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::product::ProductCommands;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["thunderguard", "serve", "--port", "9090"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, Some(9090));
                assert!(args.host.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_product_get_with_global_flags() {
        let id = uuid::Uuid::new_v4();
        let id_arg = id.to_string();
        let cli = Cli::try_parse_from([
            "thunderguard",
            "product",
            "get",
            id_arg.as_str(),
            "--json",
            "--config",
            "custom.yaml",
        ])
        .unwrap();

        assert!(cli.json);
        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
        match cli.command {
            Commands::Product(args) => {
                assert!(matches!(args.command, ProductCommands::Get { id: parsed } if parsed == id));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_product_get_rejects_malformed_id() {
        assert!(Cli::try_parse_from(["thunderguard", "product", "get", "not-a-uuid"]).is_err());
    }
}
