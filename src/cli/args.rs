//! CLI argument definitions using clap
//!
//! Commands:
//! - docagg aggregate --config <path> --collection <name> [--stats]
//! - docagg find --config <path> --collection <name>
//! - docagg validate

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docagg - aggregation pipelines over JSON document collections
#[derive(Parser, Debug)]
#[command(name = "docagg")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a pipeline read from stdin over a collection
    Aggregate {
        /// Path to configuration file
        #[arg(long, default_value = "./docagg.json")]
        config: PathBuf,

        /// Source collection
        #[arg(long)]
        collection: String,

        /// Include per-stage counts and metrics in the response
        #[arg(long)]
        stats: bool,
    },

    /// Filter, sort and page a collection with a request read from stdin
    Find {
        /// Path to configuration file
        #[arg(long, default_value = "./docagg.json")]
        config: PathBuf,

        /// Collection to read
        #[arg(long)]
        collection: String,
    },

    /// Parse a pipeline read from stdin without executing it
    Validate,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aggregate() {
        let cli = Cli::try_parse_from([
            "docagg",
            "aggregate",
            "--config",
            "conf.json",
            "--collection",
            "orders",
            "--stats",
        ])
        .unwrap();

        match cli.command {
            Command::Aggregate {
                config,
                collection,
                stats,
            } => {
                assert_eq!(config, PathBuf::from("conf.json"));
                assert_eq!(collection, "orders");
                assert!(stats);
            }
            other => panic!("expected aggregate, got {:?}", other),
        }
    }

    #[test]
    fn test_find_default_config() {
        let cli = Cli::try_parse_from(["docagg", "find", "--collection", "users"]).unwrap();
        match cli.command {
            Command::Find { config, .. } => assert_eq!(config, PathBuf::from("./docagg.json")),
            other => panic!("expected find, got {:?}", other),
        }
    }

    #[test]
    fn test_collection_required() {
        assert!(Cli::try_parse_from(["docagg", "aggregate"]).is_err());
    }
}
