//! CLI argument definitions using clap
//!
//! Commands:
//! - gridstore serve --config <path>
//! - gridstore ingest <owner> <file> --config <path>
//! - gridstore count <owner> [--filters JSON] --config <path>
//! - gridstore page <owner> [--page N] [--filters JSON] --config <path>
//! - gridstore export <owner> [--filters JSON] [--output PATH] --config <path>
//! - gridstore drop <owner> --config <path>
//! - gridstore list --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gridstore - dynamic-schema tabular ingestion and query service
#[derive(Parser, Debug)]
#[command(name = "gridstore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./gridstore.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Replace an owner's dataset with a CSV or TSV file
    Ingest {
        /// Owner identifier
        owner: String,

        /// File to ingest (.csv or .tsv)
        file: PathBuf,

        /// Path to configuration file
        #[arg(long, default_value = "./gridstore.json")]
        config: PathBuf,
    },

    /// Count rows, optionally filtered
    Count {
        /// Owner identifier
        owner: String,

        /// Filter map as JSON, e.g. '{"col1":"abc"}'
        #[arg(long)]
        filters: Option<String>,

        /// Path to configuration file
        #[arg(long, default_value = "./gridstore.json")]
        config: PathBuf,
    },

    /// Print one page of rows
    Page {
        /// Owner identifier
        owner: String,

        /// 1-based page number
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        page: i64,

        /// Filter map as JSON
        #[arg(long)]
        filters: Option<String>,

        /// Path to configuration file
        #[arg(long, default_value = "./gridstore.json")]
        config: PathBuf,
    },

    /// Export matching rows as delimited text
    Export {
        /// Owner identifier
        owner: String,

        /// Filter map as JSON
        #[arg(long)]
        filters: Option<String>,

        /// Output file (stdout if omitted)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Path to configuration file
        #[arg(long, default_value = "./gridstore.json")]
        config: PathBuf,
    },

    /// Delete an owner's dataset
    Drop {
        /// Owner identifier
        owner: String,

        /// Path to configuration file
        #[arg(long, default_value = "./gridstore.json")]
        config: PathBuf,
    },

    /// List stored datasets
    List {
        /// Path to configuration file
        #[arg(long, default_value = "./gridstore.json")]
        config: PathBuf,
    },
}

impl Command {
    /// Configuration path shared by every command
    pub fn config_path(&self) -> &PathBuf {
        match self {
            Command::Serve { config, .. }
            | Command::Ingest { config, .. }
            | Command::Count { config, .. }
            | Command::Page { config, .. }
            | Command::Export { config, .. }
            | Command::Drop { config, .. }
            | Command::List { config } => config,
        }
    }
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
    fn test_parse_page_command() {
        let cli = Cli::try_parse_from([
            "gridstore",
            "page",
            "alice",
            "--page",
            "3",
            "--filters",
            r#"{"col1":"x"}"#,
        ])
        .unwrap();
        match cli.command {
            Command::Page {
                owner,
                page,
                filters,
                config,
            } => {
                assert_eq!(owner, "alice");
                assert_eq!(page, 3);
                assert_eq!(filters.as_deref(), Some(r#"{"col1":"x"}"#));
                assert_eq!(config, PathBuf::from("./gridstore.json"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_negative_page_reaches_validation() {
        let cli = Cli::try_parse_from(["gridstore", "page", "alice", "--page", "-1"]).unwrap();
        assert!(matches!(cli.command, Command::Page { page: -1, .. }));
    }

    #[test]
    fn test_config_path() {
        let cli =
            Cli::try_parse_from(["gridstore", "list", "--config", "/etc/grid.json"]).unwrap();
        assert_eq!(cli.command.config_path(), &PathBuf::from("/etc/grid.json"));
    }
}
