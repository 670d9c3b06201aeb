//! CLI module for gridstore
//!
//! Provides command-line interface for:
//! - serve: Run the HTTP service
//! - ingest, count, page, export: One-shot dataset operations
//! - drop, list: Dataset housekeeping

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{count, drop_dataset, export, ingest, list, page_rows, run, run_command, serve};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_response;
