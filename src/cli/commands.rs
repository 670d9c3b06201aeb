//! CLI command implementations
//!
//! Every command loads the configuration, installs logging and opens the
//! store under `data_dir`. One-shot commands print a JSON envelope on
//! stdout; `export` writes raw delimited text.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::info;

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::write_response;
use crate::api::{ApiError, DatasetService};
use crate::http_server::HttpServer;
use crate::observability::init_tracing;
use crate::planner::FilterMap;
use crate::storage::DatasetStore;

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let config = Config::load(cmd.config_path())?;
    init_tracing(&config.log_level);

    match cmd {
        Command::Serve { port, .. } => serve(config, port),
        Command::Ingest { owner, file, .. } => ingest(&config, &owner, &file),
        Command::Count { owner, filters, .. } => count(&config, &owner, filters.as_deref()),
        Command::Page {
            owner,
            page,
            filters,
            ..
        } => page_rows(&config, &owner, page, filters.as_deref()),
        Command::Export {
            owner,
            filters,
            output,
            ..
        } => export(&config, &owner, filters.as_deref(), output),
        Command::Drop { owner, .. } => drop_dataset(&config, &owner),
        Command::List { .. } => list(&config),
    }
}

fn open_service(config: &Config) -> CliResult<DatasetService> {
    let store = DatasetStore::open(config.data_path()).map_err(|e| {
        CliError::boot_failed(format!(
            "Failed to open store at {}: {}",
            config.data_dir, e
        ))
    })?;
    Ok(DatasetService::new(store))
}

fn parse_filters(raw: Option<&str>) -> CliResult<FilterMap> {
    let filter = FilterMap::from_json(raw.unwrap_or("")).map_err(ApiError::from)?;
    Ok(filter)
}

/// Start the HTTP server and block until it stops
pub fn serve(mut config: Config, port: Option<u16>) -> CliResult<()> {
    if let Some(port) = port {
        config.http.port = port;
    }

    let service = open_service(&config)?;
    let server = HttpServer::new(config.http.clone(), service);
    info!(data_dir = %config.data_dir, addr = %server.socket_addr(), "starting gridstore");

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to start runtime: {}", e)))?;
    runtime
        .block_on(server.start())
        .map_err(|e| CliError::boot_failed(e.to_string()))
}

/// Replace the owner's dataset with a local file
pub fn ingest(config: &Config, owner: &str, file: &Path) -> CliResult<()> {
    let service = open_service(config)?;
    let bytes = std::fs::read(file)
        .map_err(|e| CliError::io_error(format!("Failed to read {}: {}", file.display(), e)))?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let summary = service.ingest(owner, &file_name, &bytes)?;
    write_response(&summary)
}

/// Print the (filtered) row count
pub fn count(config: &Config, owner: &str, filters: Option<&str>) -> CliResult<()> {
    let service = open_service(config)?;
    let filter = parse_filters(filters)?;
    let response = service.filtered_count(owner, &filter)?;
    write_response(&response)
}

/// Print one (filtered) page
pub fn page_rows(config: &Config, owner: &str, page: i64, filters: Option<&str>) -> CliResult<()> {
    let service = open_service(config)?;
    let filter = parse_filters(filters)?;
    let response = service.filtered_page(owner, &filter, page)?;
    write_response(&response)
}

/// Export matching rows to a file or stdout
pub fn export(
    config: &Config,
    owner: &str,
    filters: Option<&str>,
    output: Option<PathBuf>,
) -> CliResult<()> {
    let service = open_service(config)?;
    let filter = parse_filters(filters)?;
    let stream = service.export_filtered(owner, &filter)?;

    let mut sink: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(File::create(path).map_err(|e| {
            CliError::io_error(format!("Failed to create {}: {}", path.display(), e))
        })?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    for chunk in stream {
        sink.write_all(&chunk?)?;
    }
    sink.flush()?;

    if let Some(path) = output {
        info!(dataset = owner, path = %path.display(), "export written");
    }
    Ok(())
}

/// Remove the owner's dataset
pub fn drop_dataset(config: &Config, owner: &str) -> CliResult<()> {
    let service = open_service(config)?;
    service.drop_dataset(owner)?;
    write_response(&json!({ "dropped": owner }))
}

/// List stored datasets
pub fn list(config: &Config) -> CliResult<()> {
    let service = open_service(config)?;
    let names = service.store().list().map_err(ApiError::from)?;
    write_response(&json!({ "datasets": names }))
}
