//! CLI command implementations
//!
//! Each command loads the config, installs logging, reads one request from
//! stdin and writes one response to stdout. The `execute_*` functions hold
//! the command logic without touching stdin or stdout.

use std::path::Path;

use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::config::Config;
use crate::observability::{init_logging, Event, MetricsRegistry};
use crate::pipeline::{Aggregation, Pipeline};
use crate::query::{parse_sort_keys, Criteria};
use crate::resolver::{FindOptions, MemoryCatalog};
use crate::value::{Document, Value};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command. Failures are
/// reported on stdout as an error response before being returned.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    let result = run_command(cli.command);
    if let Err(e) = &result {
        // stdout may itself be the failure; the caller still sees the error
        let _ = write_error(e.code(), e.message());
    }
    result
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Aggregate {
            config,
            collection,
            stats,
        } => aggregate(&config, &collection, stats),
        Command::Find { config, collection } => find(&config, &collection),
        Command::Validate => validate(),
    }
}

/// Loads the config and installs the tracing subscriber
fn boot(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    init_logging(&config.log_filter)?;
    tracing::info!(
        event = Event::ConfigLoaded.as_str(),
        path = %config_path.display()
    );
    Ok(config)
}

fn open_catalog(config: &Config, config_path: &Path) -> CliResult<MemoryCatalog> {
    Ok(MemoryCatalog::load_dir(&config.data_path(config_path))?)
}

fn documents_to_json(documents: &[Document]) -> JsonValue {
    JsonValue::Array(documents.iter().map(JsonValue::from).collect())
}

// ============================================================================
// aggregate
// ============================================================================

/// Run a pipeline read from stdin over a collection
pub fn aggregate(config_path: &Path, collection: &str, stats: bool) -> CliResult<()> {
    let config = boot(config_path)?;
    let catalog = open_catalog(&config, config_path)?;
    let request = read_request()?;

    let data = execute_aggregate(&config, &catalog, collection, &request, stats)?;
    write_response(data)
}

/// Runs `pipeline` over `collection`.
///
/// With `stats` the response is `{documents, stages, metrics}`, otherwise
/// just the document array.
pub fn execute_aggregate(
    config: &Config,
    catalog: &MemoryCatalog,
    collection: &str,
    pipeline: &JsonValue,
    stats: bool,
) -> CliResult<JsonValue> {
    let metrics = MetricsRegistry::new();
    let result = Aggregation::new(catalog, collection)
        .with_config(config.engine.clone())
        .with_metrics(&metrics)
        .run_json(pipeline)?;

    tracing::info!(
        event = Event::AggregateExecuted.as_str(),
        collection,
        input = result.input_count,
        output = result.len()
    );

    let documents = documents_to_json(&result.documents);
    if !stats {
        return Ok(documents);
    }
    Ok(json!({
        "documents": documents,
        "stages": serde_json::to_value(&result.stages)?,
        "metrics": serde_json::to_value(metrics.snapshot())?,
    }))
}

// ============================================================================
// find
// ============================================================================

/// Request body of `find`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FindRequest {
    #[serde(default)]
    filter: Option<Value>,
    #[serde(default)]
    sort: Option<Value>,
    #[serde(default)]
    skip: usize,
    #[serde(default)]
    limit: Option<usize>,
}

/// Filter, sort and page a collection with a request read from stdin
pub fn find(config_path: &Path, collection: &str) -> CliResult<()> {
    let config = boot(config_path)?;
    let catalog = open_catalog(&config, config_path)?;
    let request = read_request()?;

    let data = execute_find(&catalog, collection, &request)?;
    write_response(data)
}

/// Runs a `{filter, sort, skip, limit}` request against `collection`
pub fn execute_find(
    catalog: &MemoryCatalog,
    collection: &str,
    request: &JsonValue,
) -> CliResult<JsonValue> {
    let request: FindRequest = serde_json::from_value(request.clone())
        .map_err(|e| CliError::invalid_request(format!("Invalid find request: {}", e)))?;

    let criteria = match &request.filter {
        Some(filter) => Criteria::parse(filter)?,
        None => Criteria::all(),
    };
    let mut options = FindOptions::new().with_skip(request.skip);
    if let Some(sort) = &request.sort {
        options = options.with_sort(parse_sort_keys(sort)?);
    }
    if let Some(limit) = request.limit {
        options = options.with_limit(limit);
    }

    let documents = catalog.collection(collection)?.find(&criteria, &options);
    tracing::info!(
        event = Event::FindExecuted.as_str(),
        collection,
        returned = documents.len()
    );

    Ok(documents_to_json(&documents))
}

// ============================================================================
// validate
// ============================================================================

/// Parse a pipeline read from stdin without executing it
pub fn validate() -> CliResult<()> {
    let request = read_request()?;
    let data = execute_validate(&request)?;
    write_response(data)
}

/// Parses a pipeline and reports its stage names
pub fn execute_validate(pipeline: &JsonValue) -> CliResult<JsonValue> {
    let pipeline = Pipeline::from_json(pipeline)?;
    Ok(json!({
        "valid": true,
        "stages": pipeline.stage_names(),
    }))
}
