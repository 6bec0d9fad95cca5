//! CLI module for docagg
//!
//! Provides command-line interface for:
//! - aggregate: Run a pipeline over one collection
//! - find: Filtered, sorted, paged read of one collection
//! - validate: Parse a pipeline without running it

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    aggregate, execute_aggregate, execute_find, execute_validate, find, run, run_command,
    validate,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_request, read_request, write_error, write_response};
