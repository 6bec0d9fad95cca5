//! CLI-specific error types
//!
//! Every subsystem error reaching the CLI is wrapped into a [`CliError`]
//! that keeps the subsystem's code, so the JSON error response carries the
//! same `DOCAGG_*` code the library reported.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::errors::Severity;
use crate::observability::ObservabilityError;
use crate::pipeline::PipelineError;
use crate::query::QueryError;
use crate::resolver::ResolverError;

/// Codes for errors that originate in the CLI itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// I/O error (stdin/stdout)
    IoError,
    /// Request on stdin is not valid JSON or has the wrong shape
    InvalidRequest,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::IoError => "DOCAGG_CLI_IO_ERROR",
            Self::InvalidRequest => "DOCAGG_CLI_INVALID_REQUEST",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: &'static str,
    severity: Severity,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        let severity = match code {
            CliErrorCode::IoError => Severity::Error,
            CliErrorCode::InvalidRequest => Severity::Reject,
        };
        Self {
            code: code.code(),
            severity,
            message: message.into(),
        }
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Malformed request
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidRequest, msg)
    }

    fn wrap(code: &'static str, severity: Severity, error: impl fmt::Display) -> Self {
        Self {
            code,
            severity,
            message: error.to_string(),
        }
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Self::io_error(e.to_string())
        } else {
            Self::invalid_request(format!("JSON error: {}", e))
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::wrap(e.code(), e.severity(), e)
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        Self::wrap(e.code(), e.severity(), e)
    }
}

impl From<QueryError> for CliError {
    fn from(e: QueryError) -> Self {
        Self::wrap(e.code(), e.severity(), e)
    }
}

impl From<ResolverError> for CliError {
    fn from(e: ResolverError) -> Self {
        Self::wrap(e.code(), e.severity(), e)
    }
}

impl From<ObservabilityError> for CliError {
    fn from(e: ObservabilityError) -> Self {
        Self::wrap(e.code(), Severity::Error, e)
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
