//! Observability subsystem for docagg
//!
//! - Structured logging through `tracing`, one `event` field per line
//! - Counters in a [`MetricsRegistry`]
//!
//! The library only emits events. Installing a subscriber is left to the
//! binary via [`init_logging`].
//!
//! # Usage
//!
//! ```ignore
//! use docagg::observability::{init_logging, Event};
//!
//! init_logging("info")?;
//! tracing::info!(event = Event::PipelineBegin.as_str(), stages = 3);
//! ```

mod events;
mod metrics;

pub use events::Event;
pub use metrics::{MetricsRegistry, MetricsSnapshot};

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured log filter
pub const LOG_ENV_VAR: &str = "DOCAGG_LOG";

/// Observability error
///
/// Observability failure never aborts query execution; only the binary's
/// startup can surface it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObservabilityError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

impl ObservabilityError {
    pub fn code(&self) -> &'static str {
        match self {
            ObservabilityError::InvalidFilter { .. } => "DOCAGG_LOG_INVALID_FILTER",
            ObservabilityError::AlreadyInitialized(_) => "DOCAGG_LOG_ALREADY_INITIALIZED",
        }
    }
}

/// Result type for observability operations
pub type ObservabilityResult<T> = Result<T, ObservabilityError>;

/// Builds the env filter: `DOCAGG_LOG` wins over the configured default
pub fn build_filter(default_filter: &str) -> ObservabilityResult<EnvFilter> {
    let filter = std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| default_filter.to_string());
    EnvFilter::try_new(&filter).map_err(|e| ObservabilityError::InvalidFilter {
        filter,
        reason: e.to_string(),
    })
}

/// Installs the global fmt subscriber, writing to stderr so stdout stays
/// reserved for JSON responses.
pub fn init_logging(default_filter: &str) -> ObservabilityResult<()> {
    let filter = build_filter(default_filter)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| ObservabilityError::AlreadyInitialized(e.to_string()))
}
