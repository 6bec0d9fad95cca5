//! Pipeline error types
//!
//! Error codes:
//! - DOCAGG_PIPELINE_INVALID (REJECT)
//! - DOCAGG_PIPELINE_UNKNOWN_STAGE (REJECT)
//! - DOCAGG_PIPELINE_INVALID_STAGE (REJECT)
//! - DOCAGG_PIPELINE_UNKNOWN_ACCUMULATOR (REJECT)
//! - DOCAGG_PIPELINE_EXECUTION_LIMIT (ERROR)
//! - criteria and resolver errors keep their own codes

use thiserror::Error;

use crate::errors::Severity;
use crate::query::QueryError;
use crate::resolver::ResolverError;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Pipeline errors.
///
/// Everything except resolver failures and the execution limit is a
/// configuration error raised while the pipeline is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),

    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    #[error("Invalid {stage} stage: {reason}")]
    InvalidStage { stage: String, reason: String },

    #[error("Unknown accumulator operator: {0}")]
    UnknownAccumulator(String),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Lookup failed: {0}")]
    Resolver(#[from] ResolverError),

    #[error("Stage {stage} produced {produced} documents, limit is {limit}")]
    ExecutionLimit {
        stage: String,
        produced: usize,
        limit: usize,
    },
}

impl PipelineError {
    pub fn invalid_stage(stage: &str, reason: impl Into<String>) -> Self {
        PipelineError::InvalidStage {
            stage: stage.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::InvalidPipeline(_) => "DOCAGG_PIPELINE_INVALID",
            PipelineError::UnknownStage(_) => "DOCAGG_PIPELINE_UNKNOWN_STAGE",
            PipelineError::InvalidStage { .. } => "DOCAGG_PIPELINE_INVALID_STAGE",
            PipelineError::UnknownAccumulator(_) => "DOCAGG_PIPELINE_UNKNOWN_ACCUMULATOR",
            PipelineError::Query(e) => e.code(),
            PipelineError::Resolver(e) => e.code(),
            PipelineError::ExecutionLimit { .. } => "DOCAGG_PIPELINE_EXECUTION_LIMIT",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            PipelineError::Query(e) => e.severity(),
            PipelineError::Resolver(e) => e.severity(),
            PipelineError::ExecutionLimit { .. } => Severity::Error,
            _ => Severity::Reject,
        }
    }

    /// Returns true if the error was raised before any document was processed
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            PipelineError::Resolver(_) | PipelineError::ExecutionLimit { .. }
        )
    }
}
