//! Query error types
//!
//! Error codes:
//! - DOCAGG_QUERY_UNKNOWN_OPERATOR (REJECT)
//! - DOCAGG_QUERY_MALFORMED_OPERAND (REJECT)
//! - DOCAGG_QUERY_INVALID (REJECT)
//! - DOCAGG_QUERY_INVALID_SORT (REJECT)

use thiserror::Error;

use crate::errors::Severity;

/// Result type for criteria parsing
pub type QueryResult<T> = Result<T, QueryError>;

/// Criteria errors. All of them are raised while parsing, never while matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Unknown query operator: {0}")]
    UnknownOperator(String),

    #[error("Malformed operand for {operator}: {reason}")]
    MalformedOperand { operator: String, reason: String },

    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),

    #[error("Invalid sort specification: {0}")]
    InvalidSort(String),
}

impl QueryError {
    pub fn malformed_operand(operator: &str, reason: impl Into<String>) -> Self {
        QueryError::MalformedOperand {
            operator: operator.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::UnknownOperator(_) => "DOCAGG_QUERY_UNKNOWN_OPERATOR",
            QueryError::MalformedOperand { .. } => "DOCAGG_QUERY_MALFORMED_OPERAND",
            QueryError::InvalidCriteria(_) => "DOCAGG_QUERY_INVALID",
            QueryError::InvalidSort(_) => "DOCAGG_QUERY_INVALID_SORT",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}
