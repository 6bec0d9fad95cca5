//! Resolver error types
//!
//! Error codes:
//! - DOCAGG_RESOLVER_UNKNOWN_COLLECTION (ERROR)
//! - DOCAGG_RESOLVER_INVALID_COLLECTION_NAME (REJECT)
//! - DOCAGG_RESOLVER_LOAD_FAILED (ERROR)

use thiserror::Error;

use crate::errors::Severity;

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, ResolverError>;

/// Errors raised by relation resolvers and the in-memory catalog
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Invalid collection name: '{0}'")]
    InvalidCollectionName(String),

    #[error("Failed to load collection '{collection}': {reason}")]
    LoadFailed { collection: String, reason: String },
}

impl ResolverError {
    pub fn load_failed(collection: impl Into<String>, reason: impl Into<String>) -> Self {
        ResolverError::LoadFailed {
            collection: collection.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ResolverError::UnknownCollection(_) => "DOCAGG_RESOLVER_UNKNOWN_COLLECTION",
            ResolverError::InvalidCollectionName(_) => "DOCAGG_RESOLVER_INVALID_COLLECTION_NAME",
            ResolverError::LoadFailed { .. } => "DOCAGG_RESOLVER_LOAD_FAILED",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ResolverError::InvalidCollectionName(_) => Severity::Reject,
            _ => Severity::Error,
        }
    }
}
