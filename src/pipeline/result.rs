//! Result types for pipeline execution

use serde::Serialize;

use crate::value::Document;

/// Document counts around one executed stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageStats {
    /// Stage name without the `$` prefix
    pub stage: &'static str,
    pub input_count: usize,
    pub output_count: usize,
}

/// Result of pipeline execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Documents in output order
    pub documents: Vec<Document>,
    /// Number of documents fed into the first stage
    pub input_count: usize,
    /// One entry per stage, in execution order
    pub stages: Vec<StageStats>,
}

impl ExecutionResult {
    /// Returns true if the pipeline produced no documents
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Returns the number of output documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns an iterator over the documents
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }
}
