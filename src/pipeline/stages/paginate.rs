//! Skip and limit stages

use crate::value::Document;

/// Drops the first `count` documents
pub fn skip(documents: Vec<Document>, count: usize) -> Vec<Document> {
    if count == 0 {
        return documents;
    }
    documents.into_iter().skip(count).collect()
}

/// Keeps at most `count` documents
pub fn limit(mut documents: Vec<Document>, count: usize) -> Vec<Document> {
    documents.truncate(count);
    documents
}
