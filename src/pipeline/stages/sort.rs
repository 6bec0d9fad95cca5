//! Sort stage

use crate::query::{DocumentSorter, SortKey};
use crate::value::Document;

pub fn sort(mut documents: Vec<Document>, keys: &[SortKey]) -> Vec<Document> {
    DocumentSorter::sort(&mut documents, keys);
    documents
}
