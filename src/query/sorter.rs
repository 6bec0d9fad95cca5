//! Document sorting
//!
//! Multi-key, stable and deterministic. Keys apply in declaration order and
//! a tie on one key falls through to the next; a tie on every key keeps the
//! input order.

use std::cmp::Ordering;

use crate::value::{Document, Value};

use super::ast::{SortDirection, SortKey};

/// Sorts documents by a list of sort keys
pub struct DocumentSorter;

impl DocumentSorter {
    /// Sorts documents in place according to the sort keys.
    pub fn sort(documents: &mut [Document], keys: &[SortKey]) {
        if keys.is_empty() {
            return;
        }
        // slice::sort_by is stable
        documents.sort_by(|a, b| Self::compare(a, b, keys));
    }

    /// Compares two documents key by key.
    ///
    /// Missing fields compare as Null.
    pub fn compare(a: &Document, b: &Document, keys: &[SortKey]) -> Ordering {
        let null = Value::Null;
        for key in keys {
            let a_val = a.get(&key.field).unwrap_or(&null);
            let b_val = b.get(&key.field).unwrap_or(&null);

            let ordering = match key.direction {
                SortDirection::Asc => a_val.cmp(b_val),
                SortDirection::Desc => b_val.cmp(a_val),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}
