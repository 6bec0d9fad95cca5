//! Query subsystem: criteria and the predicate evaluator
//!
//! Criteria are parsed once into a flat list of predicates and then
//! evaluated against documents with AND semantics. The same criteria shape
//! is used by the match stage, by relation lookups and by the in-memory
//! collection `find`.

mod ast;
mod errors;
mod filters;
mod parser;
mod sorter;

pub use ast::{Criteria, FilterOp, Predicate, SortDirection, SortKey};
pub use errors::{QueryError, QueryResult};
pub use filters::PredicateFilter;
pub use parser::{is_known_operator, parse_operator, parse_sort_keys};
pub use sorter::DocumentSorter;
