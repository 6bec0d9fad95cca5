//! Predicate filtering
//!
//! Filters documents strictly according to predicates. Missing fields read
//! as Null and then compare normally; only `$exists` looks at key presence.

use std::cmp::Ordering;

use crate::value::{Document, Value};

use super::ast::{Criteria, FilterOp, Predicate};

/// Evaluates predicates against documents
pub struct PredicateFilter;

impl PredicateFilter {
    /// Checks if a document matches all predicates (AND semantics).
    ///
    /// Evaluation stops at the first failing predicate.
    pub fn matches(document: &Document, criteria: &Criteria) -> bool {
        criteria
            .predicates()
            .iter()
            .all(|pred| Self::matches_predicate(document, pred))
    }

    /// Checks if a document matches a single predicate
    pub fn matches_predicate(document: &Document, predicate: &Predicate) -> bool {
        let present = document.get(&predicate.field);
        let null = Value::Null;
        let field_value = present.unwrap_or(&null);

        match &predicate.op {
            FilterOp::Eq(expected) => field_value == expected,
            FilterOp::Ne(expected) => field_value != expected,
            FilterOp::Gt(bound) => Self::range_match(field_value, bound, |o| o == Ordering::Greater),
            FilterOp::Gte(bound) => Self::range_match(field_value, bound, |o| o != Ordering::Less),
            FilterOp::Lt(bound) => Self::range_match(field_value, bound, |o| o == Ordering::Less),
            FilterOp::Lte(bound) => Self::range_match(field_value, bound, |o| o != Ordering::Greater),
            FilterOp::In(values) => values.contains(field_value),
            FilterOp::Nin(values) => !values.contains(field_value),
            FilterOp::Exists(flag) => present.is_some() == *flag,
        }
    }

    /// Range comparison under the tiered total order
    fn range_match(actual: &Value, bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
        accept(actual.cmp(bound))
    }
}
