//! Criteria parsing
//!
//! Operators are resolved through a static table when the criteria are
//! built, so an unknown operator or malformed operand is rejected before any
//! document is looked at.

use crate::value::{Document, Value};

use super::ast::{Criteria, FilterOp, Predicate, SortKey};
use super::errors::{QueryError, QueryResult};

type OperatorParser = fn(&str, Value) -> QueryResult<FilterOp>;

/// Operator dispatch table
const OPERATORS: &[(&str, OperatorParser)] = &[
    ("$eq", parse_eq),
    ("$ne", parse_ne),
    ("$gt", parse_gt),
    ("$gte", parse_gte),
    ("$lt", parse_lt),
    ("$lte", parse_lte),
    ("$in", parse_in),
    ("$nin", parse_nin),
    ("$exists", parse_exists),
];

fn parse_eq(_: &str, operand: Value) -> QueryResult<FilterOp> {
    Ok(FilterOp::Eq(operand))
}

fn parse_ne(_: &str, operand: Value) -> QueryResult<FilterOp> {
    Ok(FilterOp::Ne(operand))
}

fn parse_gt(_: &str, operand: Value) -> QueryResult<FilterOp> {
    Ok(FilterOp::Gt(operand))
}

fn parse_gte(_: &str, operand: Value) -> QueryResult<FilterOp> {
    Ok(FilterOp::Gte(operand))
}

fn parse_lt(_: &str, operand: Value) -> QueryResult<FilterOp> {
    Ok(FilterOp::Lt(operand))
}

fn parse_lte(_: &str, operand: Value) -> QueryResult<FilterOp> {
    Ok(FilterOp::Lte(operand))
}

fn parse_in(symbol: &str, operand: Value) -> QueryResult<FilterOp> {
    list_operand(symbol, operand).map(FilterOp::In)
}

fn parse_nin(symbol: &str, operand: Value) -> QueryResult<FilterOp> {
    list_operand(symbol, operand).map(FilterOp::Nin)
}

fn parse_exists(_: &str, operand: Value) -> QueryResult<FilterOp> {
    Ok(FilterOp::Exists(operand.is_truthy()))
}

fn list_operand(symbol: &str, operand: Value) -> QueryResult<Vec<Value>> {
    match operand {
        Value::Array(items) => Ok(items),
        other => Err(QueryError::malformed_operand(
            symbol,
            format!("expected array, got {}", other.type_name()),
        )),
    }
}

/// Looks up an operator symbol and builds the filter operation
pub fn parse_operator(symbol: &str, operand: Value) -> QueryResult<FilterOp> {
    let (_, parse) = OPERATORS
        .iter()
        .find(|(name, _)| *name == symbol)
        .ok_or_else(|| QueryError::UnknownOperator(symbol.to_string()))?;
    parse(symbol, operand)
}

/// Returns true if the symbol names a known query operator
pub fn is_known_operator(symbol: &str) -> bool {
    OPERATORS.iter().any(|(name, _)| *name == symbol)
}

impl Criteria {
    /// Parses a criteria mapping.
    ///
    /// Each entry is either `field: literal` (equality) or
    /// `field: {"$op": operand, ...}`. A condition document that mixes
    /// operator keys with plain keys is rejected.
    pub fn parse(spec: &Value) -> QueryResult<Self> {
        let doc = spec.as_document().ok_or_else(|| {
            QueryError::InvalidCriteria(format!(
                "criteria must be a document, got {}",
                spec.type_name()
            ))
        })?;
        Self::from_document(doc)
    }

    pub fn from_document(doc: &Document) -> QueryResult<Self> {
        let mut predicates = Vec::with_capacity(doc.len());

        for (field, condition) in doc.iter() {
            if field.is_empty() {
                return Err(QueryError::InvalidCriteria("empty field name".into()));
            }
            if field.starts_with('$') {
                return Err(QueryError::UnknownOperator(field.to_string()));
            }

            match operator_mapping(field, condition)? {
                Some(ops) => {
                    for (symbol, operand) in ops.iter() {
                        let op = parse_operator(symbol, operand.clone())?;
                        predicates.push(Predicate::new(field, op));
                    }
                }
                None => predicates.push(Predicate::eq(field, condition.clone())),
            }
        }

        Ok(Self::from_predicates(predicates))
    }
}

/// Returns the condition as an operator mapping, or None for a literal
fn operator_mapping<'a>(field: &str, condition: &'a Value) -> QueryResult<Option<&'a Document>> {
    let doc = match condition {
        Value::Document(doc) => doc,
        _ => return Ok(None),
    };

    let operator_keys = doc.keys().filter(|k| k.starts_with('$')).count();
    if operator_keys == 0 {
        return Ok(None);
    }
    if operator_keys != doc.len() {
        return Err(QueryError::InvalidCriteria(format!(
            "condition on '{}' mixes operators and plain fields",
            field
        )));
    }
    Ok(Some(doc))
}

/// Parses `{field: 1 | -1, ...}` into sort keys, keeping declaration order
pub fn parse_sort_keys(spec: &Value) -> QueryResult<Vec<SortKey>> {
    let doc = spec.as_document().ok_or_else(|| {
        QueryError::InvalidSort(format!("expected document, got {}", spec.type_name()))
    })?;
    if doc.is_empty() {
        return Err(QueryError::InvalidSort("no sort keys given".into()));
    }

    doc.iter()
        .map(|(field, direction)| match direction {
            Value::Int(1) => Ok(SortKey::asc(field)),
            Value::Int(-1) => Ok(SortKey::desc(field)),
            other => Err(QueryError::InvalidSort(format!(
                "direction for '{}' must be 1 or -1, got {:?}",
                field, other
            ))),
        })
        .collect()
}

impl TryFrom<&serde_json::Value> for Criteria {
    type Error = QueryError;

    fn try_from(json: &serde_json::Value) -> QueryResult<Self> {
        Criteria::parse(&Value::from(json.clone()))
    }
}
