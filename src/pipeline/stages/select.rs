//! Match stage

use crate::query::{Criteria, PredicateFilter};
use crate::value::Document;

/// Keeps the documents matching `criteria`, in input order
pub fn select(documents: Vec<Document>, criteria: &Criteria) -> Vec<Document> {
    if criteria.is_empty() {
        return documents;
    }
    documents
        .into_iter()
        .filter(|doc| PredicateFilter::matches(doc, criteria))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use serde_json::json;

    fn docs(value: serde_json::Value) -> Vec<Document> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_select_keeps_order() {
        let input = docs(json!([
            {"n": 3, "keep": true},
            {"n": 1, "keep": false},
            {"n": 2, "keep": true}
        ]));
        let criteria = Criteria::try_from(&json!({"keep": true})).unwrap();

        let output = select(input, &criteria);
        let ns: Vec<_> = output.iter().map(|d| d.get_or_null("n")).collect();
        assert_eq!(ns, vec![Value::Int(3), Value::Int(2)]);
    }

    #[test]
    fn test_empty_criteria_keeps_everything() {
        let input = docs(json!([{"a": 1}, {}]));
        assert_eq!(select(input, &Criteria::all()).len(), 2);
    }
}
