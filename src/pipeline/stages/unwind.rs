//! Unwind stage

use crate::value::{Document, Value};

/// Emits one document per element of the array at `field`.
///
/// Documents where the field is missing or not an array are dropped. An
/// empty array produces nothing.
pub fn unwind(documents: Vec<Document>, field: &str) -> Vec<Document> {
    let mut output = Vec::with_capacity(documents.len());

    for mut doc in documents {
        let items = match doc.get_mut(field) {
            Some(Value::Array(items)) => std::mem::take(items),
            _ => continue,
        };
        for item in items {
            let mut copy = doc.clone();
            copy.insert(field, item);
            output.push(copy);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs(value: serde_json::Value) -> Vec<Document> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_unwind_fans_out() {
        let output = unwind(docs(json!([{"a": 1, "t": ["x", "y"]}])), "t");

        assert_eq!(output, docs(json!([{"a": 1, "t": "x"}, {"a": 1, "t": "y"}])));
    }

    #[test]
    fn test_unwind_keeps_field_position() {
        let output = unwind(docs(json!([{"t": [1], "a": 1}])), "t");
        let keys: Vec<&str> = output[0].keys().collect();
        assert_eq!(keys, vec!["t", "a"]);
    }

    #[test]
    fn test_unwind_drops_missing_scalar_and_empty() {
        let output = unwind(
            docs(json!([
                {"id": 1},
                {"id": 2, "t": "scalar"},
                {"id": 3, "t": []},
                {"id": 4, "t": null},
                {"id": 5, "t": [true]}
            ])),
            "t",
        );

        assert_eq!(output, docs(json!([{"id": 5, "t": true}])));
    }
}
