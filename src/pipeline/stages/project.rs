//! Project stage
//!
//! Builds a new document holding only the named keys. Absent source fields
//! are omitted rather than set to Null. Dotted keys read from and write to
//! nested positions.

use crate::pipeline::stage::{ProjectSpec, Projection};
use crate::value::{Document, Value};

pub fn project(documents: Vec<Document>, spec: &ProjectSpec) -> Vec<Document> {
    documents
        .iter()
        .map(|doc| project_document(doc, spec))
        .collect()
}

/// Projects a single document
pub fn project_document(document: &Document, spec: &ProjectSpec) -> Document {
    let mut output = Document::with_capacity(spec.fields.len());

    for (field, projection) in &spec.fields {
        let source = if field.contains('.') {
            document.get_path(field)
        } else {
            document.get(field)
        };

        let projected = match (projection, source) {
            (Projection::Include, Some(value)) => value.clone(),
            (Projection::Nested(inner), Some(Value::Document(sub))) => {
                Value::Document(project_document(sub, inner))
            }
            _ => continue,
        };
        set_path(&mut output, field, projected);
    }

    output
}

/// Writes `value` at a dotted path, creating intermediate documents
fn set_path(target: &mut Document, path: &str, value: Value) {
    let (head, rest) = match path.split_once('.') {
        Some(parts) => parts,
        None => {
            target.insert(path, value);
            return;
        }
    };

    if !matches!(target.get(head), Some(Value::Document(_))) {
        target.insert(head, Document::new());
    }
    if let Some(Value::Document(child)) = target.get_mut(head) {
        set_path(child, rest, value);
    }
}
