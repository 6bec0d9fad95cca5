//! Group stage
//!
//! Single pass over the input. Group keys are compared by value equality,
//! so `1` and `1.0` land in the same group. Output order is the order in
//! which keys were first seen.

use std::collections::HashMap;

use crate::pipeline::accumulators::Accumulator;
use crate::pipeline::stage::GroupSpec;
use crate::value::{Document, Value};

struct GroupState {
    key: Value,
    accumulators: Vec<Box<dyn Accumulator>>,
}

pub fn group(documents: Vec<Document>, spec: &GroupSpec) -> Vec<Document> {
    let mut slots: HashMap<Value, usize> = HashMap::new();
    let mut groups: Vec<GroupState> = Vec::new();

    for doc in &documents {
        let key = spec.id.key_for(doc);
        let slot = match slots.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = groups.len();
                groups.push(GroupState {
                    key: key.clone(),
                    accumulators: spec.fields.iter().map(|(_, expr)| expr.init()).collect(),
                });
                slots.insert(key, slot);
                slot
            }
        };

        let state = &mut groups[slot];
        for ((_, expr), accumulator) in spec.fields.iter().zip(state.accumulators.iter_mut()) {
            accumulator.accumulate(expr.source_value(doc));
        }
    }

    groups
        .into_iter()
        .map(|state| {
            let mut output = Document::with_capacity(spec.fields.len() + 1);
            output.insert("_id", state.key);
            for ((name, _), accumulator) in spec.fields.iter().zip(state.accumulators) {
                output.insert(name.as_str(), accumulator.finalize());
            }
            output
        })
        .collect()
}
