//! Lookup stage
//!
//! Attaches the related documents of a foreign collection to every input
//! document. Resolution goes through [`Relation`], one resolver call per
//! document unless memoization is on.

use std::collections::HashMap;

use crate::observability::{Event, MetricsRegistry};
use crate::pipeline::errors::PipelineResult;
use crate::pipeline::stage::LookupSpec;
use crate::resolver::{Relation, RelationResolver};
use crate::value::{Document, Value};

/// What the lookup stage needs from the executor
pub struct LookupContext<'a, R: RelationResolver + ?Sized> {
    pub resolver: &'a R,
    /// Reuse results for repeated local values within this stage
    pub memoize: bool,
    pub metrics: Option<&'a MetricsRegistry>,
}

pub fn lookup<R: RelationResolver + ?Sized>(
    documents: Vec<Document>,
    spec: &LookupSpec,
    context: &LookupContext<'_, R>,
) -> PipelineResult<Vec<Document>> {
    let relation = Relation::new(&spec.from, &spec.local_field, &spec.foreign_field);
    let mut memo: HashMap<Value, Vec<Document>> = HashMap::new();
    let mut output = Vec::with_capacity(documents.len());

    for mut doc in documents {
        let local = doc.get_or_null(&spec.local_field);

        let related = match memo.get(&local) {
            Some(cached) => {
                if let Some(metrics) = context.metrics {
                    metrics.increment_resolver_cache_hits();
                }
                cached.clone()
            }
            None => {
                let related = relation.get_for(context.resolver, &doc)?;
                if let Some(metrics) = context.metrics {
                    metrics.increment_resolver_calls();
                }
                tracing::trace!(
                    event = Event::LookupResolved.as_str(),
                    from = %spec.from,
                    matched = related.len()
                );
                if context.memoize {
                    memo.insert(local, related.clone());
                }
                related
            }
        };

        doc.insert(
            spec.as_field.as_str(),
            related.into_iter().map(Value::Document).collect::<Vec<_>>(),
        );
        output.push(doc);
    }

    Ok(output)
}
