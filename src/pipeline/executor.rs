//! Pipeline executor
//!
//! Folds the stages left to right over an owned document sequence. Each
//! stage sees the complete output of the previous one.

use crate::config::EngineConfig;
use crate::observability::{Event, MetricsRegistry};
use crate::resolver::RelationResolver;
use crate::value::Document;

use super::errors::{PipelineError, PipelineResult};
use super::result::{ExecutionResult, StageStats};
use super::stage::{Pipeline, PipelineStage};
use super::stages::{self, LookupContext};

/// Executes parsed pipelines. The resolver is only used by lookup stages.
pub struct PipelineExecutor<'a, R: RelationResolver + ?Sized> {
    resolver: &'a R,
    config: EngineConfig,
    metrics: Option<&'a MetricsRegistry>,
}

impl<'a, R: RelationResolver + ?Sized> PipelineExecutor<'a, R> {
    /// Creates an executor with the default engine configuration
    pub fn new(resolver: &'a R) -> Self {
        Self {
            resolver,
            config: EngineConfig::default(),
            metrics: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_metrics(mut self, metrics: &'a MetricsRegistry) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Runs `pipeline` over `documents`.
    ///
    /// Fails on the first resolver error or when a stage exceeds
    /// `max_documents`; no partial result is returned.
    pub fn execute(
        &self,
        documents: Vec<Document>,
        pipeline: &Pipeline,
    ) -> PipelineResult<ExecutionResult> {
        let input_count = documents.len();
        tracing::debug!(
            event = Event::PipelineBegin.as_str(),
            stages = pipeline.len(),
            documents = input_count
        );
        if let Some(metrics) = self.metrics {
            metrics.add_documents_in(input_count as u64);
        }

        match self.run_stages(documents, pipeline) {
            Ok((documents, stages)) => {
                tracing::debug!(
                    event = Event::PipelineComplete.as_str(),
                    stages = stages.len(),
                    documents = documents.len()
                );
                if let Some(metrics) = self.metrics {
                    metrics.increment_pipelines_executed();
                    metrics.add_documents_out(documents.len() as u64);
                }
                Ok(ExecutionResult {
                    documents,
                    input_count,
                    stages,
                })
            }
            Err(err) => {
                tracing::warn!(
                    event = Event::PipelineFailed.as_str(),
                    code = err.code(),
                    error = %err
                );
                if let Some(metrics) = self.metrics {
                    metrics.increment_pipelines_failed();
                }
                Err(err)
            }
        }
    }

    fn run_stages(
        &self,
        mut documents: Vec<Document>,
        pipeline: &Pipeline,
    ) -> PipelineResult<(Vec<Document>, Vec<StageStats>)> {
        let mut stats = Vec::with_capacity(pipeline.len());

        for stage in pipeline.stages() {
            let input_count = documents.len();
            documents = self.apply(documents, stage)?;
            let output_count = documents.len();

            if let Some(limit) = self.config.max_documents {
                if output_count > limit {
                    return Err(PipelineError::ExecutionLimit {
                        stage: stage.name().to_string(),
                        produced: output_count,
                        limit,
                    });
                }
            }

            tracing::trace!(
                event = Event::StageComplete.as_str(),
                stage = stage.name(),
                input = input_count,
                output = output_count
            );
            if let Some(metrics) = self.metrics {
                metrics.increment_stages_executed();
            }
            stats.push(StageStats {
                stage: stage.name(),
                input_count,
                output_count,
            });
        }

        Ok((documents, stats))
    }

    fn apply(
        &self,
        documents: Vec<Document>,
        stage: &PipelineStage,
    ) -> PipelineResult<Vec<Document>> {
        let output = match stage {
            PipelineStage::Match(criteria) => stages::select(documents, criteria),
            PipelineStage::Group(spec) => stages::group(documents, spec),
            PipelineStage::Sort(keys) => stages::sort(documents, keys),
            PipelineStage::Limit(count) => stages::limit(documents, *count),
            PipelineStage::Skip(count) => stages::skip(documents, *count),
            PipelineStage::Project(spec) => stages::project(documents, spec),
            PipelineStage::Unwind(field) => stages::unwind(documents, field),
            PipelineStage::Lookup(spec) => {
                let context = LookupContext {
                    resolver: self.resolver,
                    memoize: self.config.memoize_lookups,
                    metrics: self.metrics,
                };
                stages::lookup(documents, spec, &context)?
            }
        };
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::MemoryCatalog;
    use crate::value::Value;
    use serde_json::json;

    fn docs(value: serde_json::Value) -> Vec<Document> {
        serde_json::from_value(value).unwrap()
    }

    fn pipeline(value: serde_json::Value) -> Pipeline {
        Pipeline::from_json(&value).unwrap()
    }

    fn catalog() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        catalog
            .insert_collection("tags", docs(json!([{"name": "a", "w": 1}, {"name": "b", "w": 2}])))
            .unwrap();
        catalog
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let catalog = catalog();
        let input = docs(json!([{"a": 1}, {"a": 2}]));

        let result = PipelineExecutor::new(&catalog)
            .execute(input.clone(), &Pipeline::default())
            .unwrap();

        assert_eq!(result.documents, input);
        assert!(result.stages.is_empty());
    }

    #[test]
    fn test_stage_stats_recorded() {
        let catalog = catalog();
        let result = PipelineExecutor::new(&catalog)
            .execute(
                docs(json!([{"t": [1, 2]}, {"t": [3]}, {"t": 4}])),
                &pipeline(json!([{"$unwind": "$t"}, {"$limit": 2}])),
            )
            .unwrap();

        assert_eq!(result.input_count, 3);
        assert_eq!(
            result.stages,
            vec![
                StageStats {
                    stage: "unwind",
                    input_count: 3,
                    output_count: 3,
                },
                StageStats {
                    stage: "limit",
                    input_count: 3,
                    output_count: 2,
                },
            ]
        );
    }

    #[test]
    fn test_lookup_uses_resolver() {
        let catalog = catalog();
        let result = PipelineExecutor::new(&catalog)
            .execute(
                docs(json!([{"tag": "b"}])),
                &pipeline(json!([{"$lookup": {
                    "from": "tags", "localField": "tag", "foreignField": "name", "as": "t"
                }}])),
            )
            .unwrap();

        let attached = result.documents[0].get("t").and_then(Value::as_array).unwrap();
        assert_eq!(attached.len(), 1);
        assert_eq!(attached[0].as_document().unwrap().get("w"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_max_documents_enforced() {
        let catalog = catalog();
        let config = EngineConfig {
            max_documents: Some(2),
            ..EngineConfig::default()
        };
        let metrics = MetricsRegistry::new();

        let err = PipelineExecutor::new(&catalog)
            .with_config(config)
            .with_metrics(&metrics)
            .execute(docs(json!([{"t": [1, 2, 3]}])), &pipeline(json!([{"$unwind": "$t"}])))
            .unwrap_err();

        assert_eq!(err.code(), "DOCAGG_PIPELINE_EXECUTION_LIMIT");
        assert_eq!(metrics.snapshot().pipelines_failed, 1);
        assert_eq!(metrics.snapshot().pipelines_executed, 0);
    }

    #[test]
    fn test_metrics_recorded() {
        let catalog = catalog();
        let metrics = MetricsRegistry::new();

        PipelineExecutor::new(&catalog)
            .with_metrics(&metrics)
            .execute(
                docs(json!([{"a": 1}, {"a": 2}, {"a": 3}])),
                &pipeline(json!([{"$match": {"a": {"$gte": 2}}}, {"$sort": {"a": -1}}])),
            )
            .unwrap();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.pipelines_executed, 1);
        assert_eq!(snapshot.stages_executed, 2);
        assert_eq!(snapshot.documents_in, 3);
        assert_eq!(snapshot.documents_out, 2);
    }

    #[test]
    fn test_unknown_lookup_collection_fails() {
        let catalog = catalog();
        let err = PipelineExecutor::new(&catalog)
            .execute(
                docs(json!([{"a": 1}])),
                &pipeline(json!([{"$lookup": {
                    "from": "nope", "localField": "a", "foreignField": "a", "as": "x"
                }}])),
            )
            .unwrap_err();

        assert_eq!(err.code(), "DOCAGG_RESOLVER_UNKNOWN_COLLECTION");
    }

    #[test]
    fn test_empty_lookup_input_never_calls_resolver() {
        let catalog = catalog();
        let result = PipelineExecutor::new(&catalog)
            .execute(
                Vec::new(),
                &pipeline(json!([{"$lookup": {
                    "from": "nope", "localField": "a", "foreignField": "a", "as": "x"
                }}])),
            )
            .unwrap();

        assert!(result.is_empty());
    }
}
