//! Aggregation bound to a source collection
//!
//! Loads every document of the collection through the resolver and runs a
//! pipeline over them. The same resolver answers lookup stages.

use crate::config::EngineConfig;
use crate::observability::{Event, MetricsRegistry};
use crate::query::Criteria;
use crate::resolver::RelationResolver;
use crate::value::Value;

use super::accumulators::AccumulatorRegistry;
use super::errors::PipelineResult;
use super::executor::PipelineExecutor;
use super::result::ExecutionResult;
use super::stage::Pipeline;

pub struct Aggregation<'a, R: RelationResolver + ?Sized> {
    resolver: &'a R,
    collection: String,
    config: EngineConfig,
    registry: AccumulatorRegistry,
    metrics: Option<&'a MetricsRegistry>,
}

impl<'a, R: RelationResolver + ?Sized> Aggregation<'a, R> {
    pub fn new(resolver: &'a R, collection: impl Into<String>) -> Self {
        Self {
            resolver,
            collection: collection.into(),
            config: EngineConfig::default(),
            registry: AccumulatorRegistry::with_builtins(),
            metrics: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the accumulator registry used to parse JSON pipelines
    pub fn with_registry(mut self, registry: AccumulatorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_metrics(mut self, metrics: &'a MetricsRegistry) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Parses and runs a JSON pipeline
    pub fn run_json(&self, spec: &serde_json::Value) -> PipelineResult<ExecutionResult> {
        let pipeline = Pipeline::parse_with(&Value::from(spec.clone()), &self.registry)?;
        tracing::debug!(
            event = Event::PipelineParsed.as_str(),
            collection = %self.collection,
            stages = ?pipeline.stage_names()
        );
        self.run(&pipeline)
    }

    /// Runs an already parsed pipeline
    pub fn run(&self, pipeline: &Pipeline) -> PipelineResult<ExecutionResult> {
        let documents = self
            .resolver
            .find_in_collection(&self.collection, &Criteria::all())?;

        let mut executor = PipelineExecutor::new(self.resolver).with_config(self.config.clone());
        if let Some(metrics) = self.metrics {
            executor = executor.with_metrics(metrics);
        }
        executor.execute(documents, pipeline)
    }
}
