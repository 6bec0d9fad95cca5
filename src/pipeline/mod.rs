//! Aggregation pipeline subsystem for docagg
//!
//! # Flow
//!
//! 1. Parse the JSON wire format into a [`Pipeline`], validating every
//!    stage, criteria operator and accumulator up front
//! 2. Fold the stages left to right over an owned document sequence
//! 3. Return the final documents with per-stage counts
//!
//! Stages run in batch: each one sees the complete output of the previous
//! stage. Lookup is the only stage that touches the resolver and the only
//! one that can fail at execution time.

mod accumulators;
mod aggregation;
mod errors;
mod executor;
mod parser;
mod result;
mod stage;
pub mod stages;

pub use accumulators::{Accumulator, AccumulatorFactory, AccumulatorRegistry};
pub use aggregation::Aggregation;
pub use errors::{PipelineError, PipelineResult};
pub use executor::PipelineExecutor;
pub use parser::is_known_stage;
pub use result::{ExecutionResult, StageStats};
pub use stage::{
    AccumulatorExpr, AccumulatorSource, GroupId, GroupSpec, LookupSpec, Pipeline, PipelineStage,
    ProjectSpec, Projection,
};
