//! Pipeline stage definitions
//!
//! Stages are immutable once parsed. The executor only reads them.

use std::fmt;

use crate::query::{Criteria, SortKey};
use crate::value::{Document, Value};

use super::accumulators::{Accumulator, AccumulatorFactory};

/// A parsed, validated pipeline
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<PipelineStage>,
}

impl Pipeline {
    pub fn new(stages: Vec<PipelineStage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(PipelineStage::name).collect()
    }
}

/// One step of a pipeline
#[derive(Debug, Clone)]
pub enum PipelineStage {
    Match(Criteria),
    Group(GroupSpec),
    Sort(Vec<SortKey>),
    Limit(usize),
    Skip(usize),
    Lookup(LookupSpec),
    Project(ProjectSpec),
    /// Top-level array field to fan out, without the `$` prefix
    Unwind(String),
}

impl PipelineStage {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineStage::Match(_) => "match",
            PipelineStage::Group(_) => "group",
            PipelineStage::Sort(_) => "sort",
            PipelineStage::Limit(_) => "limit",
            PipelineStage::Skip(_) => "skip",
            PipelineStage::Lookup(_) => "lookup",
            PipelineStage::Project(_) => "project",
            PipelineStage::Unwind(_) => "unwind",
        }
    }
}

// ============================================================================
// Group
// ============================================================================

/// Group key definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupId {
    /// Every document falls into a single group keyed Null
    None,
    /// Key is the value of one field
    Field(String),
    /// Key is a document of alias to field value, in declaration order
    Composite(Vec<(String, String)>),
}

impl GroupId {
    /// Computes the group key of a document. Missing fields read as Null.
    pub fn key_for(&self, document: &Document) -> Value {
        match self {
            GroupId::None => Value::Null,
            GroupId::Field(field) => document.get_or_null(field),
            GroupId::Composite(parts) => Value::Document(
                parts
                    .iter()
                    .map(|(alias, field)| (alias.clone(), document.get_or_null(field)))
                    .collect(),
            ),
        }
    }
}

/// What an accumulator reads from each document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccumulatorSource {
    Field(String),
    /// Fed unchanged for every document, so `{"$sum": 1}` counts
    Literal(Value),
}

/// A resolved accumulator operator together with its source
#[derive(Clone)]
pub struct AccumulatorExpr {
    pub operator: String,
    pub source: AccumulatorSource,
    factory: AccumulatorFactory,
}

impl AccumulatorExpr {
    pub fn new(
        operator: impl Into<String>,
        source: AccumulatorSource,
        factory: AccumulatorFactory,
    ) -> Self {
        Self {
            operator: operator.into(),
            source,
            factory,
        }
    }

    /// Fresh accumulator state for a new group
    pub fn init(&self) -> Box<dyn Accumulator> {
        (self.factory)()
    }

    /// Value fed to the accumulator for `document`; `None` when the source
    /// field is absent.
    pub fn source_value<'a>(&'a self, document: &'a Document) -> Option<&'a Value> {
        match &self.source {
            AccumulatorSource::Field(field) => document.get(field),
            AccumulatorSource::Literal(value) => Some(value),
        }
    }
}

impl fmt::Debug for AccumulatorExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccumulatorExpr")
            .field("operator", &self.operator)
            .field("source", &self.source)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct GroupSpec {
    pub id: GroupId,
    /// Output fields in declaration order
    pub fields: Vec<(String, AccumulatorExpr)>,
}

// ============================================================================
// Lookup / Project
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSpec {
    pub from: String,
    pub local_field: String,
    pub foreign_field: String,
    pub as_field: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    Include,
    Nested(ProjectSpec),
}

/// Ordered projection. Keys may be dotted paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSpec {
    pub fields: Vec<(String, Projection)>,
}

impl ProjectSpec {
    pub fn new(fields: Vec<(String, Projection)>) -> Self {
        Self { fields }
    }
}
