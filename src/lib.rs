//! docagg - aggregation pipelines over JSON document collections
//!
//! A pipeline is an ordered list of stages (match, group, sort, limit, skip,
//! lookup, project, unwind) folded over an in-memory document sequence.
//! Lookup resolves related documents through a [`resolver::RelationResolver`].

pub mod cli;
pub mod config;
pub mod errors;
pub mod observability;
pub mod pipeline;
pub mod query;
pub mod resolver;
pub mod value;
