//! Observable events
//!
//! Every structured log line emitted by docagg carries one of these names in
//! its `event` field.

use std::fmt;

/// Observable events in docagg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded and validated
    ConfigLoaded,
    /// One collection file read from the data directory
    CollectionLoaded,
    /// Collections loaded into the in-memory catalog
    CatalogLoaded,

    // Pipeline execution
    /// Pipeline parsed and validated
    PipelineParsed,
    /// Pipeline execution begins
    PipelineBegin,
    /// One stage finished
    StageComplete,
    /// Pipeline execution finished
    PipelineComplete,
    /// Pipeline execution failed
    PipelineFailed,

    // Lookups
    /// Relation resolver answered a lookup
    LookupResolved,

    // CLI requests
    /// Aggregate request answered
    AggregateExecuted,
    /// Collection find executed
    FindExecuted,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::CollectionLoaded => "COLLECTION_LOADED",
            Event::CatalogLoaded => "CATALOG_LOADED",
            Event::PipelineParsed => "PIPELINE_PARSED",
            Event::PipelineBegin => "PIPELINE_BEGIN",
            Event::StageComplete => "STAGE_COMPLETE",
            Event::PipelineComplete => "PIPELINE_COMPLETE",
            Event::PipelineFailed => "PIPELINE_FAILED",
            Event::LookupResolved => "LOOKUP_RESOLVED",
            Event::AggregateExecuted => "AGGREGATE_EXECUTED",
            Event::FindExecuted => "FIND_EXECUTED",
        }
    }

    /// Returns true for events that report a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::PipelineFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_EVENTS: [Event; 11] = [
        Event::ConfigLoaded,
        Event::CollectionLoaded,
        Event::CatalogLoaded,
        Event::PipelineParsed,
        Event::PipelineBegin,
        Event::StageComplete,
        Event::PipelineComplete,
        Event::PipelineFailed,
        Event::LookupResolved,
        Event::AggregateExecuted,
        Event::FindExecuted,
    ];

    #[test]
    fn test_event_names_are_screaming_snake_case() {
        for event in ALL_EVENTS {
            let name = event.as_str();
            assert!(name.chars().all(|c| c.is_ascii_uppercase() || c == '_'), "{}", name);
        }
    }

    #[test]
    fn test_event_names_are_distinct() {
        let names: std::collections::BTreeSet<&str> =
            ALL_EVENTS.iter().map(Event::as_str).collect();
        assert_eq!(names.len(), ALL_EVENTS.len());
    }

    #[test]
    fn test_only_failed_is_failure() {
        assert!(Event::PipelineFailed.is_failure());
        assert!(!Event::PipelineComplete.is_failure());
    }
}
