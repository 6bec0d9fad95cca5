//! Metrics registry
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe but lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Metrics registry containing all pipeline counters
///
/// Uses Relaxed ordering; counters are independent of each other.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Pipelines that ran to completion
    pipelines_executed: AtomicU64,
    /// Pipelines that returned an error
    pipelines_failed: AtomicU64,
    /// Stages executed across all pipelines
    stages_executed: AtomicU64,
    /// Documents fed into pipelines
    documents_in: AtomicU64,
    /// Documents produced by pipelines
    documents_out: AtomicU64,
    /// Calls made to the relation resolver
    resolver_calls: AtomicU64,
    /// Lookups answered from the per-execution memo
    resolver_cache_hits: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_pipelines_executed(&self) {
        self.pipelines_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_pipelines_failed(&self) {
        self.pipelines_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_stages_executed(&self) {
        self.stages_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_documents_in(&self, count: u64) {
        self.documents_in.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_documents_out(&self, count: u64) {
        self.documents_out.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_resolver_calls(&self) {
        self.resolver_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_resolver_cache_hits(&self) {
        self.resolver_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pipelines_executed: self.pipelines_executed.load(Ordering::Relaxed),
            pipelines_failed: self.pipelines_failed.load(Ordering::Relaxed),
            stages_executed: self.stages_executed.load(Ordering::Relaxed),
            documents_in: self.documents_in.load(Ordering::Relaxed),
            documents_out: self.documents_out.load(Ordering::Relaxed),
            resolver_calls: self.resolver_calls.load(Ordering::Relaxed),
            resolver_cache_hits: self.resolver_cache_hits.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub pipelines_executed: u64,
    pub pipelines_failed: u64,
    pub stages_executed: u64,
    pub documents_in: u64,
    pub documents_out: u64,
    pub resolver_calls: u64,
    pub resolver_cache_hits: u64,
}
