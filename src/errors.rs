//! Shared error severity
//!
//! Every subsystem error reports one of these so callers can tell a
//! rejected request apart from a failed execution.

use std::fmt;

/// Severity levels for docagg errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller supplied an invalid query, pipeline or configuration
    Reject,
    /// Operation failed while running
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Reject => "REJECT",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
