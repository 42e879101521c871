//! Pass/fail report over checker results.

use crate::checker::{CheckResults, Failure};
use crate::taxonomy::EventTypeName;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub passed: bool,
    pub checked_types: usize,
    /// Sorted by type name, taxonomy and failure kind.
    pub failures: Vec<Failure>,
    /// Warnings only; never fail the run.
    pub undocumented: Vec<EventTypeName>,
}

impl Report {
    pub fn from_results(results: CheckResults) -> Self {
        let CheckResults {
            checked_types,
            mut failures,
            mut undocumented,
        } = results;
        failures.sort_by(|a, b| {
            (a.event_type(), a.taxonomy(), a.kind())
                .cmp(&(b.event_type(), b.taxonomy(), b.kind()))
        });
        undocumented.sort();
        undocumented.dedup();
        Self {
            passed: failures.is_empty(),
            checked_types,
            failures,
            undocumented,
        }
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    /// One line per failure.
    pub fn diagnostics(&self) -> Vec<String> {
        self.failures.iter().map(ToString::to_string).collect()
    }

    /// Human-readable report; see the `Display` impl.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

/// Failures, then warnings, then a summary line.
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for failure in &self.failures {
            writeln!(f, "FAIL {failure}")?;
        }
        for event_type in &self.undocumented {
            writeln!(f, "WARN {event_type} has no description")?;
        }
        let status = if self.passed { "passed" } else { "failed" };
        writeln!(
            f,
            "{status}: {} type(s) checked, {} failure(s), {} undocumented",
            self.checked_types,
            self.failures.len(),
            self.undocumented.len()
        )
    }
}
