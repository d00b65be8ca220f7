//! # Report sink: where outbound reports go.
//!
//! [`ReportSink`] is the seam to the outside world. The regenerated init
//! configuration, the restart information, the free-resources report and the
//! init-state mirror are all written through it under their report names.
//!
//! [`MemorySink`] keeps the latest content of each report in memory. It backs
//! the tests and is handy for embedding the monitor into a larger runtime that
//! polls reports instead of receiving them.

use std::collections::HashMap;
use std::sync::Mutex;

/// Receives complete outbound reports.
///
/// Called synchronously from the event loop; implementations should not block
/// for long.
pub trait ReportSink: Send + Sync + 'static {
    /// Stores or forwards the full content of report `report`.
    fn write(&self, report: &str, content: &str);
}

#[derive(Default)]
struct Entry {
    content: String,
    writes: usize,
}

/// In-memory sink keeping the latest content and a write count per report.
#[derive(Default)]
pub struct MemorySink {
    reports: Mutex<HashMap<String, Entry>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest content written under `report`.
    pub fn latest(&self, report: &str) -> Option<String> {
        let reports = self.reports.lock().unwrap_or_else(|e| e.into_inner());
        reports.get(report).map(|e| e.content.clone())
    }

    /// Number of writes seen for `report`.
    pub fn writes(&self, report: &str) -> usize {
        let reports = self.reports.lock().unwrap_or_else(|e| e.into_inner());
        reports.get(report).map(|e| e.writes).unwrap_or(0)
    }

    /// Sorted names of all reports written so far.
    pub fn reports(&self) -> Vec<String> {
        let reports = self.reports.lock().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = reports.keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

impl ReportSink for MemorySink {
    fn write(&self, report: &str, content: &str) {
        let mut reports = self.reports.lock().unwrap_or_else(|e| e.into_inner());
        let entry = reports.entry(report.to_string()).or_default();
        entry.content.clear();
        entry.content.push_str(content);
        entry.writes += 1;
    }
}
