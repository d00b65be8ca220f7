//! # Expanding reporter.
//!
//! [`Reporter`] owns the buffer size of one outbound report. Each call to
//! [`Reporter::generate`] runs the generation callback against a bounded
//! [`XmlGenerator`]; if the output does not fit, the buffer is doubled and the
//! callback runs again from scratch. Only the final, complete document reaches
//! the [`ReportSink`].
//!
//! ```text
//! generate(f) ──► XmlGenerator(size) ──► f(xml)
//!                      │                   ├─ Ok  ──► sink.write(name, output)
//!                      │                   └─ BufferExceeded
//!                      └────── size *= 2 ◄─────┘
//! ```
//!
//! ## Rules
//! - The callback may run several times per report; it must not accumulate
//!   state that is shared across invocations.
//! - The grown buffer size is kept for later reports.

use std::sync::Arc;

use crate::error::XmlError;
use crate::reporters::ReportSink;

use super::XmlGenerator;

/// Generates one named report into a [`ReportSink`], growing its buffer on demand.
pub struct Reporter {
    name: &'static str,
    root: &'static str,
    buffer_size: usize,
    sink: Arc<dyn ReportSink>,
}

impl Reporter {
    /// Creates a reporter writing report `name` with root element `root`.
    pub fn new(
        name: &'static str,
        root: &'static str,
        buffer_size: usize,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            name,
            root,
            buffer_size: buffer_size.max(1),
            sink,
        }
    }

    /// Report name used towards the sink.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current buffer size in bytes.
    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Runs `content` inside the root element until the output fits and
    /// writes it to the sink.
    ///
    /// Returns the number of times `content` was invoked. Attempts that fail
    /// on the root tag itself do not count.
    pub fn generate<F>(&mut self, mut content: F) -> Result<usize, XmlError>
    where
        F: FnMut(&mut XmlGenerator) -> Result<(), XmlError>,
    {
        let mut calls = 0;
        loop {
            let mut xml = XmlGenerator::new(self.buffer_size);
            let res = xml.node(self.root, |xml| {
                calls += 1;
                content(xml)
            });
            match res {
                Ok(()) => {
                    self.sink.write(self.name, &xml.finish());
                    return Ok(calls);
                }
                Err(XmlError::BufferExceeded { limit }) => {
                    self.buffer_size = limit.saturating_mul(2);
                    log::debug!(
                        "report '{}' exceeded {} bytes, retrying with {}",
                        self.name,
                        limit,
                        self.buffer_size
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Writes already complete markup to the sink unchanged.
    pub fn report_raw(&self, raw: &str) {
        self.sink.write(self.name, raw);
    }
}
