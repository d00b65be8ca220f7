//! # Restart information report.
//!
//! Written after every processed state report:
//!
//! ```text
//! <restart_info>
//!     <component name="vbox" restarts="3">
//!         <failed label="vbox -> vfs" ram_requests="1" skipped_heartbeats="1"/>
//!         <failed label="vbox -> init -> log" caps_requests="5"/>
//!     </component>
//!     <component name="fs"/>
//! </restart_info>
//! ```
//!
//! ## Rules
//! - One `component` per slice, in registry order.
//! - `restarts` and `failed` entries appear only once a slice has a non-zero
//!   combined version; counters that are zero are omitted.
//! - Reporting never changes the registry.

use std::sync::Arc;

use crate::error::XmlError;
use crate::slices::{FailedComponent, Failure, SliceRegistry};
use crate::xml::{Reporter, XmlGenerator};

use super::ReportSink;

/// Report name of the restart information.
pub const RESTART_INFO: &str = "restart_info";

const COUNTERS: [(Failure, &str); 5] = [
    (Failure::CapsRequest, "caps_requests"),
    (Failure::CpuFault, "cpu_faults"),
    (Failure::Heartbeat, "skipped_heartbeats"),
    (Failure::RamRequest, "ram_requests"),
    (Failure::SegFault, "segfaults"),
];

/// Serialises restart bookkeeping of all slices.
pub struct RestartReporter {
    reporter: Reporter,
}

impl RestartReporter {
    pub fn new(buffer_size: usize, sink: Arc<dyn ReportSink>) -> Self {
        Self {
            reporter: Reporter::new(RESTART_INFO, RESTART_INFO, buffer_size, sink),
        }
    }

    /// Writes the current state of `slices`.
    pub fn report_state(&mut self, slices: &SliceRegistry) -> Result<(), XmlError> {
        self.reporter.generate(|xml| {
            for slice in slices {
                xml.node("component", |xml| {
                    xml.attribute("name", slice.name())?;
                    if slice.combined_version() == 0 {
                        return Ok(());
                    }
                    xml.attribute("restarts", slice.combined_version())?;
                    for failed in slice.failed() {
                        xml.node("failed", |xml| write_failed(xml, failed))?;
                    }
                    Ok(())
                })?;
            }
            Ok(())
        })?;
        Ok(())
    }
}

fn write_failed(xml: &mut XmlGenerator, failed: &FailedComponent) -> Result<(), XmlError> {
    xml.attribute("label", &failed.label)?;
    for (kind, name) in COUNTERS {
        let count = failed.count_of(kind);
        if count != 0 {
            xml.attribute(name, count)?;
        }
    }
    Ok(())
}
