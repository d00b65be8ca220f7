//! # Init state mirror.
//!
//! Forwards the runtime's own state report verbatim under `init.state`, so
//! other components can observe the runtime without opening a report session
//! of their own.

use std::sync::Arc;

use crate::label::SessionLabel;
use crate::xml::Reporter;

use super::ReportSink;

/// Report name of the mirrored state.
pub const INIT_STATE: &str = "init.state";

pub struct InitStateMirror {
    reporter: Reporter,
}

impl InitStateMirror {
    pub fn new(sink: Arc<dyn ReportSink>) -> Self {
        Self {
            reporter: Reporter::new(INIT_STATE, "state", 1, sink),
        }
    }

    /// Returns `true` if reports with `label` are mirrored.
    #[inline]
    pub fn mirrors(label: &SessionLabel) -> bool {
        label.is_runtime_state()
    }

    /// Mirrors `raw` if it was reported under the runtime state label.
    pub fn handle_state(&self, raw: &str, label: &SessionLabel) -> bool {
        if !Self::mirrors(label) {
            return false;
        }
        self.reporter.report_raw(raw);
        true
    }
}
