//! # Free resources report.
//!
//! Publishes how much RAM and how many capabilities the runtime has left,
//! taken from the runtime's own state report (`runtime -> state`). Reports of
//! nested inits and reports without both root `<ram>` and `<caps>` nodes are
//! ignored.

use std::sync::Arc;

use crate::error::XmlError;
use crate::label::SessionLabel;
use crate::xml::{NumberOfBytes, Reporter, XmlNode};

use super::ReportSink;

/// Report name of the free resources.
pub const FREE_RESOURCES: &str = "free_resources";

pub struct FreeResourcesReporter {
    reporter: Reporter,
}

impl FreeResourcesReporter {
    pub fn new(buffer_size: usize, sink: Arc<dyn ReportSink>) -> Self {
        Self {
            reporter: Reporter::new(FREE_RESOURCES, FREE_RESOURCES, buffer_size, sink),
        }
    }

    /// Writes the report if `state` comes from the runtime itself.
    ///
    /// Returns `Ok(false)` when the report was skipped.
    pub fn handle_state(
        &mut self,
        state: &XmlNode<'_>,
        label: &SessionLabel,
    ) -> Result<bool, XmlError> {
        if !label.scope().is_runtime() {
            return Ok(false);
        }
        let (Some(ram), Some(caps)) = (state.sub_node("ram"), state.sub_node("caps")) else {
            return Ok(false);
        };

        let avail_ram = ram.attribute_value("avail", NumberOfBytes::default());
        let avail_caps: u64 = caps.attribute_value("avail", 0);

        self.reporter.generate(|xml| {
            xml.node("ram", |xml| xml.attribute("available_mb", avail_ram.as_mib()))?;
            xml.node("caps", |xml| xml.attribute("available", avail_caps))
        })?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::MemorySink;

    const STATE: &str = r#"<state version="1">
        <ram quota="256M" avail="100M"/>
        <caps quota="3000" avail="1200"/>
        <child name="fs"/>
    </state>"#;

    #[test]
    fn test_runtime_report() {
        let sink = Arc::new(MemorySink::new());
        let mut reporter = FreeResourcesReporter::new(4096, sink.clone());
        let root = XmlNode::parse(STATE).unwrap();

        let written = reporter
            .handle_state(&root, &SessionLabel::parse("runtime -> state"))
            .unwrap();

        assert!(written);
        assert_eq!(
            sink.latest(FREE_RESOURCES).as_deref(),
            Some(
                "<free_resources><ram available_mb=\"100\"/><caps available=\"1200\"/></free_resources>"
            )
        );
    }

    #[test]
    fn test_nested_report_ignored() {
        let sink = Arc::new(MemorySink::new());
        let mut reporter = FreeResourcesReporter::new(4096, sink.clone());
        let root = XmlNode::parse(STATE).unwrap();

        let written = reporter
            .handle_state(&root, &SessionLabel::parse("runtime -> vbox -> state"))
            .unwrap();

        assert!(!written);
        assert_eq!(sink.writes(FREE_RESOURCES), 0);
    }

    #[test]
    fn test_incomplete_report_ignored() {
        let sink = Arc::new(MemorySink::new());
        let mut reporter = FreeResourcesReporter::new(4096, sink.clone());
        let root = XmlNode::parse(r#"<state><ram avail="1M"/><child name="a"/></state>"#).unwrap();

        let written = reporter
            .handle_state(&root, &SessionLabel::parse("runtime -> state"))
            .unwrap();

        assert!(!written);
        assert_eq!(sink.writes(FREE_RESOURCES), 0);
    }
}
