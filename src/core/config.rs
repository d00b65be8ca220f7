//! # Monitor configuration.
//!
//! Provides [`MonitorConfig`], the settings of the detector and of the event
//! loop around it.
//!
//! The only setting read from the monitor's own configuration document is the
//! elastic slice:
//!
//! ```text
//! <config remaining_resources_for="runtime -> dynamic"/>
//!                                  └──┬───┘   └──┬──┘
//!          sibling report label: "runtime -> state"   elastic slice: "dynamic"
//! ```
//!
//! ## Sentinel values
//! - `remaining_resources_for = None` → no dynamic resource assignment
//! - `bus_capacity = 0` → clamped to 1 by the bus

use crate::error::MonitorError;
use crate::label::SessionLabel;
use crate::xml::{NumberOfBytes, XmlNode};

/// Configuration of the heartbeat monitor.
///
/// ## Field semantics
/// - `remaining_resources_for`: label of the slice receiving spare quota
/// - `caps_margin` / `ram_margin`: quota held back from the spare amount
/// - `heartbeat_threshold`: skipped heartbeats that trigger a restart
/// - `config_buffer_size` / `report_buffer_size`: initial report buffers (grown on demand)
/// - `session_buffer_size`: inbound report size limit per session
/// - `input_capacity`: queued inbound reports before `try_submit` fails
/// - `bus_capacity`: event bus ring buffer size (min 1)
///
/// ## Notes
/// All fields are public. Prefer the helper accessors over reading
/// `remaining_resources_for` directly.
#[derive(Clone, Debug)]
pub struct MonitorConfig {
    /// Label of the elastic slice, e.g. `runtime -> dynamic`.
    ///
    /// The last element names the slice; the prefix extended by `state` is
    /// the label of the report whose resource figures drive reallocation.
    pub remaining_resources_for: Option<SessionLabel>,

    /// Capabilities kept in reserve when assigning spare caps.
    pub caps_margin: u64,

    /// RAM kept in reserve when assigning spare RAM.
    pub ram_margin: NumberOfBytes,

    /// Skipped heartbeats at which a child is considered unresponsive.
    pub heartbeat_threshold: u64,

    /// Initial buffer size of the regenerated init configuration.
    pub config_buffer_size: usize,

    /// Initial buffer size of the restart and free-resources reports.
    pub report_buffer_size: usize,

    /// Maximum size of one inbound state report; longer input is truncated.
    pub session_buffer_size: usize,

    /// Capacity of the event loop's input queue.
    pub input_capacity: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl MonitorConfig {
    /// Reads the monitor's own configuration document.
    ///
    /// Unknown attributes are ignored; everything not set keeps its default.
    pub fn from_xml(text: &str) -> Result<Self, MonitorError> {
        let root = XmlNode::parse(text).map_err(|source| MonitorError::MalformedConfig { source })?;
        let mut config = Self::default();

        config.remaining_resources_for = root
            .attribute("remaining_resources_for")
            .map(SessionLabel::parse)
            .filter(|label| !label.is_empty());

        Ok(config)
    }

    /// Builder-style setter for the elastic slice label.
    pub fn with_remaining_resources_for(mut self, label: impl Into<SessionLabel>) -> Self {
        self.remaining_resources_for = Some(label.into());
        self
    }

    /// Name of the slice receiving spare quota.
    pub fn elastic_slice(&self) -> Option<&str> {
        self.remaining_resources_for
            .as_ref()
            .map(SessionLabel::last_element)
    }

    /// Label of the state report that drives reallocation.
    pub fn sibling_report_label(&self) -> Option<SessionLabel> {
        self.remaining_resources_for
            .as_ref()
            .map(|label| label.prefix().child("state"))
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns an input queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn input_capacity_clamped(&self) -> usize {
        self.input_capacity.max(1)
    }
}

impl Default for MonitorConfig {
    /// Default configuration:
    ///
    /// - no elastic slice
    /// - `caps_margin = 400`, `ram_margin = 20M`
    /// - `heartbeat_threshold = 3`
    /// - `config_buffer_size = 16384`, `report_buffer_size = 4096`
    /// - `session_buffer_size = 4096`
    /// - `input_capacity = 64`, `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            remaining_resources_for: None,
            caps_margin: 400,
            ram_margin: NumberOfBytes::new(20 * 1024 * 1024),
            heartbeat_threshold: 3,
            config_buffer_size: 16384,
            report_buffer_size: 4096,
            session_buffer_size: 4096,
            input_capacity: 64,
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.caps_margin, 400);
        assert_eq!(config.ram_margin.to_string(), "20M");
        assert_eq!(config.heartbeat_threshold, 3);
        assert!(config.elastic_slice().is_none());
        assert!(config.sibling_report_label().is_none());
    }

    #[test]
    fn test_from_xml() {
        let config =
            MonitorConfig::from_xml(r#"<config remaining_resources_for="runtime -> dynamic"/>"#)
                .unwrap();
        assert_eq!(config.elastic_slice(), Some("dynamic"));
        assert_eq!(
            config.sibling_report_label().unwrap().to_string(),
            "runtime -> state"
        );
    }

    #[test]
    fn test_from_xml_without_elastic_slice() {
        let config = MonitorConfig::from_xml("<config/>").unwrap();
        assert!(config.remaining_resources_for.is_none());

        let err = MonitorConfig::from_xml("<config").unwrap_err();
        assert_eq!(err.as_label(), "malformed_config");
    }
}
