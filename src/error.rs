//! Error types used by the heartvisor engine and its ingestion endpoint.
//!
//! This module defines three enums:
//!
//! - [`XmlError`]: failures of the markup parser and the bounded generator.
//! - [`MonitorError`]: anomalies detected by the engine while processing reports.
//! - [`SubmitError`]: failures to hand a report to the event loop.
//!
//! None of them is fatal. The engine turns every [`MonitorError`] into an
//! event and a log line, then keeps its prior state. The helper methods
//! (`as_label`, `as_message`) exist for logs and events.

use thiserror::Error;

/// # Errors produced while parsing or generating markup.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XmlError {
    /// Input ended inside a tag or before the root element was closed.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Input is not well-formed at the given byte offset.
    #[error("malformed markup at offset {offset}: {reason}")]
    Malformed {
        /// Byte offset of the offending character.
        offset: usize,
        /// Short description of what was expected.
        reason: &'static str,
    },

    /// Closing tag does not match the element being closed.
    #[error("mismatched closing tag at offset {offset}: expected </{expected}>, found </{found}>")]
    MismatchedTag {
        /// Byte offset of the closing tag.
        offset: usize,
        /// Name of the open element.
        expected: String,
        /// Name found in the closing tag.
        found: String,
    },

    /// Generated output does not fit into the current buffer.
    #[error("generated output exceeds buffer of {limit} bytes")]
    BufferExceeded {
        /// Buffer size in bytes.
        limit: usize,
    },
}

impl XmlError {
    /// Returns a short stable label (snake_case) for use in logs/events.
    ///
    /// # Example
    /// ```
    /// use heartvisor::XmlError;
    ///
    /// let err = XmlError::BufferExceeded { limit: 64 };
    /// assert_eq!(err.as_label(), "xml_buffer_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            XmlError::UnexpectedEof => "xml_unexpected_eof",
            XmlError::Malformed { .. } => "xml_malformed",
            XmlError::MismatchedTag { .. } => "xml_mismatched_tag",
            XmlError::BufferExceeded { .. } => "xml_buffer_exceeded",
        }
    }
}

/// # Anomalies detected by the engine.
///
/// Every variant degrades to "skip this update, keep prior state".
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    /// An inbound state report could not be parsed.
    #[error("malformed state report from '{label}': {source}")]
    MalformedReport {
        /// Session label of the reporting sub-tree.
        label: String,
        /// Parser error.
        #[source]
        source: XmlError,
    },

    /// An inbound init configuration could not be parsed.
    #[error("malformed init configuration: {source}")]
    MalformedConfig {
        /// Parser error.
        #[source]
        source: XmlError,
    },

    /// An inbound report is not valid UTF-8.
    #[error("state report from '{label}' is not valid UTF-8")]
    InvalidUtf8 {
        /// Session label of the reporting sub-tree.
        label: String,
    },

    /// Less quota is available than is already committed to other slices.
    #[error(
        "unable to upgrade dynamic {resource} of '{slice}': total {resource} ({total}) less than total configured {resource} ({configured})"
    )]
    ResourcesInfeasible {
        /// `caps` or `ram`.
        resource: &'static str,
        /// Elastic slice name.
        slice: String,
        /// Available quota after subtracting the safety margin.
        total: u64,
        /// Quota configured for all other slices.
        configured: u64,
    },

    /// Restart requested for a label that matches no known slice.
    #[error("restart requested for a component '{label}' that isn't running")]
    UnknownComponent {
        /// Failure label of the component.
        label: String,
    },

    /// The elastic slice is configured but not present in the registry.
    #[error("slice '{slice}' for dynamic resource assignment not found")]
    ElasticSliceMissing {
        /// Elastic slice name.
        slice: String,
    },
}

impl MonitorError {
    /// Returns a short stable label (snake_case) for use in logs/events.
    ///
    /// # Example
    /// ```
    /// use heartvisor::MonitorError;
    ///
    /// let err = MonitorError::UnknownComponent { label: "vbox -> vfs".into() };
    /// assert_eq!(err.as_label(), "unknown_component");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            MonitorError::MalformedReport { .. } => "malformed_report",
            MonitorError::MalformedConfig { .. } => "malformed_config",
            MonitorError::InvalidUtf8 { .. } => "invalid_utf8",
            MonitorError::ResourcesInfeasible { .. } => "resources_infeasible",
            MonitorError::UnknownComponent { .. } => "unknown_component",
            MonitorError::ElasticSliceMissing { .. } => "elastic_slice_missing",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// # Errors returned by the ingestion endpoint.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// Input queue of the event loop is full.
    #[error("input queue full")]
    Full,

    /// Event loop has stopped.
    #[error("monitor closed")]
    Closed,
}

impl SubmitError {
    /// Returns a short stable label (snake_case) for use in logs/events.
    pub fn as_label(&self) -> &'static str {
        match self {
            SubmitError::Full => "submit_full",
            SubmitError::Closed => "submit_closed",
        }
    }
}
