//! # Session labels and report addressing.
//!
//! A session label names the position of a reporting init in the supervision
//! tree as `->`-separated segments. State reports always end in `state`:
//!
//! ```text
//! runtime -> state                       ReportScope::Runtime
//! runtime -> SLICE -> state              ReportScope::Slice { slice: SLICE }
//! runtime -> SLICE -> SUB (-> SUB)* -> state
//!                                        ReportScope::Slice { slice: SLICE }
//! ```
//!
//! `runtime` is the init whose configuration the monitor rewrites. In the
//! first shape every reported child is itself a slice. In the other shapes
//! every failure is attributed to the slice right after `runtime`, since only
//! whole slices can be restarted.

use std::fmt;
use std::str::FromStr;

const DELIMITER: &str = "->";

/// Parsed `->`-delimited label.
///
/// Segments are trimmed, so `a->b` and `a -> b` compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SessionLabel {
    segments: Vec<String>,
}

impl SessionLabel {
    /// Parses a label; an empty string yields a label without segments.
    pub fn parse(label: &str) -> Self {
        if label.trim().is_empty() {
            return Self::default();
        }
        Self {
            segments: label
                .split(DELIMITER)
                .map(|s| s.trim().to_string())
                .collect(),
        }
    }

    /// Builds a label from already separated segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    #[inline]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, or `""` for an empty label.
    pub fn last_element(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// The label without its last segment.
    pub fn prefix(&self) -> SessionLabel {
        let n = self.segments.len().saturating_sub(1);
        Self {
            segments: self.segments[..n].to_vec(),
        }
    }

    /// The label extended by one segment.
    pub fn child(&self, segment: &str) -> SessionLabel {
        let mut segments = self.segments.clone();
        segments.push(segment.trim().to_string());
        Self { segments }
    }

    /// Returns `true` if `self` equals `other` or lies below it.
    pub fn starts_with(&self, other: &SessionLabel) -> bool {
        self.segments.starts_with(&other.segments)
    }

    /// Which part of the supervision tree a state report with this label covers.
    pub fn scope(&self) -> ReportScope<'_> {
        let reporter = &self.segments[..self.segments.len().saturating_sub(1)];
        match reporter {
            [] => ReportScope::Runtime { runtime: "" },
            [runtime] => ReportScope::Runtime {
                runtime: runtime.as_str(),
            },
            [runtime, slice, ..] => ReportScope::Slice {
                runtime: runtime.as_str(),
                slice: slice.as_str(),
            },
        }
    }

    /// Returns `true` for `<runtime> -> state`, the report of the runtime
    /// init itself.
    pub fn is_runtime_state(&self) -> bool {
        self.segments.len() == 2 && self.last_element() == "state"
    }
}

impl fmt::Display for SessionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, " {DELIMITER} ")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for SessionLabel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SessionLabel::parse(s))
    }
}

impl From<&str> for SessionLabel {
    fn from(s: &str) -> Self {
        SessionLabel::parse(s)
    }
}

/// Origin of a state report within the supervision tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportScope<'a> {
    /// Report of the runtime init; its children are slices.
    Runtime {
        /// Name of the runtime init.
        runtime: &'a str,
    },
    /// Report of an init nested inside `slice`.
    Slice {
        /// Name of the runtime init.
        runtime: &'a str,
        /// Slice owning the reporting init.
        slice: &'a str,
    },
}

impl ReportScope<'_> {
    /// Returns `true` if the report comes from the runtime itself.
    #[inline]
    pub fn is_runtime(&self) -> bool {
        matches!(self, ReportScope::Runtime { .. })
    }

    /// Owning slice for nested reports.
    pub fn slice(&self) -> Option<&str> {
        match self {
            ReportScope::Runtime { .. } => None,
            ReportScope::Slice { slice, .. } => Some(*slice),
        }
    }

    /// Slice to restart when the reported `child` fails.
    pub fn failure_slice<'c>(&'c self, child: &'c str) -> &'c str {
        match self {
            ReportScope::Runtime { .. } => child,
            ReportScope::Slice { slice, .. } => *slice,
        }
    }

    /// Failure label recorded for the reported `child`.
    pub fn failure_label(&self, child: &str) -> String {
        match self {
            ReportScope::Runtime { .. } => child.to_string(),
            ReportScope::Slice { slice, .. } => format!("{slice} {DELIMITER} {child}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let label = SessionLabel::parse("runtime->vbox ->  state");
        assert_eq!(label.segments(), ["runtime", "vbox", "state"]);
        assert_eq!(label.to_string(), "runtime -> vbox -> state");
        assert_eq!(label.last_element(), "state");
        assert_eq!(label.prefix().to_string(), "runtime -> vbox");
        assert_eq!(label, SessionLabel::parse("runtime -> vbox -> state"));
        assert!(SessionLabel::parse("").is_empty());
    }

    #[test]
    fn test_scope_runtime() {
        let label = SessionLabel::parse("runtime -> state");
        let scope = label.scope();
        assert_eq!(scope, ReportScope::Runtime { runtime: "runtime" });
        assert_eq!(scope.failure_slice("fs"), "fs");
        assert_eq!(scope.failure_label("fs"), "fs");
        assert!(label.is_runtime_state());
    }

    #[test]
    fn test_scope_slice() {
        let label = SessionLabel::parse("runtime -> vbox -> state");
        let scope = label.scope();
        assert_eq!(scope.slice(), Some("vbox"));
        assert_eq!(scope.failure_slice("vfs"), "vbox");
        assert_eq!(scope.failure_label("vfs"), "vbox -> vfs");
        assert!(!label.is_runtime_state());
    }

    #[test]
    fn test_scope_deeply_nested() {
        let label = SessionLabel::parse("runtime -> vbox -> init -> sub -> state");
        let scope = label.scope();
        assert_eq!(
            scope,
            ReportScope::Slice {
                runtime: "runtime",
                slice: "vbox"
            }
        );
        assert_eq!(scope.failure_label("log"), "vbox -> log");
    }

    #[test]
    fn test_starts_with() {
        let label = SessionLabel::parse("vbox -> init -> log");
        assert!(label.starts_with(&SessionLabel::parse("vbox")));
        assert!(label.starts_with(&SessionLabel::parse("vbox -> init")));
        assert!(!label.starts_with(&SessionLabel::parse("vbox2")));
    }
}
