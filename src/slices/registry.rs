//! # Slice registry - insertion-ordered set of slices.
//!
//! The registry is owned by the [`Detector`](crate::detector::Detector) and
//! tracks one [`Slice`] per `<start>` entry of the current init configuration.
//!
//! ## Lifecycle
//! ```text
//! config refresh ──► remove_outdated(config)   drop slices no longer started
//!                └─► add(start) per <start>     find or create, never merge
//! state report   ──► mark_restart(name, label, kind)
//!                       ├─ exact name match     ─► slice.mark_restart
//!                       ├─ label below a slice  ─► slice.mark_restart
//!                       └─ no match             ─► UnknownComponent
//! ```
//!
//! ## Rules
//! - Names are unique.
//! - Iteration order is insertion order (reports are reproducible).
//! - Removal drops the slice; callers re-resolve by name afterwards.

use crate::error::MonitorError;
use crate::label::SessionLabel;
use crate::xml::XmlNode;

use super::slice::{Failure, Slice};

/// Owning, insertion-ordered collection of slices.
#[derive(Debug, Default)]
pub struct SliceRegistry {
    slices: Vec<Slice>,
}

impl SliceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slice for the `name` attribute of a `<start>` node,
    /// creating it on first sight.
    pub fn add(&mut self, start: &XmlNode<'_>) -> &mut Slice {
        self.add_named(start.attribute("name").unwrap_or(""))
    }

    /// Returns the slice called `name`, creating it on first sight.
    pub fn add_named(&mut self, name: &str) -> &mut Slice {
        let idx = match self.position(name) {
            Some(idx) => idx,
            None => {
                self.slices.push(Slice::new(name));
                self.slices.len() - 1
            }
        };
        &mut self.slices[idx]
    }

    /// Slice called `name`.
    pub fn find(&self, name: &str) -> Option<&Slice> {
        self.slices.iter().find(|s| s.name() == name)
    }

    /// Mutable slice called `name`.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut Slice> {
        self.slices.iter_mut().find(|s| s.name() == name)
    }

    /// Drops every slice not started by `config`.
    ///
    /// Returns the names of the removed slices.
    pub fn remove_outdated(&mut self, config: &XmlNode<'_>) -> Vec<String> {
        let mut removed = Vec::new();
        self.slices.retain(|slice| {
            let started = config
                .sub_nodes("start")
                .any(|start| start.attribute("name") == Some(slice.name()));
            if !started {
                removed.push(slice.name().to_string());
            }
            started
        });
        removed
    }

    /// Returns `true` if any slice has a pending restart.
    pub fn restart_required(&self) -> bool {
        self.slices.iter().any(Slice::restart_pending)
    }

    /// Records a failure of `label` for slice `name`.
    ///
    /// Falls back to the slice that contains `label` as its first segment.
    /// Unknown components are reported as an error and otherwise ignored.
    pub fn mark_restart(
        &mut self,
        name: &str,
        label: &str,
        kind: Failure,
    ) -> Result<(), MonitorError> {
        if let Some(idx) = self.position(name) {
            self.slices[idx].mark_restart(label, kind);
            return Ok(());
        }

        let parsed = SessionLabel::parse(label);
        let containing = self
            .slices
            .iter_mut()
            .find(|slice| parsed.starts_with(&SessionLabel::parse(slice.name())));

        match containing {
            Some(slice) => {
                slice.mark_restart(label, kind);
                Ok(())
            }
            None => Err(MonitorError::UnknownComponent {
                label: label.to_string(),
            }),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Slices in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Slice> {
        self.slices.iter()
    }

    /// Mutable slices in insertion order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Slice> {
        self.slices.iter_mut()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.slices.iter().position(|s| s.name() == name)
    }
}

impl<'r> IntoIterator for &'r SliceRegistry {
    type Item = &'r Slice;
    type IntoIter = std::slice::Iter<'r, Slice>;

    fn into_iter(self) -> Self::IntoIter {
        self.slices.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(names: &[&str]) -> String {
        let mut out = String::from("<config>");
        for name in names {
            out.push_str(&format!("<start name=\"{name}\"/>"));
        }
        out.push_str("</config>");
        out
    }

    #[test]
    fn test_add_is_idempotent_and_ordered() {
        let text = config(&["fs", "vbox", "fs"]);
        let root = XmlNode::parse(&text).unwrap();
        let mut slices = SliceRegistry::new();
        for start in root.sub_nodes("start") {
            slices.add(start);
        }

        let names: Vec<&str> = slices.iter().map(Slice::name).collect();
        assert_eq!(names, ["fs", "vbox"]);
    }

    #[test]
    fn test_find_missing_is_none() {
        let slices = SliceRegistry::new();
        assert!(slices.find("fs").is_none());
    }

    #[test]
    fn test_remove_outdated() {
        let mut slices = SliceRegistry::new();
        slices.add_named("fs");
        slices.add_named("vbox");
        slices.add_named("nic");

        let text = config(&["vbox"]);
        let root = XmlNode::parse(&text).unwrap();
        let removed = slices.remove_outdated(&root);

        assert_eq!(removed, ["fs", "nic"]);
        assert!(slices.find("fs").is_none());
        assert!(slices.find("nic").is_none());
        assert!(slices.find("vbox").is_some());
        assert_eq!(slices.len(), 1);
    }

    #[test]
    fn test_restart_required() {
        let mut slices = SliceRegistry::new();
        slices.add_named("fs");
        assert!(!slices.restart_required());

        slices.mark_restart("fs", "fs", Failure::CpuFault).unwrap();
        assert!(slices.restart_required());

        slices.find_mut("fs").unwrap().update_internal_version();
        assert!(!slices.restart_required());
    }

    #[test]
    fn test_mark_restart_by_containing_label() {
        let mut slices = SliceRegistry::new();
        slices.add_named("vbox");

        slices
            .mark_restart("init", "vbox -> init -> log", Failure::CapsRequest)
            .unwrap();

        let vbox = slices.find("vbox").unwrap();
        assert!(vbox.restart_pending());
        assert_eq!(
            vbox.failed_component("vbox -> init -> log").unwrap().caps_count,
            1
        );
    }

    #[test]
    fn test_mark_restart_unknown_component() {
        let mut slices = SliceRegistry::new();
        slices.add_named("vbox");

        let err = slices
            .mark_restart("nic", "nic -> driver", Failure::SegFault)
            .unwrap_err();

        assert_eq!(err.as_label(), "unknown_component");
        assert!(!slices.restart_required());
        // A slice whose name is merely a string prefix does not contain the label.
        assert!(
            slices
                .mark_restart("vbox2", "vbox2 -> vfs", Failure::SegFault)
                .is_err()
        );
    }
}
