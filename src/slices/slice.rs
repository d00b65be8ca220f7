//! # Slice: one independently restartable unit.
//!
//! A [`Slice`] mirrors one `<start>` entry of the supervised init
//! configuration. It carries the restart bookkeeping and the resource ledger
//! the detector needs between two reports.
//!
//! ## Versions
//! ```text
//! deploy_version    externally supplied (the `version` attribute of <start>)
//! internal_version  +1 for every regeneration that consumed a restart mark
//! combined_version  deploy + internal, written back as the new `version`
//! ```
//!
//! The external init re-instantiates a child whenever its `version` changes,
//! so bumping `internal_version` is how a restart is requested.
//!
//! ## Rules
//! - `restart_pending` is set only by [`Slice::mark_restart`] and cleared only
//!   by [`Slice::update_internal_version`], which increments the version once.
//! - `combined_version` never decreases while the deploy version does not.
//! - Failure counters only grow; records are kept across restarts.

use crate::xml::NumberOfBytes;

/// Kind of failure detected for a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Failure {
    /// The child requested more capabilities.
    CapsRequest,
    /// The child caused a CPU fault.
    CpuFault,
    /// The child skipped too many heartbeats.
    Heartbeat,
    /// The child requested more RAM.
    RamRequest,
    /// The child's protection domain faulted.
    SegFault,
}

impl Failure {
    /// Returns a short stable label (snake_case) for use in logs/events.
    pub fn as_label(&self) -> &'static str {
        match self {
            Failure::CapsRequest => "caps_request",
            Failure::CpuFault => "cpu_fault",
            Failure::Heartbeat => "heartbeat",
            Failure::RamRequest => "ram_request",
            Failure::SegFault => "seg_fault",
        }
    }
}

/// Failure tallies of one child, identified by its full label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedComponent {
    /// Failure label (`child` or `slice -> child`).
    pub label: String,
    /// Capability requests.
    pub caps_count: u64,
    /// CPU faults.
    pub cpu_count: u64,
    /// Heartbeat failures.
    pub heartbeat_count: u64,
    /// RAM requests.
    pub ram_count: u64,
    /// Protection-domain faults.
    pub segfault_count: u64,
}

impl FailedComponent {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            caps_count: 0,
            cpu_count: 0,
            heartbeat_count: 0,
            ram_count: 0,
            segfault_count: 0,
        }
    }

    fn count(&mut self, kind: Failure) {
        let counter = match kind {
            Failure::CapsRequest => &mut self.caps_count,
            Failure::CpuFault => &mut self.cpu_count,
            Failure::Heartbeat => &mut self.heartbeat_count,
            Failure::RamRequest => &mut self.ram_count,
            Failure::SegFault => &mut self.segfault_count,
        };
        *counter += 1;
    }

    /// Counter for `kind`.
    pub fn count_of(&self, kind: Failure) -> u64 {
        match kind {
            Failure::CapsRequest => self.caps_count,
            Failure::CpuFault => self.cpu_count,
            Failure::Heartbeat => self.heartbeat_count,
            Failure::RamRequest => self.ram_count,
            Failure::SegFault => self.segfault_count,
        }
    }
}

/// Restart and resource bookkeeping of one `<start>` entry.
#[derive(Debug, Clone)]
pub struct Slice {
    name: String,
    deploy_version: u64,
    internal_version: u64,
    restart_pending: bool,
    configured_caps: u64,
    dynamic_caps: u64,
    configured_ram: NumberOfBytes,
    dynamic_ram: NumberOfBytes,
    failed: Vec<FailedComponent>,
}

impl Slice {
    /// Creates a slice with zeroed counters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deploy_version: 0,
            internal_version: 0,
            restart_pending: false,
            configured_caps: 0,
            dynamic_caps: 0,
            configured_ram: NumberOfBytes::default(),
            dynamic_ram: NumberOfBytes::default(),
            failed: Vec::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn deploy_version(&self) -> u64 {
        self.deploy_version
    }

    #[inline]
    pub fn internal_version(&self) -> u64 {
        self.internal_version
    }

    /// Restart count as observed from outside.
    #[inline]
    pub fn combined_version(&self) -> u64 {
        self.deploy_version + self.internal_version
    }

    #[inline]
    pub fn restart_pending(&self) -> bool {
        self.restart_pending
    }

    /// Overwrites the externally supplied version.
    pub fn update_deploy_version(&mut self, version: u64) {
        self.deploy_version = version;
    }

    /// Consumes a pending restart mark by bumping the internal version.
    ///
    /// Without a pending mark this is a no-op, so calling it again in the
    /// same regeneration pass cannot restart the slice twice.
    pub fn update_internal_version(&mut self) {
        if self.restart_pending {
            self.restart_pending = false;
            self.internal_version += 1;
        }
    }

    /// Records a failure of the child `label` and marks the slice for restart.
    pub fn mark_restart(&mut self, label: &str, kind: Failure) {
        let idx = match self.failed.iter().position(|f| f.label == label) {
            Some(idx) => idx,
            None => {
                self.failed.push(FailedComponent::new(label));
                self.failed.len() - 1
            }
        };
        self.failed[idx].count(kind);
        self.restart_pending = true;
    }

    /// Failure records in first-seen order.
    pub fn failed(&self) -> impl Iterator<Item = &FailedComponent> {
        self.failed.iter()
    }

    /// Failure record of the child `label`.
    pub fn failed_component(&self, label: &str) -> Option<&FailedComponent> {
        self.failed.iter().find(|f| f.label == label)
    }

    #[inline]
    pub fn configured_caps(&self) -> u64 {
        self.configured_caps
    }

    #[inline]
    pub fn set_configured_caps(&mut self, caps: u64) {
        self.configured_caps = caps;
    }

    #[inline]
    pub fn configured_ram(&self) -> NumberOfBytes {
        self.configured_ram
    }

    #[inline]
    pub fn set_configured_ram(&mut self, ram: NumberOfBytes) {
        self.configured_ram = ram;
    }

    /// Dynamically assigned caps, `0` if there is no override.
    ///
    /// At most one slice in a registry holds a non-zero value.
    #[inline]
    pub fn dynamic_caps(&self) -> u64 {
        self.dynamic_caps
    }

    #[inline]
    pub fn set_dynamic_caps(&mut self, caps: u64) {
        self.dynamic_caps = caps;
    }

    /// Dynamically assigned RAM, zero if there is no override.
    ///
    /// At most one slice in a registry holds a non-zero value.
    #[inline]
    pub fn dynamic_ram(&self) -> NumberOfBytes {
        self.dynamic_ram
    }

    #[inline]
    pub fn set_dynamic_ram(&mut self, ram: NumberOfBytes) {
        self.dynamic_ram = ram;
    }

    /// Caps actually handed out: the override if set, else the configured value.
    pub fn assigned_caps(&self) -> u64 {
        if self.dynamic_caps != 0 {
            self.dynamic_caps
        } else {
            self.configured_caps
        }
    }

    /// RAM actually handed out: the override if set, else the configured value.
    pub fn assigned_ram(&self) -> NumberOfBytes {
        if self.dynamic_ram.is_zero() {
            self.configured_ram
        } else {
            self.dynamic_ram
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_restart_counts_per_label() {
        let mut slice = Slice::new("vbox");
        slice.mark_restart("vbox -> vfs", Failure::RamRequest);
        slice.mark_restart("vbox -> vfs", Failure::RamRequest);
        slice.mark_restart("vbox -> init", Failure::Heartbeat);

        assert!(slice.restart_pending());
        assert_eq!(slice.failed().count(), 2);

        let vfs = slice.failed_component("vbox -> vfs").unwrap();
        assert_eq!(vfs.ram_count, 2);
        assert_eq!(vfs.heartbeat_count, 0);
        assert_eq!(slice.failed_component("vbox -> init").unwrap().heartbeat_count, 1);
    }

    #[test]
    fn test_internal_version_consumed_once() {
        let mut slice = Slice::new("fs");
        slice.update_deploy_version(4);
        slice.mark_restart("fs", Failure::CpuFault);

        slice.update_internal_version();
        slice.update_internal_version();

        assert_eq!(slice.internal_version(), 1);
        assert_eq!(slice.combined_version(), 5);
        assert!(!slice.restart_pending());
    }

    #[test]
    fn test_internal_version_without_mark_is_noop() {
        let mut slice = Slice::new("fs");
        slice.update_internal_version();
        assert_eq!(slice.internal_version(), 0);
    }

    #[test]
    fn test_failure_records_survive_restart() {
        // Records are retained after the restart they caused and keep counting.
        let mut slice = Slice::new("fs");
        slice.mark_restart("fs", Failure::SegFault);
        slice.update_internal_version();
        slice.mark_restart("fs", Failure::SegFault);
        slice.update_internal_version();

        assert_eq!(slice.internal_version(), 2);
        assert_eq!(slice.failed_component("fs").unwrap().segfault_count, 2);
    }

    #[test]
    fn test_assigned_prefers_override() {
        let mut slice = Slice::new("dyn");
        slice.set_configured_caps(100);
        slice.set_configured_ram(NumberOfBytes::new(1024));
        assert_eq!(slice.assigned_caps(), 100);
        assert_eq!(slice.assigned_ram().as_u64(), 1024);

        slice.set_dynamic_caps(700);
        slice.set_dynamic_ram(NumberOfBytes::new(4096));
        assert_eq!(slice.assigned_caps(), 700);
        assert_eq!(slice.assigned_ram().as_u64(), 4096);
    }
}
