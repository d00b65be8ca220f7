//! # Events emitted by the monitor engine.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Detection events**: failures found in a state report (heartbeats, requests, faults)
//! - **Decision events**: restarts scheduled, configurations regenerated, quota assigned
//! - **Rejection events**: inputs or requests that were dropped (malformed, unknown, infeasible)
//! - **Runtime events**: sessions, shutdown and subscriber health
//!
//! The [`Event`] struct carries the metadata: timestamps, slice and component
//! names, reasons and counters.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use heartvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::HeartbeatSkipped)
//!     .with_slice("vbox")
//!     .with_component("vfs")
//!     .with_count(3);
//!
//! assert_eq!(ev.kind, EventKind::HeartbeatSkipped);
//! assert_eq!(ev.slice.as_deref(), Some("vbox"));
//! assert_eq!(ev.count, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::error::MonitorError;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of monitor events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Detection events ===
    /// A child reported skipped heartbeats (any count above zero).
    ///
    /// Sets:
    /// - `component`: child name
    /// - `slice`: owning slice (nested reports only)
    /// - `count`: skipped heartbeats
    HeartbeatSkipped,

    /// A child requested more quota.
    ///
    /// Sets:
    /// - `component`: child name
    /// - `slice`: owning slice (nested reports only)
    /// - `reason`: resource type (`ram`, `caps`, ...)
    ResourceRequested,

    /// A child's protection domain faulted.
    ///
    /// Sets:
    /// - `component`: child name
    /// - `slice`: owning slice (nested reports only)
    PdFault,

    /// A child caused a CPU fault.
    ///
    /// Sets:
    /// - `component`: child name
    /// - `slice`: owning slice (nested reports only)
    CpuFault,

    // === Decision events ===
    /// A slice was marked for restart.
    ///
    /// Sets:
    /// - `slice`: slice to restart
    /// - `component`: failure label
    /// - `reason`: failure kind
    RestartScheduled,

    /// The init configuration was regenerated.
    ///
    /// Sets:
    /// - `count`: generation attempts (more than one after buffer growth)
    /// - `caps`, `ram`: total assigned quota over all slices
    ConfigRegenerated,

    /// Spare quota was assigned to the elastic slice.
    ///
    /// Sets:
    /// - `slice`: elastic slice
    /// - `caps` and/or `ram`: new dynamic quota
    DynamicResourcesAssigned,

    // === Rejection events ===
    /// A state report was dropped at the boundary (malformed or not UTF-8).
    ///
    /// Sets:
    /// - `component`: session label
    /// - `reason`: error message
    ReportRejected,

    /// An init configuration was dropped (malformed); the previous one stays.
    ///
    /// Sets:
    /// - `reason`: error message
    ConfigRejected,

    /// A restart was requested for a component no slice contains.
    ///
    /// Sets:
    /// - `component`: failure label
    UnknownComponent,

    /// Spare quota could not be computed (less available than committed).
    ///
    /// Sets:
    /// - `slice`: elastic slice
    /// - `reason`: error message
    ReallocationInfeasible,

    /// The elastic slice is configured but not started.
    ///
    /// Sets:
    /// - `slice`: elastic slice
    ElasticSliceMissing,

    // === Runtime events ===
    /// A report session was opened.
    ///
    /// Sets:
    /// - `component`: session label
    /// - `count`: session buffer size
    SessionOpened,

    /// Shutdown requested (OS signal observed).
    ShutdownRequested,

    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `component`: subscriber name
    /// - `reason`: panic info
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `component`: subscriber name
    /// - `reason`: `full` or `closed`
    SubscriberOverflow,
}

/// Monitor event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Slice the event concerns.
    pub slice: Option<Arc<str>>,
    /// Child name, failure label or session label.
    pub component: Option<Arc<str>>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
    /// Counter payload (skipped heartbeats, attempts, buffer size).
    pub count: Option<u64>,
    /// Capability quota payload.
    pub caps: Option<u64>,
    /// RAM quota payload in bytes.
    pub ram: Option<u64>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            slice: None,
            component: None,
            reason: None,
            count: None,
            caps: None,
            ram: None,
        }
    }

    /// Creates the rejection event matching a [`MonitorError`].
    pub fn from_error(err: &MonitorError) -> Self {
        let ev = match err {
            MonitorError::MalformedReport { label, .. } | MonitorError::InvalidUtf8 { label } => {
                Event::new(EventKind::ReportRejected).with_component(label.as_str())
            }
            MonitorError::MalformedConfig { .. } => Event::new(EventKind::ConfigRejected),
            MonitorError::ResourcesInfeasible { slice, .. } => {
                Event::new(EventKind::ReallocationInfeasible).with_slice(slice.as_str())
            }
            MonitorError::UnknownComponent { label } => {
                Event::new(EventKind::UnknownComponent).with_component(label.as_str())
            }
            MonitorError::ElasticSliceMissing { slice } => {
                Event::new(EventKind::ElasticSliceMissing).with_slice(slice.as_str())
            }
        };
        ev.with_reason(err.as_message())
    }

    /// Attaches a slice name.
    #[inline]
    pub fn with_slice(mut self, slice: impl Into<Arc<str>>) -> Self {
        self.slice = Some(slice.into());
        self
    }

    /// Attaches a component name or label.
    #[inline]
    pub fn with_component(mut self, component: impl Into<Arc<str>>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a counter.
    #[inline]
    pub fn with_count(mut self, n: u64) -> Self {
        self.count = Some(n);
        self
    }

    /// Attaches a capability quota.
    #[inline]
    pub fn with_caps(mut self, caps: u64) -> Self {
        self.caps = Some(caps);
        self
    }

    /// Attaches a RAM quota in bytes.
    #[inline]
    pub fn with_ram(mut self, ram: u64) -> Self {
        self.ram = Some(ram);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_component(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_component(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}
