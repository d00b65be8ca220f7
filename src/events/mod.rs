//! Monitor events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the detector, the report sessions
//! and the event loop.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Detector`, `ReportSession`, `HeartbeatMonitor`.
//! - **Consumers**: `HeartbeatMonitor::subscriber_listener()` which fans out to
//!   the `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
