//! # Event subscribers for the heartbeat monitor.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Detector / ReportSession ── publish(Event) ──► Bus
//!                                                 │
//!                           HeartbeatMonitor::subscriber_listener
//!                                                 │
//!                                           SubscriberSet::emit
//!                                     ┌───────────┼───────────┐
//!                                     ▼           ▼           ▼
//!                                 LogWriter     Alerts      Custom
//! ```

mod log;
mod set;
mod subscribe;

pub use self::log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
