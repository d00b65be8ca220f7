//! Runtime core: configuration, event loop and ingestion endpoint.
//!
//! The public API of this module is [`MonitorConfig`], [`MonitorBuilder`],
//! [`HeartbeatMonitor`], [`MonitorHandle`] and [`ReportSession`].
//!
//! Internal modules:
//! - [`monitor`]: sequential processing of reports and configurations;
//! - [`builder`]: wiring of bus, sink, detector and reporters;
//! - [`session`]: handles and report sessions feeding the event loop;
//! - [`shutdown`]: termination signal handling;
//! - [`config`]: monitor settings.

mod builder;
mod config;
mod monitor;
mod session;
mod shutdown;

pub use builder::MonitorBuilder;
pub use config::MonitorConfig;
pub use monitor::HeartbeatMonitor;
pub use session::{MonitorHandle, ReportSession};
