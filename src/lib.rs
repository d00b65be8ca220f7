//! # heartvisor
//!
//! **Heartvisor** watches the state reports of a supervised init, detects
//! failing children and rewrites the init's configuration so the failed
//! slices are restarted. Spare RAM and capability quota can be handed to one
//! designated elastic slice on the way.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//!     │ ReportSession │   │ ReportSession │   │ MonitorHandle │
//!     │ runtime->state│   │ runtime->vbox │   │ init config   │
//!     └──────┬────────┘   └──────┬────────┘   └──────┬────────┘
//!            ▼                   ▼                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  HeartbeatMonitor::run (one input at a time)                      │
//! │  - Detector        (failures, restarts, init.config)              │
//! │    - SliceRegistry (per-slice versions, quota, failure tallies)   │
//! │    - Reallocator   (spare quota for the elastic slice)            │
//! │  - FreeResourcesReporter, InitStateMirror                         │
//! └──────┬────────────────────────────────────────────┬───────────────┘
//!        ▼                                            ▼
//! ┌──────────────────────────────┐   ┌────────────────────────────────┐
//! │ ReportSink                   │   │ Bus (broadcast events)         │
//! │ init.config   restart_info   │   │   └─► SubscriberSet            │
//! │ free_resources  init.state   │   │         └─► LogWriter, ...     │
//! └──────────────────────────────┘   └────────────────────────────────┘
//! ```
//!
//! ### Report cycle
//! ```text
//! state report ──► parse ──► per child: heartbeats, requests, faults
//!                               └─► mark_restart(slice, label, kind)
//!              ──► restart pending?    ─► regenerate init.config (version + 1)
//!              ──► else sibling report ─► reassign spare quota ─► regenerate
//!              ──► restart_info, free_resources, init.state
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                     |
//! |-------------------|----------------------------------------------------------|----------------------------------------|
//! | **Detection**     | Failure classification and restart decisions.            | [`Detector`], [`Failure`]              |
//! | **Bookkeeping**   | Slices, versions, quota and failure records.             | [`SliceRegistry`], [`Slice`]           |
//! | **Ingestion**     | Sessions feeding the sequential event loop.              | [`MonitorHandle`], [`ReportSession`]   |
//! | **Reports**       | Outbound reports through a pluggable sink.               | [`ReportSink`], [`MemorySink`]         |
//! | **Subscriber API**| Hook into detection and decision events.                 | [`Subscribe`], [`LogWriter`]           |
//! | **Errors**        | Typed, never fatal errors.                               | [`MonitorError`], [`SubmitError`]      |
//! | **Configuration** | Margins, thresholds, buffers, elastic slice.             | [`MonitorConfig`]                      |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use heartvisor::{LogWriter, MemorySink, MonitorBuilder, MonitorConfig, Subscribe};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sink = Arc::new(MemorySink::new());
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!
//!     let (monitor, handle) = MonitorBuilder::new(MonitorConfig::default())
//!         .with_sink(sink.clone())
//!         .with_subscribers(subs)
//!         .with_init_config(r#"<config><start name="fs" caps="100"/><start name="nic"/></config>"#)
//!         .build()?;
//!     let running = tokio::spawn(monitor.run(CancellationToken::new()));
//!
//!     let session = handle.open_session("runtime -> state");
//!     session
//!         .submit(br#"<state><child name="fs" cpu_fault="yes"/><child name="nic"/></state>"#)
//!         .await?;
//!     drop((session, handle));
//!
//!     let detector = running.await?;
//!     assert_eq!(detector.slices().find("fs").map(|s| s.combined_version()), Some(1));
//!     assert!(sink.latest("init.config").unwrap().contains(r#"<start name="fs" version="1""#));
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod label;
mod slices;
mod subscribers;
#[cfg(test)]
mod test_log;

pub mod detector;
pub mod reporters;
pub mod xml;

// ---- Public re-exports ----

pub use crate::core::{
    HeartbeatMonitor, MonitorBuilder, MonitorConfig, MonitorHandle, ReportSession,
};
pub use detector::{AssignedTotals, Detector};
pub use error::{MonitorError, SubmitError, XmlError};
pub use events::{Bus, Event, EventKind};
pub use label::{ReportScope, SessionLabel};
pub use reporters::{MemorySink, ReportSink};
pub use slices::{FailedComponent, Failure, Slice, SliceRegistry};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
