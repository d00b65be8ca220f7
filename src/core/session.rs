//! # Report ingestion endpoint.
//!
//! [`MonitorHandle`] is the cloneable front door of a running
//! [`HeartbeatMonitor`](super::HeartbeatMonitor). Every supervised init that
//! reports its state opens one [`ReportSession`] under its session label and
//! submits the raw report bytes through it.
//!
//! ```text
//! MonitorHandle::open_session(label) ──► ReportSession { label, buffer_size }
//!                                              │
//!   submit(bytes) / try_submit(bytes)          │ truncate to buffer_size
//!                                              ▼
//!                                 mpsc ──► HeartbeatMonitor::run (one at a time)
//! ```
//!
//! ## Rules
//! - Reports are truncated to the session buffer size, never rejected for size.
//! - Decoding happens in the event loop; a malformed report never fails `submit`.
//! - `submit` waits for queue space, `try_submit` fails with [`SubmitError::Full`].

use tokio::sync::{broadcast, mpsc};

use crate::error::SubmitError;
use crate::events::{Bus, Event, EventKind};
use crate::label::SessionLabel;

/// Work item of the event loop.
#[derive(Debug)]
pub(crate) enum Input {
    /// Raw state report submitted under `label`.
    State { label: SessionLabel, report: Vec<u8> },
    /// New init configuration.
    InitConfig(String),
}

/// Cloneable handle to a running monitor.
///
/// The monitor's event loop ends once every handle and session is dropped.
#[derive(Clone)]
pub struct MonitorHandle {
    tx: mpsc::Sender<Input>,
    bus: Bus,
    session_buffer_size: usize,
}

impl MonitorHandle {
    pub(crate) fn new(tx: mpsc::Sender<Input>, bus: Bus, session_buffer_size: usize) -> Self {
        Self {
            tx,
            bus,
            session_buffer_size,
        }
    }

    /// Opens a report session for the init reporting under `label`.
    pub fn open_session(&self, label: impl Into<SessionLabel>) -> ReportSession {
        let label = label.into();
        self.bus.publish(
            Event::new(EventKind::SessionOpened)
                .with_component(label.to_string())
                .with_count(self.session_buffer_size as u64),
        );
        ReportSession {
            label,
            tx: self.tx.clone(),
            buffer_size: self.session_buffer_size,
        }
    }

    /// Delivers a new init configuration to the detector.
    pub async fn update_init_config(&self, text: impl Into<String>) -> Result<(), SubmitError> {
        self.tx
            .send(Input::InitConfig(text.into()))
            .await
            .map_err(|_| SubmitError::Closed)
    }

    /// Receives every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }
}

/// Report channel of one supervised init.
pub struct ReportSession {
    label: SessionLabel,
    tx: mpsc::Sender<Input>,
    buffer_size: usize,
}

impl ReportSession {
    #[inline]
    pub fn label(&self) -> &SessionLabel {
        &self.label
    }

    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Queues `report`, waiting for space in the input queue.
    pub async fn submit(&self, report: &[u8]) -> Result<(), SubmitError> {
        self.tx
            .send(self.input(report))
            .await
            .map_err(|_| SubmitError::Closed)
    }

    /// Queues `report` without waiting.
    pub fn try_submit(&self, report: &[u8]) -> Result<(), SubmitError> {
        self.tx.try_send(self.input(report)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SubmitError::Full,
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
        })
    }

    fn input(&self, report: &[u8]) -> Input {
        let len = report.len().min(self.buffer_size);
        Input::State {
            label: self.label.clone(),
            report: report[..len].to_vec(),
        }
    }
}
