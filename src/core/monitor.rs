//! # HeartbeatMonitor: the event loop around the detector.
//!
//! The [`HeartbeatMonitor`] owns the [`Detector`] and the auxiliary reporters
//! and processes inputs strictly one after another, so the slice registry is
//! never touched concurrently and needs no lock.
//!
//! ## High-level architecture
//! ```text
//! ReportSession::submit ──┐
//! MonitorHandle::update ──┴──► mpsc<Input> ──► run() loop
//!                                                 │
//!     Input::State { label, report }              │
//!        ├─ UTF-8 check, parse ── error ─► ReportRejected (no state change)
//!        ├─ Detector::handle_state(state, label)
//!        ├─ FreeResourcesReporter::handle_state(state, label)
//!        └─ InitStateMirror::handle_state(raw, label)
//!     Input::InitConfig(text)
//!        └─ Detector::update_init_config(text) ── error ─► ConfigRejected
//!
//! Event flow:
//!   Detector ... ── publish(Event) ──► Bus ──► run() loop ──► SubscriberSet::emit(&Event)
//!
//! Exit:
//!   every handle dropped │ token cancelled │ OS signal (ShutdownRequested)
//!       └─► pending events forwarded ─► SubscriberSet::shutdown() ─► Detector returned
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::detector::Detector;
use crate::error::MonitorError;
use crate::events::{Bus, Event, EventKind};
use crate::label::SessionLabel;
use crate::reporters::{FreeResourcesReporter, InitStateMirror};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::xml::XmlNode;

use super::session::Input;
use super::shutdown;

/// Sequential processor of state reports and init configurations.
pub struct HeartbeatMonitor {
    detector: Detector,
    free_resources: FreeResourcesReporter,
    init_state: InitStateMirror,
    bus: Bus,
    events: broadcast::Receiver<Event>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    inputs: mpsc::Receiver<Input>,
}

impl HeartbeatMonitor {
    pub(crate) fn new(
        detector: Detector,
        free_resources: FreeResourcesReporter,
        init_state: InitStateMirror,
        bus: Bus,
        events: broadcast::Receiver<Event>,
        subscribers: Vec<Arc<dyn Subscribe>>,
        inputs: mpsc::Receiver<Input>,
    ) -> Self {
        Self {
            detector,
            free_resources,
            init_state,
            bus,
            events,
            subscribers,
            inputs,
        }
    }

    /// The detector, for inspection before the loop starts.
    #[inline]
    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    /// Processes inputs until every handle is dropped, `token` is cancelled
    /// or the process receives a termination signal.
    ///
    /// Returns the detector with its final bookkeeping.
    pub async fn run(mut self, token: CancellationToken) -> Detector {
        let subs = SubscriberSet::new(std::mem::take(&mut self.subscribers), self.bus.clone());

        let signal = shutdown::wait_for_shutdown_signal();
        tokio::pin!(signal);
        let mut signals_armed = true;

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                res = &mut signal, if signals_armed => match res {
                    Ok(()) => {
                        self.bus.publish(Event::new(EventKind::ShutdownRequested));
                        break;
                    }
                    Err(e) => {
                        log::warn!("unable to listen for termination signals: {e}");
                        signals_armed = false;
                    }
                },
                ev = self.events.recv() => self.forward(&subs, ev),
                input = self.inputs.recv() => match input {
                    Some(input) => self.process(input),
                    None => break,
                },
            }
        }

        // Deliver what the last inputs published before stopping the workers.
        loop {
            match self.events.try_recv() {
                Ok(ev) => subs.emit(&ev),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    log::warn!("event loop lagged behind the bus, {n} events lost");
                }
                Err(_) => break,
            }
        }
        subs.shutdown().await;

        self.detector
    }

    fn forward(&self, subs: &SubscriberSet, ev: Result<Event, broadcast::error::RecvError>) {
        match ev {
            Ok(ev) => subs.emit(&ev),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                log::warn!("event loop lagged behind the bus, {n} events lost");
            }
            // The monitor holds a sender itself.
            Err(broadcast::error::RecvError::Closed) => {}
        }
    }

    pub(crate) fn process(&mut self, input: Input) {
        match input {
            Input::State { label, report } => self.handle_report(&label, &report),
            Input::InitConfig(text) => {
                if let Err(e) = self.detector.update_init_config(&text) {
                    log::debug!("init configuration update rejected: {}", e.as_label());
                }
            }
        }
    }

    fn handle_report(&mut self, label: &SessionLabel, report: &[u8]) {
        let Ok(text) = std::str::from_utf8(report) else {
            self.reject(MonitorError::InvalidUtf8 {
                label: label.to_string(),
            });
            return;
        };
        let text = text.trim_end_matches('\0');
        let state = match XmlNode::parse(text) {
            Ok(state) => state,
            Err(source) => {
                self.reject(MonitorError::MalformedReport {
                    label: label.to_string(),
                    source,
                });
                return;
            }
        };

        self.detector.handle_state(&state, label);
        if let Err(e) = self.free_resources.handle_state(&state, label) {
            log::error!("unable to write free resources: {e}");
        }
        self.init_state.handle_state(text, label);
    }

    fn reject(&self, err: MonitorError) {
        log::warn!("{err}, report ignored");
        self.bus.publish(Event::from_error(&err));
    }
}
