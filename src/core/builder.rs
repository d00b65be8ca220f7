use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{
    core::MonitorConfig,
    detector::Detector,
    error::MonitorError,
    events::Bus,
    reporters::{FreeResourcesReporter, InitStateMirror, MemorySink, ReportSink},
    subscribers::Subscribe,
};

use super::{
    monitor::HeartbeatMonitor,
    session::MonitorHandle,
};

/// Builder for constructing a [`HeartbeatMonitor`] and its [`MonitorHandle`].
pub struct MonitorBuilder {
    cfg: MonitorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    sink: Option<Arc<dyn ReportSink>>,
    init_config: Option<String>,
}

impl MonitorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: MonitorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            sink: None,
            init_config: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive detection and decision events through dedicated
    /// workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets where outbound reports are written.
    ///
    /// Defaults to a fresh [`MemorySink`].
    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the initial init configuration, regenerated on build.
    pub fn with_init_config(mut self, text: impl Into<String>) -> Self {
        self.init_config = Some(text.into());
        self
    }

    /// Builds the monitor and a handle to feed it.
    ///
    /// Does not need a runtime; subscriber workers start with
    /// [`HeartbeatMonitor::run`]. Fails only if the initial init
    /// configuration is malformed.
    pub fn build(self) -> Result<(HeartbeatMonitor, MonitorHandle), MonitorError> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let events = bus.subscribe();
        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(MemorySink::new()) as Arc<dyn ReportSink>);

        let mut detector = Detector::new(&self.cfg, sink.clone(), bus.clone());
        if let Some(text) = &self.init_config {
            detector.update_init_config(text)?;
        }

        let (tx, rx) = mpsc::channel(self.cfg.input_capacity_clamped());
        let monitor = HeartbeatMonitor::new(
            detector,
            FreeResourcesReporter::new(self.cfg.report_buffer_size, sink.clone()),
            InitStateMirror::new(sink),
            bus.clone(),
            events,
            self.subscribers,
            rx,
        );
        let handle = MonitorHandle::new(tx, bus, self.cfg.session_buffer_size);
        Ok((monitor, handle))
    }
}
