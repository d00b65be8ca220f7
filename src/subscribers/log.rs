//! # LogWriter: events rendered through the `log` facade.
//!
//! Detection results are warnings, infeasible reallocation is an error,
//! decisions are informational and runtime bookkeeping is debug output.
//!
//! ## Example output
//! ```text
//! WARN  unresponsive component 'vfs' in slice 'vbox', skipped heartbeats: 3
//! WARN  component 'fs' requested resource of type 'ram'
//! WARN  component 'fs', PD fault detected
//! INFO  restart of 'vbox' scheduled (heartbeat of 'vbox -> vfs')
//! INFO  init configuration regenerated: caps=600, ram=80M, attempts=1
//! ERROR unable to upgrade dynamic caps of 'dyn': total caps (50) less than total configured caps (100)
//! ```

use async_trait::async_trait;
use log::Level;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use crate::xml::NumberOfBytes;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Log level of an event kind.
pub(crate) fn level_of(kind: EventKind) -> Level {
    match kind {
        EventKind::HeartbeatSkipped
        | EventKind::ResourceRequested
        | EventKind::PdFault
        | EventKind::CpuFault
        | EventKind::UnknownComponent
        | EventKind::ElasticSliceMissing
        | EventKind::ReportRejected
        | EventKind::ConfigRejected
        | EventKind::SubscriberOverflow
        | EventKind::SubscriberPanicked => Level::Warn,
        EventKind::ReallocationInfeasible => Level::Error,
        EventKind::RestartScheduled
        | EventKind::ConfigRegenerated
        | EventKind::DynamicResourcesAssigned
        | EventKind::ShutdownRequested => Level::Info,
        EventKind::SessionOpened => Level::Debug,
    }
}

/// Where a detected failure lives, as written in log lines.
fn whereabouts(e: &Event) -> String {
    let component = e.component.as_deref().unwrap_or("unknown");
    match e.slice.as_deref() {
        Some(slice) => format!("'{component}' in slice '{slice}'"),
        None => format!("'{component}'"),
    }
}

fn render(e: &Event) -> String {
    let reason = e.reason.as_deref().unwrap_or("unknown");
    match e.kind {
        EventKind::HeartbeatSkipped => format!(
            "unresponsive component {}, skipped heartbeats: {}",
            whereabouts(e),
            e.count.unwrap_or(0)
        ),
        EventKind::ResourceRequested => format!(
            "component {} requested resource of type '{reason}'",
            whereabouts(e)
        ),
        EventKind::PdFault => format!("component {}, PD fault detected", whereabouts(e)),
        EventKind::CpuFault => format!("component {}, CPU fault detected", whereabouts(e)),
        EventKind::RestartScheduled => format!(
            "restart of '{}' scheduled ({reason} of '{}')",
            e.slice.as_deref().unwrap_or("unknown"),
            e.component.as_deref().unwrap_or("unknown")
        ),
        EventKind::ConfigRegenerated => format!(
            "init configuration regenerated: caps={}, ram={}, attempts={}",
            e.caps.unwrap_or(0),
            NumberOfBytes::new(e.ram.unwrap_or(0)),
            e.count.unwrap_or(1)
        ),
        EventKind::DynamicResourcesAssigned => {
            let mut line = format!(
                "dynamic resources of '{}' assigned:",
                e.slice.as_deref().unwrap_or("unknown")
            );
            if let Some(caps) = e.caps {
                line.push_str(&format!(" caps={caps}"));
            }
            if let Some(ram) = e.ram {
                line.push_str(&format!(" ram={}", NumberOfBytes::new(ram)));
            }
            line
        }
        EventKind::SessionOpened => format!(
            "report session '{}' opened, buffer size {}",
            e.component.as_deref().unwrap_or("unknown"),
            e.count.unwrap_or(0)
        ),
        EventKind::ShutdownRequested => "shutdown requested".to_string(),
        EventKind::SubscriberOverflow => format!(
            "subscriber '{}' dropped event: {reason}",
            e.component.as_deref().unwrap_or("unknown")
        ),
        EventKind::SubscriberPanicked => format!(
            "subscriber '{}' panicked: {reason}",
            e.component.as_deref().unwrap_or("unknown")
        ),
        // Rejections carry the full error message.
        EventKind::ReportRejected
        | EventKind::ConfigRejected
        | EventKind::UnknownComponent
        | EventKind::ReallocationInfeasible
        | EventKind::ElasticSliceMissing => reason.to_string(),
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        log::log!(level_of(e.kind), "{}", render(e));
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
