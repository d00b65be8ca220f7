//! # Failure detector.
//!
//! The [`Detector`] owns the [`SliceRegistry`] and turns inbound state reports
//! and init configurations into restart decisions and a regenerated init
//! configuration.
//!
//! ## State report cycle
//! ```text
//! handle_state(state, label)
//!   ├─ ≤ 1 sub-node ─────────────────────────► return (no side effects)
//!   ├─ per <child>:
//!   │    skipped_heartbeats > 0   ─► HeartbeatSkipped; ≥ threshold ─► mark Heartbeat
//!   │    sub-node with requested  ─► ResourceRequested, mark Ram/CapsRequest
//!   │    pd_fault                 ─► PdFault, mark SegFault
//!   │    cpu_fault                ─► CpuFault, mark CpuFault
//!   ├─ restart required ─────────────────────► regenerate
//!   ├─ else label == sibling report label:
//!   │    elastic slice known ─► assign spare quota ─► regenerate if changed
//!   │    elastic slice missing ─► ElasticSliceMissing, regenerate
//!   └─ restart_info report
//! ```
//!
//! ## Regeneration
//! ```text
//! remove_outdated(config)
//! per <start>: add slice, track configured quota, apply deploy version,
//!              consume restart mark                     (bookkeeping pass)
//! init.config ◄── generate(...)                         (pure, may repeat)
//! totals      ◄── sum of assigned quota                 (after generation)
//! ```
//!
//! ## Rules
//! - The generation callback only reads the registry; bookkeeping happens
//!   before it, totals after it, so a buffer retry changes nothing.
//! - A malformed init configuration is rejected and the last valid one kept.
//! - No anomaly is fatal: each one becomes an event and the cycle goes on.

use std::sync::Arc;

use crate::core::MonitorConfig;
use crate::error::{MonitorError, XmlError};
use crate::events::{Bus, Event, EventKind};
use crate::label::{ReportScope, SessionLabel};
use crate::reporters::{ReportSink, RestartReporter};
use crate::slices::{Failure, Slice, SliceRegistry};
use crate::xml::{NumberOfBytes, Reporter, XmlGenerator, XmlNode};

use super::resources::{Reallocator, ram_of_start_node};

/// Report name of the regenerated init configuration.
pub const INIT_CONFIG: &str = "init.config";

/// Elastic slice and the label of the report that drives its quota.
#[derive(Debug, Clone)]
struct Elastic {
    slice: String,
    sibling: SessionLabel,
}

/// Quota handed out to all slices after the last regeneration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignedTotals {
    pub caps: u64,
    pub ram: NumberOfBytes,
}

/// Decision engine between state reports and the init configuration.
pub struct Detector {
    heartbeat_threshold: u64,
    init_config: Option<String>,
    init_config_reporter: Reporter,
    restart_reporter: RestartReporter,
    slices: SliceRegistry,
    reallocator: Reallocator,
    elastic: Option<Elastic>,
    totals: AssignedTotals,
    regenerations: u64,
    bus: Bus,
}

impl Detector {
    /// Creates a detector writing its reports into `sink`.
    ///
    /// No configuration is generated until the first init configuration
    /// arrives through [`Detector::update_init_config`].
    pub fn new(config: &MonitorConfig, sink: Arc<dyn ReportSink>, bus: Bus) -> Self {
        let elastic = match (config.elastic_slice(), config.sibling_report_label()) {
            (Some(slice), Some(sibling)) => Some(Elastic {
                slice: slice.to_string(),
                sibling,
            }),
            _ => None,
        };

        Self {
            heartbeat_threshold: config.heartbeat_threshold,
            init_config: None,
            init_config_reporter: Reporter::new(
                INIT_CONFIG,
                "config",
                config.config_buffer_size,
                sink.clone(),
            ),
            restart_reporter: RestartReporter::new(config.report_buffer_size, sink),
            slices: SliceRegistry::new(),
            reallocator: Reallocator::new(config.caps_margin, config.ram_margin),
            elastic,
            totals: AssignedTotals::default(),
            regenerations: 0,
            bus,
        }
    }

    /// Slice bookkeeping.
    #[inline]
    pub fn slices(&self) -> &SliceRegistry {
        &self.slices
    }

    /// Quota assigned to all slices by the last regeneration.
    #[inline]
    pub fn assigned_totals(&self) -> AssignedTotals {
        self.totals
    }

    /// Number of successful regenerations so far.
    #[inline]
    pub fn regenerations(&self) -> u64 {
        self.regenerations
    }

    /// The last accepted init configuration.
    pub fn init_config(&self) -> Option<&str> {
        self.init_config.as_deref()
    }

    /// Accepts a new init configuration and regenerates the output from it.
    ///
    /// A configuration that does not parse is rejected; the previous one
    /// stays in effect.
    pub fn update_init_config(&mut self, text: &str) -> Result<(), MonitorError> {
        if let Err(source) = XmlNode::parse(text) {
            let err = MonitorError::MalformedConfig { source };
            log::warn!("{err}, keeping the previous configuration");
            self.bus.publish(Event::from_error(&err));
            return Err(err);
        }
        self.init_config = Some(text.to_string());
        self.regenerate();
        Ok(())
    }

    /// Evaluates one state report received under `label`.
    pub fn handle_state(&mut self, state: &XmlNode<'_>, label: &SessionLabel) {
        if state.num_sub_nodes() <= 1 {
            return;
        }

        let scope = label.scope();
        for child in state.sub_nodes("child") {
            self.inspect_child(child, &scope);
        }

        if self.slices.restart_required() {
            self.regenerate();
        } else if let Some(elastic) = self.elastic.clone() {
            if *label == elastic.sibling && !self.slices.is_empty() {
                self.reallocate(state, &elastic);
            }
        }

        if let Err(e) = self.restart_reporter.report_state(&self.slices) {
            log::error!("unable to write restart info: {e}");
        }
    }

    fn inspect_child(&mut self, child: &XmlNode<'_>, scope: &ReportScope<'_>) {
        let name = child.attribute("name").unwrap_or("");
        let slice = scope.failure_slice(name);
        let label = scope.failure_label(name);

        let detected = |kind: EventKind| {
            let ev = Event::new(kind).with_component(name);
            match scope.slice() {
                Some(slice) => ev.with_slice(slice),
                None => ev,
            }
        };

        let skipped: u64 = child.attribute_value("skipped_heartbeats", 0);
        if skipped > 0 {
            log::warn!("'{label}' skipped {skipped} heartbeats");
            self.bus
                .publish(detected(EventKind::HeartbeatSkipped).with_count(skipped));
            if skipped >= self.heartbeat_threshold {
                self.mark_restart(slice, &label, Failure::Heartbeat);
            }
        }

        for resource in child.children().filter(|r| r.has_attribute("requested")) {
            log::warn!("'{label}' requested more {}", resource.node_type());
            self.bus.publish(
                detected(EventKind::ResourceRequested).with_reason(resource.node_type()),
            );
            self.mark_restart(slice, &label, request_kind(resource));
        }

        if child.attribute_bool("pd_fault", false) {
            log::warn!("'{label}' caused a page fault");
            self.bus.publish(detected(EventKind::PdFault));
            self.mark_restart(slice, &label, Failure::SegFault);
        }

        if child.attribute_bool("cpu_fault", false) {
            log::warn!("'{label}' caused a cpu fault");
            self.bus.publish(detected(EventKind::CpuFault));
            self.mark_restart(slice, &label, Failure::CpuFault);
        }
    }

    fn mark_restart(&mut self, slice: &str, label: &str, kind: Failure) {
        match self.slices.mark_restart(slice, label, kind) {
            Ok(()) => {
                log::info!("restart of '{slice}' scheduled, '{label}': {}", kind.as_label());
                self.bus.publish(
                    Event::new(EventKind::RestartScheduled)
                        .with_slice(slice)
                        .with_component(label)
                        .with_reason(kind.as_label()),
                );
            }
            Err(e) => {
                log::warn!("{e}, restart request dropped");
                self.bus.publish(Event::from_error(&e));
            }
        }
    }

    fn reallocate(&mut self, state: &XmlNode<'_>, elastic: &Elastic) {
        let Some(slice) = self.slices.find_mut(&elastic.slice) else {
            let err = MonitorError::ElasticSliceMissing {
                slice: elastic.slice.clone(),
            };
            log::warn!("{err}");
            self.bus.publish(Event::from_error(&err));
            self.regenerate();
            return;
        };
        let Some(text) = self.init_config.as_deref() else {
            return;
        };
        let Ok(config) = XmlNode::parse(text) else {
            return;
        };

        let outcome = self.reallocator.assign(state, &config, slice);
        if let Some(total) = &outcome.resources {
            log::info!("total resources of '{}': {}", elastic.sibling.prefix(), total);
        }
        for err in &outcome.errors {
            log::error!("{err}");
            self.bus.publish(Event::from_error(err));
        }
        if outcome.updated() {
            let mut ev =
                Event::new(EventKind::DynamicResourcesAssigned).with_slice(elastic.slice.as_str());
            if let Some(caps) = outcome.caps {
                ev = ev.with_caps(caps);
            }
            if let Some(ram) = outcome.ram {
                ev = ev.with_ram(ram.as_u64());
            }
            self.bus.publish(ev);
            self.regenerate();
        }
    }

    /// Rewrites the init configuration from the last accepted input.
    fn regenerate(&mut self) {
        let Some(text) = self.init_config.as_deref() else {
            log::debug!("no init configuration yet, skipping regeneration");
            return;
        };
        let root = match XmlNode::parse(text) {
            Ok(root) => root,
            Err(source) => {
                let err = MonitorError::MalformedConfig { source };
                log::error!("{err}");
                self.bus.publish(Event::from_error(&err));
                return;
            }
        };

        for name in self.slices.remove_outdated(&root) {
            log::debug!("slice '{name}' no longer started, dropped");
        }
        for start in root.sub_nodes("start") {
            let slice = self.slices.add(start);
            self.reallocator.observe(
                slice,
                start.attribute_value("caps", 0),
                ram_of_start_node(start),
            );
            slice.update_deploy_version(start.attribute_value("version", 0));
            slice.update_internal_version();

            if slice.dynamic_caps() != 0 {
                log::debug!(
                    "upgrade dynamic caps of '{}' from {} to {}",
                    slice.name(),
                    slice.configured_caps(),
                    slice.dynamic_caps()
                );
            }
            if !slice.dynamic_ram().is_zero() {
                log::debug!(
                    "upgrade dynamic ram of '{}' from {} to {}",
                    slice.name(),
                    slice.configured_ram(),
                    slice.dynamic_ram()
                );
            }
        }

        let slices = &self.slices;
        let generated = self.init_config_reporter.generate(|xml| {
            for (name, value) in root.attributes() {
                xml.attribute_raw(name, value)?;
            }
            for node in root.children() {
                match slices.find(node.attribute("name").unwrap_or("")) {
                    Some(slice) if node.has_type("start") => write_start(xml, node, slice)?,
                    _ => xml.append(node.raw())?,
                }
            }
            Ok(())
        });

        let invocations = match generated {
            Ok(invocations) => invocations,
            Err(e) => {
                log::error!("unable to generate init configuration: {e}");
                return;
            }
        };

        self.totals = self.slices.iter().fold(AssignedTotals::default(), |acc, slice| {
            AssignedTotals {
                caps: acc.caps.saturating_add(slice.assigned_caps()),
                ram: acc.ram + slice.assigned_ram(),
            }
        });
        self.regenerations += 1;
        log::info!(
            "total assigned resources: caps={}, ram={}",
            self.totals.caps,
            self.totals.ram
        );

        self.bus.publish(
            Event::new(EventKind::ConfigRegenerated)
                .with_count(invocations as u64)
                .with_caps(self.totals.caps)
                .with_ram(self.totals.ram.as_u64()),
        );
    }
}

/// Kind of restart caused by a `requested` resource node.
fn request_kind(resource: &XmlNode<'_>) -> Failure {
    if resource.has_type("ram") || resource.attribute("name") == Some("RAM") {
        Failure::RamRequest
    } else {
        Failure::CapsRequest
    }
}

/// Writes one `<start>` entry with the slice's version and quota.
fn write_start(xml: &mut XmlGenerator, start: &XmlNode<'_>, slice: &Slice) -> Result<(), XmlError> {
    let caps = slice.assigned_caps();

    xml.node("start", |xml| {
        xml.attribute("name", slice.name())?;
        xml.attribute("version", slice.combined_version())?;
        if caps > 0 {
            xml.attribute("caps", caps)?;
        }
        for (name, value) in start.attributes() {
            if !matches!(name, "name" | "version" | "caps") {
                xml.attribute_raw(name, value)?;
            }
        }

        let ram = slice.dynamic_ram();
        if ram.is_zero() {
            return xml.append(start.raw_content());
        }
        for sub in start.children() {
            if sub.has_type("resource") && sub.attribute("name") == Some("RAM") {
                xml.node("resource", |xml| {
                    xml.attribute("name", "RAM")?;
                    xml.attribute("quantum", ram)
                })?;
            } else {
                xml.append(sub.raw())?;
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast;

    use super::*;
    use crate::reporters::{MemorySink, RESTART_INFO};
    use crate::test_log;

    const MIB: u64 = 1024 * 1024;

    const CONFIG: &str = r#"<config verbose="yes">
        <report delay_ms="500"/>
        <start name="fs" version="2" caps="100" ld="no"><resource name="RAM" quantum="8M"/><provides/></start>
        <start name="x" caps="50"><resource name="RAM" quantum="4M"/></start>
    </config>"#;

    fn detector(config: MonitorConfig) -> (Detector, Arc<MemorySink>, broadcast::Receiver<Event>) {
        let sink = Arc::new(MemorySink::new());
        let bus = Bus::new(256);
        let rx = bus.subscribe();
        let mut detector = Detector::new(&config, sink.clone(), bus);
        detector.update_init_config(CONFIG).unwrap();
        (detector, sink, rx)
    }

    fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<EventKind> {
        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        kinds
    }

    fn handle(detector: &mut Detector, label: &str, state: &str) {
        let root = XmlNode::parse(state).unwrap();
        detector.handle_state(&root, &SessionLabel::parse(label));
    }

    fn start_of<'a>(config: &'a str, name: &str) -> &'a str {
        let open = format!("<start name=\"{name}\"");
        let begin = config.find(&open).unwrap();
        let end = config[begin..].find("</start>").unwrap();
        &config[begin..begin + end]
    }

    #[test]
    fn test_initial_regeneration() {
        let (detector, sink, _rx) = detector(MonitorConfig::default());

        assert_eq!(
            sink.latest(INIT_CONFIG).as_deref(),
            Some(
                "<config verbose=\"yes\"><report delay_ms=\"500\"/>\
                 <start name=\"fs\" version=\"2\" caps=\"100\" ld=\"no\"><resource name=\"RAM\" quantum=\"8M\"/><provides/></start>\
                 <start name=\"x\" version=\"0\" caps=\"50\"><resource name=\"RAM\" quantum=\"4M\"/></start>\
                 </config>"
            )
        );
        assert_eq!(detector.slices().len(), 2);
        assert_eq!(detector.slices().find("fs").unwrap().configured_caps(), 100);
        assert_eq!(
            detector.assigned_totals(),
            AssignedTotals {
                caps: 150,
                ram: NumberOfBytes::new(12 * MIB)
            }
        );
    }

    #[test]
    fn test_heartbeat_threshold() {
        let (mut detector, _sink, mut rx) = detector(MonitorConfig::default());
        drain(&mut rx);

        for skipped in [1, 2] {
            let state = format!(
                r#"<state><child name="fs" skipped_heartbeats="{skipped}"/><child name="x"/></state>"#
            );
            handle(&mut detector, "runtime -> state", &state);
            assert!(detector.slices().find("fs").unwrap().failed().next().is_none());
            assert_eq!(detector.regenerations(), 1);
        }
        assert_eq!(
            drain(&mut rx),
            [EventKind::HeartbeatSkipped, EventKind::HeartbeatSkipped]
        );

        handle(
            &mut detector,
            "runtime -> state",
            r#"<state><child name="fs" skipped_heartbeats="3"/><child name="x"/></state>"#,
        );

        let fs = detector.slices().find("fs").unwrap();
        assert_eq!(fs.failed_component("fs").unwrap().heartbeat_count, 1);
        assert_eq!(fs.combined_version(), 3);
        assert!(!fs.restart_pending());
        assert_eq!(detector.regenerations(), 2);
        assert_eq!(
            drain(&mut rx),
            [
                EventKind::HeartbeatSkipped,
                EventKind::RestartScheduled,
                EventKind::ConfigRegenerated
            ]
        );
    }

    #[test]
    fn test_cumulative_failure_kinds() {
        let (mut detector, _sink, _rx) = detector(MonitorConfig::default());

        handle(
            &mut detector,
            "runtime -> fs -> state",
            r#"<state>
                 <child name="vfs" pd_fault="yes" cpu_fault="true"><ram requested="yes"/></child>
                 <child name="log"/>
               </state>"#,
        );

        let fs = detector.slices().find("fs").unwrap();
        let vfs = fs.failed_component("fs -> vfs").unwrap();
        assert_eq!(vfs.segfault_count, 1);
        assert_eq!(vfs.cpu_count, 1);
        assert_eq!(vfs.ram_count, 1);
        assert_eq!(vfs.caps_count, 0);
        assert_eq!(vfs.heartbeat_count, 0);
        // Three failures in one burst restart the slice once.
        assert_eq!(fs.internal_version(), 1);
    }

    #[test]
    fn test_caps_request_kind() {
        let (mut detector, _sink, _rx) = detector(MonitorConfig::default());

        handle(
            &mut detector,
            "runtime -> state",
            r#"<state><child name="x"><caps requested="yes"/></child><child name="fs"/></state>"#,
        );

        let x = detector.slices().find("x").unwrap();
        assert_eq!(x.failed_component("x").unwrap().caps_count, 1);
    }

    #[test]
    fn test_end_to_end_nested_report() {
        let (mut detector, sink, _rx) = detector(MonitorConfig::default());

        handle(
            &mut detector,
            "root -> x -> state",
            r#"<state>
                 <ram quota="4M" avail="1M"/>
                 <caps quota="50" avail="10"/>
                 <child name="x" skipped_heartbeats="3"/>
               </state>"#,
        );

        let x = detector.slices().find("x").unwrap();
        assert_eq!(x.combined_version(), 1);
        assert!(!x.restart_pending());
        assert_eq!(x.failed_component("x -> x").unwrap().heartbeat_count, 1);

        let config = sink.latest(INIT_CONFIG).unwrap();
        assert!(start_of(&config, "x").starts_with("<start name=\"x\" version=\"1\""));
        assert!(start_of(&config, "fs").starts_with("<start name=\"fs\" version=\"2\""));

        let info = sink.latest(RESTART_INFO).unwrap();
        assert!(info.contains("<component name=\"x\" restarts=\"1\">"));
        assert!(info.contains("label=\"x -&gt; x\" skipped_heartbeats=\"1\""));
    }

    #[test]
    fn test_single_child_report_ignored() {
        let (mut detector, sink, mut rx) = detector(MonitorConfig::default());
        drain(&mut rx);

        handle(
            &mut detector,
            "root -> x -> state",
            r#"<state><child name="x" skipped_heartbeats="3"/></state>"#,
        );

        assert!(!detector.slices().restart_required());
        assert_eq!(detector.slices().find("x").unwrap().combined_version(), 0);
        assert_eq!(sink.writes(RESTART_INFO), 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_unknown_component_dropped() {
        let (mut detector, _sink, mut rx) = detector(MonitorConfig::default());
        drain(&mut rx);

        handle(
            &mut detector,
            "runtime -> state",
            r#"<state><child name="ghost" cpu_fault="yes"/><child name="fs"/></state>"#,
        );

        assert!(!detector.slices().restart_required());
        assert_eq!(detector.regenerations(), 1);
        assert_eq!(
            drain(&mut rx),
            [EventKind::CpuFault, EventKind::UnknownComponent]
        );
    }

    #[test]
    fn test_pruning_on_config_update() {
        let (mut detector, sink, _rx) = detector(MonitorConfig::default());

        detector
            .update_init_config(r#"<config><start name="x" caps="50"/></config>"#)
            .unwrap();

        assert!(detector.slices().find("fs").is_none());
        assert_eq!(detector.slices().len(), 1);
        assert_eq!(
            sink.latest(INIT_CONFIG).as_deref(),
            Some("<config><start name=\"x\" version=\"0\" caps=\"50\"/></config>")
        );
    }

    #[test]
    fn test_malformed_config_keeps_previous() {
        let (mut detector, sink, mut rx) = detector(MonitorConfig::default());
        drain(&mut rx);

        let err = detector
            .update_init_config("<config><start name=\"fs\">")
            .unwrap_err();

        assert_eq!(err.as_label(), "malformed_config");
        assert_eq!(detector.init_config(), Some(CONFIG));
        assert_eq!(detector.slices().len(), 2);
        assert_eq!(sink.writes(INIT_CONFIG), 1);
        assert_eq!(drain(&mut rx), [EventKind::ConfigRejected]);
    }

    #[test]
    fn test_regeneration_retry_does_not_double_totals() {
        let config = MonitorConfig {
            config_buffer_size: 16,
            ..MonitorConfig::default()
        };
        let (mut detector, sink, mut rx) = detector(config);

        let attempts = std::iter::from_fn(|| rx.try_recv().ok())
            .find(|ev| ev.kind == EventKind::ConfigRegenerated)
            .and_then(|ev| ev.count)
            .unwrap();
        assert!(attempts > 1);

        let expected = AssignedTotals {
            caps: 150,
            ram: NumberOfBytes::new(12 * MIB),
        };
        assert_eq!(detector.assigned_totals(), expected);
        assert_eq!(sink.writes(INIT_CONFIG), 1);

        // A restart regenerates again; totals and versions still move once.
        handle(
            &mut detector,
            "runtime -> state",
            r#"<state><child name="x" pd_fault="yes"/><child name="fs"/></state>"#,
        );
        assert_eq!(detector.assigned_totals(), expected);
        assert_eq!(detector.slices().find("x").unwrap().internal_version(), 1);
        assert_eq!(sink.writes(INIT_CONFIG), 2);
    }

    fn elastic_config() -> MonitorConfig {
        MonitorConfig::default().with_remaining_resources_for("runtime -> x")
    }

    const SIBLING_STATE: &str = r#"<state>
        <ram quota="1G" avail="100M"/>
        <caps quota="5000" avail="1000"/>
        <child name="fs"/>
        <child name="x"/>
    </state>"#;

    #[test]
    fn test_reallocation_to_elastic_slice() {
        let (mut detector, sink, mut rx) = detector(elastic_config());
        drain(&mut rx);

        handle(&mut detector, "runtime -> state", SIBLING_STATE);

        // caps: 1000 - 400 - 100, ram: 100M - 20M - 8M
        let x = detector.slices().find("x").unwrap();
        assert_eq!(x.dynamic_caps(), 500);
        assert_eq!(x.dynamic_ram().as_u64(), 72 * MIB);

        let config = sink.latest(INIT_CONFIG).unwrap();
        assert_eq!(
            start_of(&config, "x"),
            "<start name=\"x\" version=\"0\" caps=\"500\"><resource name=\"RAM\" quantum=\"72M\"/>"
        );
        assert_eq!(
            detector.assigned_totals(),
            AssignedTotals {
                caps: 600,
                ram: NumberOfBytes::new(80 * MIB)
            }
        );
        assert_eq!(
            drain(&mut rx),
            [
                EventKind::DynamicResourcesAssigned,
                EventKind::ConfigRegenerated
            ]
        );

        // Nothing changed since: no recalculation, no regeneration.
        handle(&mut detector, "runtime -> state", SIBLING_STATE);
        assert_eq!(detector.regenerations(), 2);
    }

    #[test]
    fn test_reallocation_only_for_sibling_label() {
        let (mut detector, _sink, _rx) = detector(elastic_config());

        handle(&mut detector, "runtime -> fs -> state", SIBLING_STATE);

        assert_eq!(detector.slices().find("x").unwrap().dynamic_caps(), 0);
        assert_eq!(detector.regenerations(), 1);
    }

    #[test]
    fn test_single_elastic_slice() {
        let (mut detector, _sink, _rx) = detector(elastic_config());

        for avail in ["100M", "200M", "150M"] {
            let state = SIBLING_STATE.replace("100M", avail);
            handle(&mut detector, "runtime -> state", &state);
            detector.update_init_config(CONFIG).unwrap();
        }

        let elastic: Vec<&str> = detector
            .slices()
            .iter()
            .filter(|s| !s.dynamic_ram().is_zero() || s.dynamic_caps() != 0)
            .map(Slice::name)
            .collect();
        assert_eq!(elastic, ["x"]);
    }

    #[test]
    fn test_reallocation_infeasible() {
        let (mut detector, _sink, mut rx) = detector(elastic_config());
        drain(&mut rx);

        let state = SIBLING_STATE
            .replace("avail=\"1000\"", "avail=\"450\"")
            .replace("avail=\"100M\"", "avail=\"25M\"");
        handle(&mut detector, "runtime -> state", &state);

        let x = detector.slices().find("x").unwrap();
        assert_eq!(x.dynamic_caps(), 0);
        assert!(x.dynamic_ram().is_zero());
        assert_eq!(detector.regenerations(), 1);
        assert_eq!(
            drain(&mut rx),
            [
                EventKind::ReallocationInfeasible,
                EventKind::ReallocationInfeasible
            ]
        );
    }

    #[test]
    fn test_elastic_slice_missing() {
        let config = MonitorConfig::default().with_remaining_resources_for("runtime -> dyn");
        let (mut detector, _sink, mut rx) = detector(config);
        drain(&mut rx);

        handle(&mut detector, "runtime -> state", SIBLING_STATE);

        assert_eq!(detector.regenerations(), 2);
        assert_eq!(
            drain(&mut rx),
            [EventKind::ElasticSliceMissing, EventKind::ConfigRegenerated]
        );
    }

    #[test]
    fn test_no_regeneration_without_config() {
        let sink = Arc::new(MemorySink::new());
        let mut detector = Detector::new(&MonitorConfig::default(), sink.clone(), Bus::new(8));

        handle(
            &mut detector,
            "runtime -> state",
            r#"<state><child name="fs" cpu_fault="yes"/><child name="x"/></state>"#,
        );

        assert_eq!(detector.regenerations(), 0);
        assert_eq!(sink.writes(INIT_CONFIG), 0);
        assert_eq!(sink.writes(RESTART_INFO), 1);
    }

    #[test]
    fn test_configured_caps_change_rearms_caps_only() {
        let (mut detector, sink, mut rx) = detector(elastic_config());
        handle(&mut detector, "runtime -> state", SIBLING_STATE);
        assert_eq!(detector.regenerations(), 2);

        detector
            .update_init_config(&CONFIG.replace(r#"caps="100""#, r#"caps="200""#))
            .unwrap();
        drain(&mut rx);
        handle(&mut detector, "runtime -> state", SIBLING_STATE);

        // caps: 1000 - 400 - 200, ram untouched
        let x = detector.slices().find("x").unwrap();
        assert_eq!(x.dynamic_caps(), 400);
        assert_eq!(x.dynamic_ram().as_u64(), 72 * MIB);
        assert_eq!(detector.regenerations(), 4);

        let ev = std::iter::from_fn(|| rx.try_recv().ok())
            .find(|ev| ev.kind == EventKind::DynamicResourcesAssigned)
            .unwrap();
        assert_eq!(ev.caps, Some(400));
        assert_eq!(ev.ram, None);

        let config = sink.latest(INIT_CONFIG).unwrap();
        assert_eq!(
            start_of(&config, "x"),
            "<start name=\"x\" version=\"0\" caps=\"400\"><resource name=\"RAM\" quantum=\"72M\"/>"
        );
    }

    #[test]
    fn test_regenerated_attributes_stay_well_formed() {
        let sink = Arc::new(MemorySink::new());
        let mut detector = Detector::new(&MonitorConfig::default(), sink.clone(), Bus::new(8));
        detector
            .update_init_config(
                r#"<config note='a "b"'><start name="a&amp;b" note='say "hi"'/></config>"#,
            )
            .unwrap();

        let config = sink.latest(INIT_CONFIG).unwrap();
        assert_eq!(
            config,
            r#"<config note='a "b"'><start name="a&amp;b" version="0" note='say "hi"'/></config>"#
        );
        let root = XmlNode::parse(&config).unwrap();
        let start = root.sub_node("start").unwrap();
        assert_eq!(start.attribute("name"), Some("a&b"));
        assert_eq!(start.attribute("note"), Some(r#"say "hi""#));
        assert!(detector.slices().find("a&b").is_some());
    }

    #[test]
    fn test_anomalies_logged_without_subscribers() {
        test_log::install();
        let (mut detector, _sink, _rx) = detector(MonitorConfig::default());

        handle(
            &mut detector,
            "runtime -> state",
            r#"<state>
                <child name="fs" skipped_heartbeats="1"/>
                <child name="ghost" cpu_fault="yes"/>
            </state>"#,
        );
        assert!(detector.update_init_config("<config>").is_err());

        let warnings = test_log::warnings();
        assert!(warnings.iter().any(|l| l.contains("'fs' skipped 1 heartbeats")));
        assert!(warnings.iter().any(|l| l.contains("'ghost' caused a cpu fault")));
        assert!(warnings
            .iter()
            .any(|l| l.contains("'ghost'") && l.contains("restart request dropped")));
        assert!(warnings.iter().any(|l| l.contains("malformed init configuration")));
    }
}
