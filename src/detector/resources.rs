//! # Resource reallocation for the elastic slice.
//!
//! One slice may be designated to receive the quota nobody else uses. The
//! [`Reallocator`] computes that quota from the sibling state report, which
//! shows what the runtime has available, and from the init configuration,
//! which shows what every other slice is configured to receive.
//!
//! ```text
//! state report ──► Resources::from_state ──► caps_avail, ram_avail
//! init config  ──► configured_totals(except elastic) ──► configured caps, ram
//!
//! soft_limit(avail, margin, configured):
//!     total = avail - margin (saturating)
//!     total > configured  ─► Some(total - configured)
//!     otherwise           ─► None   (keep previous dynamic value)
//! ```
//!
//! ## Rules
//! - Caps and RAM each have their own recalculation flag, armed whenever the
//!   configured value of any slice changes and cleared only by a successful
//!   assignment of that resource.
//! - A slice without an override (dynamic value zero) is always recalculated
//!   once the reallocator runs.
//! - Nothing is computed unless at least one flag is armed.

use std::fmt;

use crate::error::MonitorError;
use crate::slices::Slice;
use crate::xml::{NumberOfBytes, XmlNode};

/// Aggregate quota figures of one state report.
///
/// Root `<caps>`/`<ram>` nodes contribute quota and availability; every
/// `<child>` contributes its own quota, availability and assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resources {
    pub number_of_children: usize,
    pub caps_quota: u64,
    pub caps_avail: u64,
    pub caps_assigned: u64,
    pub ram_quota: NumberOfBytes,
    pub ram_avail: NumberOfBytes,
    pub ram_assigned: NumberOfBytes,
}

impl Resources {
    /// Sums the quota figures of `state`.
    pub fn from_state(state: &XmlNode<'_>) -> Self {
        let mut total = Resources::default();

        if let Some(caps) = state.sub_node("caps") {
            total.caps_quota = caps.attribute_value("quota", 0);
            total.caps_avail = caps.attribute_value("avail", 0);
        }
        if let Some(ram) = state.sub_node("ram") {
            total.ram_quota = ram.attribute_value("quota", NumberOfBytes::default());
            total.ram_avail = ram.attribute_value("avail", NumberOfBytes::default());
        }

        for child in state.sub_nodes("child") {
            total.number_of_children += 1;
            if let Some(caps) = child.sub_node("caps") {
                total.caps_quota = total
                    .caps_quota
                    .saturating_add(caps.attribute_value("quota", 0));
                total.caps_avail = total
                    .caps_avail
                    .saturating_add(caps.attribute_value("avail", 0));
                total.caps_assigned = total
                    .caps_assigned
                    .saturating_add(caps.attribute_value("assigned", 0));
            }
            if let Some(ram) = child.sub_node("ram") {
                total.ram_quota += ram.attribute_value("quota", NumberOfBytes::default());
                total.ram_avail += ram.attribute_value("avail", NumberOfBytes::default());
                total.ram_assigned += ram.attribute_value("assigned", NumberOfBytes::default());
            }
        }
        total
    }
}

impl fmt::Display for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "number_of_children={} caps_quota={}, caps_avail={}, caps_assigned={} \
             ram_quota={}, ram_avail={}, ram_assigned={}",
            self.number_of_children,
            self.caps_quota,
            self.caps_avail,
            self.caps_assigned,
            self.ram_quota,
            self.ram_avail,
            self.ram_assigned
        )
    }
}

/// Quota left for the elastic slice, or `None` if `avail` minus `margin`
/// does not exceed what is already `configured`.
///
/// # Example
/// ```
/// use heartvisor::detector::soft_limit;
///
/// assert_eq!(soft_limit(1000, 400, 200), Some(400));
/// assert_eq!(soft_limit(500, 400, 200), None);
/// assert_eq!(soft_limit(300, 400, 0), None);
/// ```
pub fn soft_limit(avail: u64, margin: u64, configured: u64) -> Option<u64> {
    let total = avail.saturating_sub(margin);
    (total > configured).then(|| total - configured)
}

/// RAM quantum of the `<resource name="RAM">` node of a `<start>` entry.
pub fn ram_of_start_node(start: &XmlNode<'_>) -> NumberOfBytes {
    start
        .sub_nodes("resource")
        .find(|r| r.attribute("name") == Some("RAM"))
        .map(|r| r.attribute_value("quantum", NumberOfBytes::default()))
        .unwrap_or_default()
}

/// Caps and RAM configured for every `<start>` entry except `except`.
pub fn configured_totals(config: &XmlNode<'_>, except: &str) -> (u64, NumberOfBytes) {
    config
        .sub_nodes("start")
        .filter(|start| start.attribute("name").unwrap_or("") != except)
        .fold((0u64, NumberOfBytes::default()), |(caps, ram), start| {
            (
                caps.saturating_add(start.attribute_value("caps", 0)),
                ram + ram_of_start_node(start),
            )
        })
}

/// Result of one [`Reallocator::assign`] call.
#[derive(Debug, Default)]
pub struct Reallocation {
    /// Snapshot the computation was based on; `None` if nothing was computed.
    pub resources: Option<Resources>,
    /// Newly assigned dynamic caps.
    pub caps: Option<u64>,
    /// Newly assigned dynamic RAM.
    pub ram: Option<NumberOfBytes>,
    /// Resources that could not be assigned.
    pub errors: Vec<MonitorError>,
}

impl Reallocation {
    /// Returns `true` if a dynamic value changed and the init configuration
    /// must be regenerated.
    pub fn updated(&self) -> bool {
        self.caps.is_some() || self.ram.is_some()
    }
}

/// Tracks configured quota and assigns spare quota to the elastic slice.
#[derive(Debug)]
pub struct Reallocator {
    caps_margin: u64,
    ram_margin: NumberOfBytes,
    recalc_caps: bool,
    recalc_ram: bool,
}

impl Reallocator {
    /// Creates a reallocator keeping `caps_margin` and `ram_margin` in reserve.
    pub fn new(caps_margin: u64, ram_margin: NumberOfBytes) -> Self {
        Self {
            caps_margin,
            ram_margin,
            recalc_caps: false,
            recalc_ram: false,
        }
    }

    #[inline]
    pub fn recalc_caps(&self) -> bool {
        self.recalc_caps
    }

    #[inline]
    pub fn recalc_ram(&self) -> bool {
        self.recalc_ram
    }

    /// Records the configured quota of `slice`, arming recalculation on change.
    pub fn observe(&mut self, slice: &mut Slice, caps: u64, ram: NumberOfBytes) {
        if slice.configured_caps() != caps {
            self.recalc_caps = true;
            slice.set_configured_caps(caps);
        }
        if slice.configured_ram() != ram {
            self.recalc_ram = true;
            slice.set_configured_ram(ram);
        }
    }

    /// Assigns spare quota from `state` to the elastic `slice`.
    ///
    /// `config` is the inbound init configuration; only its `<start>`
    /// entries count as committed, never the regenerated output.
    pub fn assign(
        &mut self,
        state: &XmlNode<'_>,
        config: &XmlNode<'_>,
        slice: &mut Slice,
    ) -> Reallocation {
        let mut outcome = Reallocation::default();
        if !self.recalc_caps && !self.recalc_ram {
            return outcome;
        }

        let total = Resources::from_state(state);
        outcome.resources = Some(total);
        let (configured_caps, configured_ram) = configured_totals(config, slice.name());

        if slice.dynamic_caps() == 0 || self.recalc_caps {
            match soft_limit(total.caps_avail, self.caps_margin, configured_caps) {
                Some(caps) => {
                    slice.set_dynamic_caps(caps);
                    self.recalc_caps = false;
                    outcome.caps = Some(caps);
                }
                None => outcome.errors.push(MonitorError::ResourcesInfeasible {
                    resource: "caps",
                    slice: slice.name().to_string(),
                    total: total.caps_avail.saturating_sub(self.caps_margin),
                    configured: configured_caps,
                }),
            }
        }

        if slice.dynamic_ram().is_zero() || self.recalc_ram {
            let avail = total.ram_avail.as_u64();
            let margin = self.ram_margin.as_u64();
            match soft_limit(avail, margin, configured_ram.as_u64()) {
                Some(ram) => {
                    let ram = NumberOfBytes::new(ram);
                    slice.set_dynamic_ram(ram);
                    self.recalc_ram = false;
                    outcome.ram = Some(ram);
                }
                None => outcome.errors.push(MonitorError::ResourcesInfeasible {
                    resource: "ram",
                    slice: slice.name().to_string(),
                    total: avail.saturating_sub(margin),
                    configured: configured_ram.as_u64(),
                }),
            }
        }

        outcome
    }
}
