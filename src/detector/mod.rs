//! Failure detection and resource reallocation.
//!
//! - [`Detector`] evaluates state reports, schedules restarts and regenerates
//!   the init configuration.
//! - [`Reallocator`] hands spare quota to the elastic slice, based on a
//!   [`Resources`] snapshot of the sibling report.

#[allow(clippy::module_inception)]
mod detector;
mod resources;

pub use detector::{AssignedTotals, Detector, INIT_CONFIG};
pub use resources::{
    Reallocation, Reallocator, Resources, configured_totals, ram_of_start_node, soft_limit,
};
