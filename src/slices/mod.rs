//! Slice bookkeeping.
//!
//! ## Contents
//! - [`Slice`] restart versions, resource ledger and failure tallies of one `<start>` entry
//! - [`FailedComponent`], [`Failure`] per-child failure counters and their kinds
//! - [`SliceRegistry`] insertion-ordered owner of all slices

mod registry;
mod slice;

pub use registry::SliceRegistry;
pub use slice::{FailedComponent, Failure, Slice};
