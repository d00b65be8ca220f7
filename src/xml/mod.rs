//! Markup plumbing shared by the detector and the reporters.
//!
//! ## Contents
//! - [`XmlNode`] span-preserving, read-only parse tree of an inbound document
//! - [`XmlGenerator`] bounded writer for outbound documents
//! - [`Reporter`] re-runs a generation callback with a larger buffer on overflow
//! - [`NumberOfBytes`] byte quantities with `K`/`M`/`G` suffixes

mod bytes;
mod generator;
mod node;
mod reporter;

pub use bytes::NumberOfBytes;
pub use generator::XmlGenerator;
pub use node::XmlNode;
pub use reporter::Reporter;
