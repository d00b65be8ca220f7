//! Outbound reports.
//!
//! Every report leaves the monitor through a [`ReportSink`] under a fixed name:
//!
//! | report           | writer                     | trigger                                  |
//! |------------------|----------------------------|------------------------------------------|
//! | `init.config`    | `Detector`                 | restart pending, quota reassigned, config update |
//! | `restart_info`   | [`RestartReporter`]        | every processed state report             |
//! | `free_resources` | [`FreeResourcesReporter`]  | runtime state report with `ram` and `caps` |
//! | `init.state`     | [`InitStateMirror`]        | runtime state report                     |

mod free_resources;
mod init_state;
mod restart;
mod sink;

pub use free_resources::{FREE_RESOURCES, FreeResourcesReporter};
pub use init_state::{INIT_STATE, InitStateMirror};
pub use restart::{RESTART_INFO, RestartReporter};
pub use sink::{MemorySink, ReportSink};
