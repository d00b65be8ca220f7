//! Log capture for unit tests.
//!
//! Records are kept per thread, so parallel tests only see their own lines.

use std::cell::RefCell;

use log::{Level, LevelFilter, Log, Metadata, Record};

thread_local! {
    static LINES: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

struct Capture;

impl Log for Capture {
    fn enabled(&self, _: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        LINES.with(|l| l.borrow_mut().push((record.level(), record.args().to_string())));
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture;

/// Routes log records of the calling thread into a fresh buffer.
pub(crate) fn install() {
    let _ = log::set_logger(&CAPTURE);
    log::set_max_level(LevelFilter::Trace);
    LINES.with(|l| l.borrow_mut().clear());
}

/// Warning and error lines logged by the calling thread since [`install`].
pub(crate) fn warnings() -> Vec<String> {
    LINES.with(|l| {
        l.borrow()
            .iter()
            .filter(|(level, _)| *level <= Level::Warn)
            .map(|(_, line)| line.clone())
            .collect()
    })
}
