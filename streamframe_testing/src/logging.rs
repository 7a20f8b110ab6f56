//! Capture of `log` records emitted by connection lifecycle events.

use std::sync::{Mutex, MutexGuard, OnceLock};

use logtest::{Logger, Record};
use rstest::fixture;

/// Exclusive handle to the process-wide [`logtest::Logger`].
///
/// Holding the handle serialises tests that inspect logs, so records from one
/// test never leak into another's assertions.
pub struct LoggerHandle {
    guard: MutexGuard<'static, Logger>,
}

impl LoggerHandle {
    /// Acquire the global logger and discard anything already captured.
    ///
    /// # Panics
    ///
    /// Panics if a previous holder panicked while holding the logger.
    #[must_use]
    pub fn new() -> Self {
        static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

        let logger = LOGGER.get_or_init(|| Mutex::new(Logger::start()));
        let mut guard = logger.lock().expect("logger poisoned");
        while guard.pop().is_some() {}
        Self { guard }
    }

    /// Drain captured records whose message contains `needle`.
    pub fn take_matching(&mut self, needle: &str) -> Vec<Record> {
        let mut matching = Vec::new();
        while let Some(record) = self.guard.pop() {
            if record.args().contains(needle) {
                matching.push(record);
            }
        }
        matching
    }
}

impl Default for LoggerHandle {
    fn default() -> Self { Self::new() }
}

/// rstest fixture yielding a [`LoggerHandle`].
#[fixture]
pub fn logger() -> LoggerHandle { LoggerHandle::new() }
