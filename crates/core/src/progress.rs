//! Progress observer interfaces
//!
//! A transfer reports how many bytes moved through a [`ProgressSink`]. The
//! sink is created per file by a [`ProgressReporter`], which decides how (and
//! whether) progress is displayed. Display failures never reach the transfer.

/// Receives byte counts while one object is transferred
pub trait ProgressSink: Send + Sync {
    /// Called with the number of bytes transferred since the previous call
    fn on_bytes(&self, n: u64);

    /// Called once after the transfer completed successfully
    fn finish(&self) {}
}

/// Sink that ignores all progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_bytes(&self, _n: u64) {}
}

/// Creates a progress sink for each transferred file
pub trait ProgressReporter: Send + Sync {
    /// Instrument a transfer of `total_bytes` described by `label`
    fn instrument(&self, total_bytes: u64, label: &str) -> Box<dyn ProgressSink>;
}

/// Reporter that never displays anything
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn instrument(&self, _total_bytes: u64, _label: &str) -> Box<dyn ProgressSink> {
        Box::new(NoProgress)
    }
}
