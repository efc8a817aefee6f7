//! Output formatting utilities
//!
//! Human-readable and JSON output, plus the per-file progress display
//! wired into the transfer engine.

mod formatter;
mod progress;

pub use formatter::{Formatter, summary_line};
pub use progress::{TransferProgress, TransferReporter};

/// Output configuration derived from CLI flags
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Use JSON output format
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Suppress non-error output
    pub quiet: bool,
    /// Show a byte-level progress bar per file
    pub verbose: bool,
}
