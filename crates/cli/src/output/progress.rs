//! Progress display for transfers
//!
//! [`TransferReporter`] hands the engine one [`TransferProgress`] per file.
//! Verbose runs get an indicatif byte bar; otherwise a start line is printed
//! and "Done." follows when the file completes.

use ud_core::{ProgressReporter, ProgressSink};

use super::{Formatter, OutputConfig};

const BAR_TEMPLATE: &str = "{msg}\n{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})";

/// Per-file progress display
#[derive(Debug)]
pub struct TransferProgress {
    formatter: Formatter,
    bar: Option<indicatif::ProgressBar>,
}

impl TransferProgress {
    /// Start displaying a transfer of `total` bytes
    pub fn new(formatter: Formatter, total: u64, label: &str) -> Self {
        let config = formatter.config();
        let bar = if config.quiet || config.json {
            None
        } else if config.verbose {
            let bar = indicatif::ProgressBar::new(total);
            let style = indicatif::ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
                .progress_chars("#>-");
            bar.set_style(style);
            bar.set_message(label.to_string());
            Some(bar)
        } else {
            formatter.println(label);
            None
        };

        Self { formatter, bar }
    }

    /// Check if progress bar is visible
    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }
}

impl ProgressSink for TransferProgress {
    fn on_bytes(&self, bytes: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(bytes);
        }
    }

    fn finish(&self) {
        match &self.bar {
            Some(bar) => bar.finish(),
            None => self.formatter.println("Done."),
        }
    }
}

/// Reporter handed to the transfer engine
#[derive(Debug, Clone)]
pub struct TransferReporter {
    formatter: Formatter,
}

impl TransferReporter {
    pub fn new(config: OutputConfig) -> Self {
        Self {
            formatter: Formatter::new(config),
        }
    }
}

impl ProgressReporter for TransferReporter {
    fn instrument(&self, total_bytes: u64, label: &str) -> Box<dyn ProgressSink> {
        Box::new(TransferProgress::new(self.formatter.clone(), total_bytes, label))
    }
}
