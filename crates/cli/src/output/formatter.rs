//! Output formatter for human-readable and JSON output
//!
//! Every line the binary prints goes through [`Formatter`], so quiet and
//! JSON modes behave the same everywhere.

use console::style;
use humansize::{BINARY, format_size};
use serde::Serialize;
use ud_core::{Direction, TransferSummary};

use super::OutputConfig;

/// Formatter for CLI output
///
/// When JSON mode is enabled, stdout carries only the final summary object.
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    /// Create a new formatter with the given configuration
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Check if JSON output mode is enabled
    pub fn is_json(&self) -> bool {
        self.config.json
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.config.quiet
    }

    /// Check if colors are enabled
    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    /// Print the outcome of a job
    pub fn summary(&self, summary: &TransferSummary) {
        if self.config.json {
            self.json(summary);
        } else {
            self.success(&summary_line(summary));
        }
    }

    /// Output a success message
    pub fn success(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }

        if self.colors_enabled() {
            println!("{} {message}", style("✓").green());
        } else {
            println!("✓ {message}");
        }
    }

    /// Output an error message
    ///
    /// Errors are always printed, even in quiet mode.
    pub fn error(&self, message: &str) {
        if self.config.json {
            let error = serde_json::json!({
                "error": message
            });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&error).unwrap_or_else(|_| message.to_string())
            );
        } else if self.colors_enabled() {
            eprintln!("{} {message}", style("✗").red());
        } else {
            eprintln!("✗ {message}");
        }
    }

    /// Output a warning message
    pub fn warning(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }

        if self.colors_enabled() {
            eprintln!("{} {message}", style("⚠").yellow());
        } else {
            eprintln!("⚠ {message}");
        }
    }

    /// Output JSON directly
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    /// Print a line of text (suppressed in quiet and JSON modes)
    pub fn println(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        println!("{message}");
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}

/// One-line human summary of a finished job
pub fn summary_line(summary: &TransferSummary) -> String {
    let verb = match summary.direction {
        Direction::Upload => "Uploaded",
        Direction::Download => "Downloaded",
    };
    let mut line = format!(
        "{verb} {} file(s) ({})",
        summary.files,
        format_size(summary.bytes, BINARY)
    );
    if summary.skipped > 0 {
        line.push_str(&format!(", skipped {} empty object(s)", summary.skipped));
    }
    line
}
