//! Terminal styling helpers
//!
//! Colors go through `owo-colors`; `anstream` strips them when stdout is not
//! a color-capable terminal.

use indicatif::ProgressStyle;
use owo_colors::OwoColorize;
use std::fmt::Display;
use supports_hyperlinks::Stream;
use terminal_link::Link;

/// Check mark used in success lines
pub const CHECK: &str = "✓";

/// Semantic styles for CLI output
pub trait Stylize {
    /// De-emphasized text (hints, secondary info)
    fn muted(&self) -> String;
    /// Highlighted identifiers (PR keys, repo names)
    fn accent(&self) -> String;
    /// Headings
    fn emphasis(&self) -> String;
    /// Success
    fn success(&self) -> String;
    /// Warnings and non-fatal failures
    fn warn(&self) -> String;
    /// Fatal errors
    fn error(&self) -> String;
}

impl<T: Display> Stylize for T {
    fn muted(&self) -> String {
        self.dimmed().to_string()
    }

    fn accent(&self) -> String {
        self.cyan().to_string()
    }

    fn emphasis(&self) -> String {
        self.bold().to_string()
    }

    fn success(&self) -> String {
        self.green().to_string()
    }

    fn warn(&self) -> String {
        self.yellow().to_string()
    }

    fn error(&self) -> String {
        self.red().bold().to_string()
    }
}

/// Green check mark
pub fn check() -> String {
    CHECK.success()
}

/// Right arrow used in "from → to" lines
pub fn arrow() -> String {
    "→".muted()
}

/// Spinner style shared by long-running phases
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
}

/// Render `text` as a clickable link when the terminal supports it
pub fn hyperlink(text: &str, url: &str) -> String {
    if url.is_empty() || !supports_hyperlinks::on(Stream::Stdout) {
        return text.to_string();
    }
    Link::new(text, url).to_string()
}
