//! Progress spinner shown on stderr while probing.

use crate::report::Theme;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A spinner for the probing phase.
pub struct ProbeSpinner {
    bar: ProgressBar,
}

impl ProbeSpinner {
    /// Create a new spinner with a message.
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.magenta} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        Self { bar }
    }

    /// Create a spinner that doesn't show.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Spinner when stderr is an interactive terminal, hidden otherwise.
    pub fn for_stderr(message: &str, enabled: bool) -> Self {
        if enabled && console::Term::stderr().is_term() && !crate::shell::is_ci() {
            Self::new(message)
        } else {
            Self::hidden()
        }
    }

    /// Whether the spinner draws anything.
    pub fn is_hidden(&self) -> bool {
        self.bar.is_hidden()
    }

    /// Stop and replace the spinner with a one-line result.
    pub fn finish(&self, msg: &str, degraded: bool, theme: &Theme) {
        if self.bar.is_hidden() {
            return;
        }
        if let Ok(style) = ProgressStyle::default_spinner().template("{msg}") {
            self.bar.set_style(style);
        }
        let line = if degraded {
            theme.format_warning(msg)
        } else {
            theme.format_success(msg)
        };
        self.bar.finish_with_message(line);
    }
}
