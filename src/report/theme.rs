//! Visual theme and styling.

use console::Style;

/// Styles used by the table and summary renderers.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Passing checks and the ready verdict (green).
    pub success: Style,
    /// Failing diagnostic checks and degraded probes (orange).
    pub warning: Style,
    /// Failing gating checks and the not-ready verdict (red bold).
    pub error: Style,
    /// Secondary text (dim).
    pub dim: Style,
    /// Section headers (magenta bold).
    pub header: Style,
    /// Box-drawing borders (dim).
    pub border: Style,
    /// Key labels in key-value displays (bold).
    pub key: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::new()
    }
}

impl Theme {
    /// Colored theme.
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            dim: Style::new().dim(),
            header: Style::new().bold().magenta(),
            border: Style::new().dim(),
            key: Style::new().bold(),
        }
    }

    /// Create a theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            dim: Style::new(),
            header: Style::new(),
            border: Style::new(),
            key: Style::new(),
        }
    }

    /// Colored when stdout is a terminal and colors are not disabled.
    pub fn for_stdout(no_color: bool) -> Self {
        if no_color || !console::colors_enabled() {
            Self::plain()
        } else {
            Self::new()
        }
    }

    /// Format a success message (icon + text in green).
    pub fn format_success(&self, msg: &str) -> String {
        format!("{}", self.success.apply_to(format!("✓ {}", msg)))
    }

    /// Format a warning message (icon + text in orange).
    pub fn format_warning(&self, msg: &str) -> String {
        format!("{}", self.warning.apply_to(format!("⚠ {}", msg)))
    }

    /// Format an error message (icon + text in red bold).
    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("✗ {}", msg)))
    }

    /// Result cell of a check: failures of gating checks are errors,
    /// failures of diagnostic checks only warnings.
    pub fn format_check(&self, passed: bool, gating: bool) -> String {
        match (passed, gating) {
            (true, _) => self.format_success("pass"),
            (false, true) => self.format_error("fail"),
            (false, false) => self.format_warning("fail"),
        }
    }

    /// Format a section header.
    pub fn format_header(&self, title: &str) -> String {
        format!("{}", self.header.apply_to(title))
    }
}
