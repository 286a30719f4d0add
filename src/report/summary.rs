//! One-line verdict.

use super::theme::Theme;
use super::Report;
use crate::rules;

/// Verdict line in plain text.
pub fn line(report: &Report) -> String {
    match rules::first_failing_gate(&report.checks) {
        None => "READY - all gating checks passed".to_string(),
        Some(gate) => format!("NOT READY - failing check: {}", rules::describe(gate)),
    }
}

/// Styled verdict line with a trailing newline.
pub fn render(report: &Report, theme: &Theme) -> String {
    let text = line(report);
    if report.ready {
        format!("{}\n", theme.format_success(&text))
    } else {
        format!("{}\n", theme.format_error(&text))
    }
}

/// Soft failures as `probe: message` lines.
pub fn render_diagnostics(report: &Report) -> String {
    report
        .snapshot
        .diagnostics
        .iter()
        .map(|d| format!("  {}: {}\n", d.probe, d.message))
        .collect()
}
