//! Report rendering.
//!
//! A [`Report`] pairs a snapshot with its evaluated checks and verdict.
//! Renderers turn it into JSON, a one-line summary or the default tables.
//!
//! - [`json`] - Machine-readable output and the report JSON schema
//! - [`summary`] - One-line verdict
//! - [`table`] - Box-drawn check and platform tables
//! - [`theme`] - Terminal styles

pub mod json;
pub mod summary;
pub mod table;
pub mod theme;

pub use table::Table;
pub use theme::Theme;

use crate::rules::{self, Checks};
use crate::snapshot::SystemSnapshot;
use schemars::JsonSchema;
use serde::Serialize;

/// Snapshot, checks and verdict of one run.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Everything the probes observed.
    pub snapshot: SystemSnapshot,
    /// Check id to outcome.
    pub checks: Checks,
    /// Whether every gating check passed.
    pub ready: bool,
}

impl Report {
    /// Evaluate `snapshot` into a report.
    pub fn from_snapshot(snapshot: SystemSnapshot) -> Self {
        let checks = rules::evaluate(&snapshot);
        let ready = rules::verdict(&checks);
        match rules::first_failing_gate(&checks) {
            None => tracing::info!("verdict: ready"),
            Some(gate) => tracing::info!("verdict: not ready ({} failed)", gate),
        }
        Self {
            snapshot,
            checks,
            ready,
        }
    }
}

/// How a report is written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Check and platform tables followed by the summary.
    #[default]
    Table,
    /// Pretty-printed JSON.
    Json,
    /// The summary line only.
    Summary,
}

/// Render `report` in `format`.
pub fn render(report: &Report, format: OutputFormat, theme: &Theme, verbose: bool) -> crate::Result<String> {
    match format {
        OutputFormat::Json => json::to_json(report),
        OutputFormat::Summary => {
            let mut out = summary::render(report, theme);
            if verbose {
                out.push_str(&summary::render_diagnostics(report));
            }
            Ok(out)
        }
        OutputFormat::Table => Ok(table::render(report, theme, verbose)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_is_not_ready() {
        let report = Report::from_snapshot(SystemSnapshot::default());
        assert!(!report.ready);
        assert_eq!(report.checks.len(), rules::ALL_CHECKS.len());
    }

    #[test]
    fn summary_format_is_single_line() {
        let report = Report::from_snapshot(SystemSnapshot::default());
        let out = render(&report, OutputFormat::Summary, &Theme::plain(), false).unwrap();
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn json_format_parses() {
        let report = Report::from_snapshot(SystemSnapshot::default());
        let out = render(&report, OutputFormat::Json, &Theme::plain(), false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["ready"], false);
    }
}
