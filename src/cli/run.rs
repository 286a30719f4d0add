//! Command execution.
//!
//! [`execute`] handles the early exits (`--schema`, `--completions`),
//! loads configuration, probes the machine and writes the report.

use super::args::Cli;
use super::spinner::ProbeSpinner;
use crate::config::{self, CheckerConfig};
use crate::error::Result;
use crate::report::{self, json, OutputFormat, Report, Theme};
use crate::snapshot::{SnapshotAggregator, SystemSnapshot};
use clap::CommandFactory;
use std::io::Write;

/// Exit status when the machine is not ready and `--exit-code` is set.
pub const EXIT_NOT_READY: u8 = 1;

/// Exit status for configuration and I/O failures.
pub const EXIT_FAILURE: u8 = 2;

/// Resolve configuration: file and environment layers, then CLI flags.
pub fn resolve_config(cli: &Cli) -> Result<CheckerConfig> {
    let mut config = config::load_config(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config::validate(&config)?;
    Ok(config)
}

/// Run the command line against the real machine. Returns the exit status.
pub fn execute(cli: &Cli, out: &mut dyn Write) -> Result<u8> {
    if cli.schema {
        writeln!(out, "{}", json::schema()?)?;
        return Ok(0);
    }
    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "securecheck", out);
        return Ok(0);
    }

    let config = resolve_config(cli)?;
    tracing::debug!("resolved config: {:?}", config);

    let theme = Theme::for_stdout(cli.no_color);
    let spinner = ProbeSpinner::for_stderr(
        "Probing platform security...",
        cli.output_format() != OutputFormat::Json,
    );
    let snapshot = SnapshotAggregator::from_config(&config).collect();
    spinner.finish(
        &format!("Probed in {}ms", snapshot.elapsed_ms),
        snapshot.is_degraded(),
        &theme,
    );

    write_report(cli, snapshot, &theme, out)
}

/// Render a collected snapshot and compute the exit status.
pub fn write_report(cli: &Cli, snapshot: SystemSnapshot, theme: &Theme, out: &mut dyn Write) -> Result<u8> {
    let report = Report::from_snapshot(snapshot);
    let rendered = report::render(&report, cli.output_format(), theme, cli.verbose)?;
    if rendered.ends_with('\n') {
        write!(out, "{}", rendered)?;
    } else {
        writeln!(out, "{}", rendered)?;
    }

    if cli.exit_code && !report.ready {
        Ok(EXIT_NOT_READY)
    } else {
        Ok(0)
    }
}
