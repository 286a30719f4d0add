//! CLI argument definitions.
//!
//! The main entry point is the [`Cli`] struct. There are no subcommands:
//! a bare invocation probes the machine and prints the report.

use crate::config::CheckerConfig;
use crate::report::OutputFormat;
use clap::{ArgGroup, Parser};
use clap_complete::Shell;
use std::path::PathBuf;

/// Securecheck - Is this PC ready for kernel anti-cheat?
#[derive(Debug, Parser)]
#[command(name = "securecheck")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("format").args(["json", "summary", "table"])))]
pub struct Cli {
    /// Path to config file (overrides SECURECHECK_CONFIG)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,

    /// Print only the verdict line
    #[arg(long)]
    pub summary: bool,

    /// Print check and platform tables (default)
    #[arg(long)]
    pub table: bool,

    /// Exit with status 1 when the machine is not ready
    #[arg(long)]
    pub exit_code: bool,

    /// Also list probes that degraded and why
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Per-query timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Deadline for the whole check in seconds
    #[arg(long, value_name = "SECS")]
    pub deadline: Option<u64>,

    /// Print the JSON schema of the report and exit
    #[arg(long, conflicts_with_all = ["json", "summary", "table", "completions"])]
    pub schema: bool,

    /// Generate shell completions and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

impl Cli {
    /// Output format selected by the flags.
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.summary {
            OutputFormat::Summary
        } else {
            OutputFormat::Table
        }
    }

    /// Apply `--timeout` and `--deadline` on top of a loaded config.
    pub fn apply_overrides(&self, config: &mut CheckerConfig) {
        if let Some(secs) = self.timeout {
            config.query_timeout_secs = secs;
        }
        if let Some(secs) = self.deadline {
            config.deadline_secs = secs;
        }
    }
}
