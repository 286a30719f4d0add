//! Command-line interface for securecheck.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`run`] - Configuration resolution, probing and report output
//! - [`spinner`] - Progress indicator on stderr

pub mod args;
pub mod run;
pub mod spinner;

pub use args::Cli;
pub use run::{execute, resolve_config, EXIT_FAILURE, EXIT_NOT_READY};
pub use spinner::ProbeSpinner;
