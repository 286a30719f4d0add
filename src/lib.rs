//! Securecheck - Platform security readiness for kernel anti-cheat.
//!
//! Securecheck inspects a Windows machine for the platform features that
//! kernel-level anti-cheat software requires (TPM 2.0, Secure Boot, UEFI
//! boot, a GPT system disk and an installed Vanguard agent) and reduces
//! them to named checks and a ready / not-ready verdict.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, parsing, and validation
//! - [`error`] - Error types and result aliases
//! - [`probes`] - One probe per platform facet, each with tiered fallbacks
//! - [`report`] - JSON, summary and table rendering
//! - [`rules`] - Pure check evaluation and verdict
//! - [`shell`] - Bounded external command execution
//! - [`snapshot`] - Record types and parallel snapshot collection
//! - [`sources`] - PowerShell, registry and service-control adapters
//!
//! # Example
//!
//! ```
//! use securecheck::rules;
//! use securecheck::snapshot::SystemSnapshot;
//!
//! // Nothing detected: not ready, and TPM is the first failing gate.
//! let checks = rules::evaluate(&SystemSnapshot::default());
//! assert!(!rules::verdict(&checks));
//! assert_eq!(rules::first_failing_gate(&checks), Some(rules::TPM2));
//! ```
//!
//! For end-to-end probing against scripted command output, see the
//! integration tests.

pub mod cli;
pub mod config;
pub mod error;
pub mod probes;
pub mod report;
pub mod rules;
pub mod shell;
pub mod snapshot;
pub mod sources;

pub use error::{CheckError, ProbeError, Result};
