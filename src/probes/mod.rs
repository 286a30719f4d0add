//! Platform probes.
//!
//! A probe determines one platform facet by walking an ordered chain of
//! [`Tier`]s (first success wins) and normalizes the answer into a record
//! from [`crate::snapshot`]. Probes never fail: when every source is
//! exhausted they return a default record with the error alongside.
//!
//! - [`tpm`] - TPM presence and version
//! - [`secure_boot`] - Secure Boot state and key hierarchy
//! - [`boot_mode`] - UEFI or legacy firmware
//! - [`disk`] - Boot disk partition style
//! - [`virtualization`] - Hypervisor, Hyper-V and VBS posture
//! - [`service`] - Windows service status and start policy
//! - [`agent`] - Security agent installation
//! - [`hardware`] - CPU, GPU, RAM, board and OS inventory

pub mod agent;
pub mod boot_mode;
pub mod disk;
pub mod hardware;
pub mod secure_boot;
pub mod service;
pub mod tpm;
pub mod virtualization;

use crate::error::ProbeError;

/// Record produced by a probe plus the soft failure that degraded it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome<T> {
    pub record: T,
    pub error: Option<ProbeError>,
}

impl<T> ProbeOutcome<T> {
    /// A fully determined record.
    pub fn ok(record: T) -> Self {
        Self {
            record,
            error: None,
        }
    }

    /// A best-effort record with the failure that degraded it.
    pub fn degraded(record: T, error: ProbeError) -> Self {
        Self {
            record,
            error: Some(error),
        }
    }

    /// Attach an optional error.
    pub fn with_error(record: T, error: Option<ProbeError>) -> Self {
        Self { record, error }
    }
}

/// One source in a fallback chain.
pub struct Tier<'a, T> {
    name: &'static str,
    run: Box<dyn Fn() -> Result<T, ProbeError> + 'a>,
}

impl<'a, T> Tier<'a, T> {
    pub fn new(name: &'static str, run: impl Fn() -> Result<T, ProbeError> + 'a) -> Self {
        Self {
            name,
            run: Box::new(run),
        }
    }
}

/// Run `tiers` in order and return the first successful answer.
///
/// When every tier fails the errors are folded into one, tagged with
/// `origin`.
pub fn first_success<T>(origin: &str, tiers: Vec<Tier<'_, T>>) -> Result<T, ProbeError> {
    let mut errors = Vec::with_capacity(tiers.len());
    for tier in tiers {
        match (tier.run)() {
            Ok(value) => {
                tracing::debug!("{}: answered by {}", origin, tier.name);
                return Ok(value);
            }
            Err(e) => {
                tracing::debug!("{}: {} failed: {}", origin, tier.name, e);
                errors.push(e);
            }
        }
    }
    Err(ProbeError::combine(origin, errors)
        .unwrap_or_else(|| ProbeError::unavailable(origin, "no sources configured")))
}

/// Collapse whitespace runs (including newlines) to single spaces.
pub(crate) fn clean_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
