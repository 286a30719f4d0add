//! Canonical record types produced by the probes.
//!
//! Every enum carries an explicit `Unknown`/`Unresolved` variant distinct
//! from its negative values. Collapsing "could not tell" into "absent" is
//! left to the rule engine.

use crate::error::{ErrorKind, ProbeError};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Serialize;

/// TPM presence and version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TpmRecord {
    pub present: bool,
    pub ready: bool,
    pub is_version2: bool,
    /// Spec version list as reported, e.g. `2.0, 0, 1.59`.
    pub spec_version: String,
    /// Manufacturer id text, e.g. `INTC`.
    pub vendor_id: String,
    /// Raw source text of the accepted tier, for troubleshooting only.
    pub diagnostic_payload: String,
}

impl TpmRecord {
    /// Whether any field carries information.
    ///
    /// A source that answers with every field null or empty has told us
    /// nothing, and the next tier is tried.
    pub fn has_useful_values(&self) -> bool {
        self.present
            || self.ready
            || !self.spec_version.trim().is_empty()
            || !self.vendor_id.trim().is_empty()
    }
}

/// Which source answered the Secure Boot question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub enum SecureBootSource {
    RegistryValue,
    PlatformQuery,
    #[default]
    Unresolved,
}

/// UEFI Secure Boot state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecureBootRecord {
    pub enabled: bool,
    pub source_tier: SecureBootSource,
}

/// Secure Boot key hierarchy as visible in the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecureBootKeyRecord {
    /// Whether the key store could be enumerated at all.
    pub keys_enumerable: bool,
    /// Set when Secure Boot is on, so a valid hierarchy must exist.
    pub assumed_present_because_enabled: bool,
    pub platform_key_present: bool,
    pub key_exchange_key_present: bool,
    pub signature_db_present: bool,
    pub revocation_db_present: bool,
}

/// Firmware boot mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub enum FirmwareMode {
    #[serde(rename = "UEFI")]
    Uefi,
    Legacy,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BootModeRecord {
    pub firmware_mode: FirmwareMode,
}

/// Partition table style of the boot disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartitionStyle {
    Gpt,
    Mbr,
    Raw,
    #[serde(rename = "Unknown")]
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiskStyleRecord {
    pub partition_style: PartitionStyle,
}

/// Hypervisor and virtualization-based security posture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VirtualizationRecord {
    pub hypervisor_present: bool,
    pub hyper_v_feature_enabled: bool,
    pub vbs_enabled: bool,
}

/// Service start policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub enum StartPolicy {
    Boot,
    System,
    Automatic,
    Manual,
    Disabled,
    #[default]
    Unknown,
}

impl StartPolicy {
    /// Map the service-control start type number (0 boot .. 4 disabled).
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Boot,
            1 => Self::System,
            2 => Self::Automatic,
            3 => Self::Manual,
            4 => Self::Disabled,
            _ => Self::Unknown,
        }
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

/// State of one Windows service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatusRecord {
    pub exists: bool,
    pub running: bool,
    pub start_policy: StartPolicy,
    /// Status text as printed by the service control tool.
    pub raw_diagnostic: String,
}

/// Installation state of the kernel-mode security agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAgentRecord {
    pub installed: bool,
    pub install_path: String,
    pub version: String,
    pub primary_service: ServiceStatusRecord,
    pub kernel_service: ServiceStatusRecord,
    pub kernel_driver_present: bool,
}

/// Baseline hardware inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HardwareRecord {
    pub cpu_name: String,
    pub gpu_name: String,
    pub motherboard_label: String,
    pub os_caption: String,
    #[serde(rename = "ramGiB")]
    pub ram_gib: u64,
}

/// A soft failure recorded while collecting a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ProbeDiagnostic {
    /// Probe job that raised it.
    pub probe: String,
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip)]
    pub error: ProbeError,
}

impl ProbeDiagnostic {
    pub fn new(probe: impl Into<String>, error: ProbeError) -> Self {
        Self {
            probe: probe.into(),
            kind: error.kind(),
            message: error.to_string(),
            error,
        }
    }
}

/// Every record of one run, assembled once and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemSnapshot {
    pub tpm: TpmRecord,
    pub secure_boot: SecureBootRecord,
    pub secure_boot_keys: SecureBootKeyRecord,
    pub boot_mode: BootModeRecord,
    pub disk: DiskStyleRecord,
    pub virtualization: VirtualizationRecord,
    pub security_agent: SecurityAgentRecord,
    pub hardware: HardwareRecord,
    /// Soft failures in job order.
    pub diagnostics: Vec<ProbeDiagnostic>,
    #[schemars(with = "String")]
    pub collected_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl SystemSnapshot {
    /// Diagnostics raised by one probe job.
    pub fn diagnostics_for<'a>(&'a self, probe: &'a str) -> impl Iterator<Item = &'a ProbeDiagnostic> {
        self.diagnostics.iter().filter(move |d| d.probe == probe)
    }

    /// Whether any probe degraded.
    pub fn is_degraded(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}
