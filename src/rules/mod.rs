//! Rule engine.
//!
//! A pure mapping from a [`SystemSnapshot`] to named boolean checks and a
//! readiness verdict. No I/O, never fails.
//!
//! Unknown states count as not satisfied, with one exception: Secure Boot
//! keys are trusted whenever Secure Boot itself is enabled, because the key
//! store is routinely unreadable without elevation.
//!
//! Only [`GATING_CHECKS`] decide the verdict. The rest are diagnostic; in
//! particular a stopped `vgc` service does not make a machine unready,
//! since service state changes at runtime.

use crate::snapshot::{FirmwareMode, PartitionStyle, SecureBootKeyRecord, SecureBootRecord, SystemSnapshot};
use std::collections::BTreeMap;

pub const TPM2: &str = "TPM2";
pub const SECURE_BOOT: &str = "SecureBoot";
pub const UEFI: &str = "UEFI";
pub const GPT: &str = "GPT";
pub const VANGUARD: &str = "Vanguard";
pub const VGC: &str = "VGC";
pub const SECURE_BOOT_KEYS: &str = "SecureBootKeys";
pub const VGC_RUNNING: &str = "VGCRunning";
pub const VGK: &str = "VGK";
pub const HYPER_V_DISABLED: &str = "HyperVDisabled";
pub const VBS_DISABLED: &str = "VBSDisabled";
pub const CPU: &str = "CPU";
pub const RAM: &str = "RAM>=4GiB";
pub const GPU: &str = "GPU";
pub const MOTHERBOARD: &str = "Motherboard";

/// Minimum installed memory.
pub const MIN_RAM_GIB: u64 = 4;

/// Checks whose conjunction is the verdict, in reporting order.
pub const GATING_CHECKS: [&str; 6] = [TPM2, SECURE_BOOT, UEFI, GPT, VANGUARD, VGC];

/// Every check id, in display order.
pub const ALL_CHECKS: [&str; 15] = [
    TPM2,
    SECURE_BOOT,
    UEFI,
    GPT,
    VANGUARD,
    VGC,
    SECURE_BOOT_KEYS,
    VGC_RUNNING,
    VGK,
    HYPER_V_DISABLED,
    VBS_DISABLED,
    CPU,
    RAM,
    GPU,
    MOTHERBOARD,
];

/// Check id to outcome.
pub type Checks = BTreeMap<String, bool>;

/// Whether the Secure Boot key hierarchy is acceptable.
///
/// Enabled Secure Boot implies a valid hierarchy. Otherwise PK, KEK and db
/// must all be present in an enumerable store; dbx is not required.
pub fn secure_boot_keys_ok(secure_boot: &SecureBootRecord, keys: &SecureBootKeyRecord) -> bool {
    if secure_boot.enabled {
        return true;
    }
    keys.keys_enumerable
        && keys.platform_key_present
        && keys.key_exchange_key_present
        && keys.signature_db_present
}

/// Derive every named check from `snapshot`.
pub fn evaluate(snapshot: &SystemSnapshot) -> Checks {
    let tpm = &snapshot.tpm;
    let agent = &snapshot.security_agent;
    let hw = &snapshot.hardware;
    let virt = &snapshot.virtualization;

    [
        (TPM2, tpm.present && tpm.ready && tpm.is_version2),
        (SECURE_BOOT, snapshot.secure_boot.enabled),
        (UEFI, snapshot.boot_mode.firmware_mode == FirmwareMode::Uefi),
        (GPT, snapshot.disk.partition_style == PartitionStyle::Gpt),
        (VANGUARD, agent.installed),
        (VGC, agent.primary_service.exists),
        (
            SECURE_BOOT_KEYS,
            secure_boot_keys_ok(&snapshot.secure_boot, &snapshot.secure_boot_keys),
        ),
        (VGC_RUNNING, agent.primary_service.running),
        (VGK, agent.kernel_service.exists),
        (HYPER_V_DISABLED, !virt.hyper_v_feature_enabled),
        (VBS_DISABLED, !virt.vbs_enabled),
        (CPU, !hw.cpu_name.trim().is_empty()),
        (RAM, hw.ram_gib >= MIN_RAM_GIB),
        (GPU, !hw.gpu_name.trim().is_empty()),
        (MOTHERBOARD, !hw.motherboard_label.trim().is_empty()),
    ]
    .into_iter()
    .map(|(id, ok)| (id.to_string(), ok))
    .collect()
}

/// Conjunction of the gating checks. A missing check counts as failed.
pub fn verdict(checks: &Checks) -> bool {
    first_failing_gate(checks).is_none()
}

/// First gating check that did not pass, in verdict order.
pub fn first_failing_gate(checks: &Checks) -> Option<&'static str> {
    GATING_CHECKS
        .iter()
        .copied()
        .find(|id| !checks.get(*id).copied().unwrap_or(false))
}

/// Human-readable name of a check id.
pub fn describe(check: &str) -> &'static str {
    match check {
        TPM2 => "TPM 2.0",
        SECURE_BOOT => "Secure Boot",
        UEFI => "UEFI boot mode",
        GPT => "GPT system disk",
        VANGUARD => "Vanguard installed",
        VGC => "VGC service",
        SECURE_BOOT_KEYS => "Secure Boot keys",
        VGC_RUNNING => "VGC running",
        VGK => "VGK driver service",
        HYPER_V_DISABLED => "Hyper-V disabled",
        VBS_DISABLED => "VBS disabled",
        CPU => "CPU detected",
        RAM => "RAM >= 4 GiB",
        GPU => "GPU detected",
        MOTHERBOARD => "Motherboard detected",
        _ => "unknown check",
    }
}

/// Whether `check` gates the verdict.
pub fn is_gating(check: &str) -> bool {
    GATING_CHECKS.iter().any(|gate| *gate == check)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::*;

    fn ready_snapshot() -> SystemSnapshot {
        SystemSnapshot {
            tpm: TpmRecord {
                present: true,
                ready: true,
                is_version2: true,
                spec_version: "2.0".into(),
                ..Default::default()
            },
            secure_boot: SecureBootRecord {
                enabled: true,
                source_tier: SecureBootSource::RegistryValue,
            },
            boot_mode: BootModeRecord {
                firmware_mode: FirmwareMode::Uefi,
            },
            disk: DiskStyleRecord {
                partition_style: PartitionStyle::Gpt,
            },
            security_agent: SecurityAgentRecord {
                installed: true,
                primary_service: ServiceStatusRecord {
                    exists: true,
                    running: false,
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn every_check_is_evaluated() {
        let checks = evaluate(&SystemSnapshot::default());
        assert_eq!(checks.len(), ALL_CHECKS.len());
        for id in ALL_CHECKS {
            assert!(checks.contains_key(id), "missing {}", id);
        }
    }

    #[test]
    fn ready_while_vgc_stopped() {
        let checks = evaluate(&ready_snapshot());
        assert!(!checks[VGC_RUNNING]);
        assert!(verdict(&checks));
    }

    #[test]
    fn default_snapshot_is_not_ready() {
        let checks = evaluate(&SystemSnapshot::default());
        assert!(!verdict(&checks));
        assert_eq!(first_failing_gate(&checks), Some(TPM2));
        // Unknown virtualization state reads as disabled.
        assert!(checks[HYPER_V_DISABLED]);
        assert!(checks[VBS_DISABLED]);
    }

    #[test]
    fn each_gating_check_flips_the_verdict() {
        for gate in GATING_CHECKS {
            let mut checks = evaluate(&ready_snapshot());
            checks.insert(gate.to_string(), false);
            assert!(!verdict(&checks), "{} should gate", gate);
            assert_eq!(first_failing_gate(&checks), Some(gate));
        }
    }

    #[test]
    fn diagnostic_checks_never_change_the_verdict() {
        for id in ALL_CHECKS.iter().filter(|id| !is_gating(id)) {
            for value in [true, false] {
                let mut checks = evaluate(&ready_snapshot());
                checks.insert(id.to_string(), value);
                assert!(verdict(&checks), "{} must not gate", id);
            }
        }
    }

    #[test]
    fn missing_gate_counts_as_failed() {
        let mut checks = evaluate(&ready_snapshot());
        checks.remove(GPT);
        assert!(!verdict(&checks));
    }

    #[test]
    fn tpm2_requires_all_three_flags() {
        let mut snapshot = ready_snapshot();
        snapshot.tpm.is_version2 = false;
        assert!(!evaluate(&snapshot)[TPM2]);
        let mut snapshot = ready_snapshot();
        snapshot.tpm.ready = false;
        assert!(!evaluate(&snapshot)[TPM2]);
    }

    #[test]
    fn unknown_partition_style_fails_gpt() {
        let mut snapshot = ready_snapshot();
        snapshot.disk.partition_style = PartitionStyle::Unknown;
        let checks = evaluate(&snapshot);
        assert!(!checks[GPT]);
        assert!(!verdict(&checks));
    }

    #[test]
    fn keys_ok_whenever_secure_boot_enabled() {
        let enabled = SecureBootRecord {
            enabled: true,
            source_tier: SecureBootSource::PlatformQuery,
        };
        for enumerable in [true, false] {
            let keys = SecureBootKeyRecord {
                keys_enumerable: enumerable,
                ..Default::default()
            };
            assert!(secure_boot_keys_ok(&enabled, &keys));
        }
    }

    #[test]
    fn keys_not_ok_when_disabled_and_unreadable() {
        let keys = SecureBootKeyRecord {
            keys_enumerable: false,
            platform_key_present: true,
            key_exchange_key_present: true,
            signature_db_present: true,
            revocation_db_present: true,
            ..Default::default()
        };
        assert!(!secure_boot_keys_ok(&SecureBootRecord::default(), &keys));
    }

    #[test]
    fn keys_ok_without_dbx_when_enumerable() {
        let keys = SecureBootKeyRecord {
            keys_enumerable: true,
            platform_key_present: true,
            key_exchange_key_present: true,
            signature_db_present: true,
            revocation_db_present: false,
            ..Default::default()
        };
        assert!(secure_boot_keys_ok(&SecureBootRecord::default(), &keys));
        let missing_db = SecureBootKeyRecord {
            signature_db_present: false,
            ..keys
        };
        assert!(!secure_boot_keys_ok(&SecureBootRecord::default(), &missing_db));
    }

    #[test]
    fn ram_threshold_is_inclusive() {
        let mut snapshot = ready_snapshot();
        snapshot.hardware.ram_gib = 4;
        assert!(evaluate(&snapshot)[RAM]);
        snapshot.hardware.ram_gib = 3;
        assert!(!evaluate(&snapshot)[RAM]);
    }

    #[test]
    fn every_check_has_a_description() {
        for id in ALL_CHECKS {
            assert_ne!(describe(id), "unknown check");
        }
    }
}
