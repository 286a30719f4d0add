//! Virtualization posture probe.
//!
//! Three independent sub-queries. Each failure leaves its field `false`
//! and does not stop the others; failures are folded into one error.

use super::ProbeOutcome;
use crate::error::ProbeError;
use crate::snapshot::VirtualizationRecord;
use crate::sources::{powershell, SourceContext};
use serde::Deserialize;

const DEVICE_GUARD_NAMESPACE: &str = r"root\Microsoft\Windows\DeviceGuard";
const HYPER_V_SCRIPT: &str =
    "(Get-WindowsOptionalFeature -Online -FeatureName Microsoft-Hyper-V-All).State";

#[derive(Debug, Deserialize)]
struct ComputerSystem {
    #[serde(rename = "HypervisorPresent")]
    hypervisor_present: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct DeviceGuard {
    #[serde(rename = "VirtualizationBasedSecurityStatus")]
    vbs_status: Option<i64>,
}

/// Determine hypervisor presence, Hyper-V feature state and VBS status.
pub fn probe(ctx: &SourceContext) -> ProbeOutcome<VirtualizationRecord> {
    let mut record = VirtualizationRecord::default();
    let mut errors = Vec::new();

    match powershell::query_cim::<ComputerSystem>(ctx, None, "Win32_ComputerSystem", &["HypervisorPresent"]) {
        Ok(items) => {
            record.hypervisor_present = items.iter().any(|c| c.hypervisor_present == Some(true));
        }
        Err(e) => errors.push(e),
    }

    match powershell::run_script(ctx, HYPER_V_SCRIPT) {
        Ok(state) => record.hyper_v_feature_enabled = feature_enabled(&state),
        Err(e) => errors.push(e),
    }

    match powershell::query_cim::<DeviceGuard>(
        ctx,
        Some(DEVICE_GUARD_NAMESPACE),
        "Win32_DeviceGuard",
        &["VirtualizationBasedSecurityStatus"],
    ) {
        Ok(items) => {
            record.vbs_enabled = items
                .first()
                .and_then(|d| d.vbs_status)
                .is_some_and(|status| status != 0);
        }
        Err(e) => errors.push(e),
    }

    ProbeOutcome::with_error(record, ProbeError::combine("virtualization", errors))
}

/// Whether an optional feature `State` reads as enabled. `Disabled` and
/// `DisabledWithPayloadRemoved` do not contain the word.
fn feature_enabled(state: &str) -> bool {
    state.to_ascii_lowercase().contains("enabled")
}
