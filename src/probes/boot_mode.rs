//! Firmware boot mode probe.

use super::ProbeOutcome;
use crate::snapshot::{BootModeRecord, FirmwareMode};
use crate::sources::{powershell, registry, SourceContext};

const CONTROL_KEY: &str = r"HKLM\SYSTEM\CurrentControlSet\Control";
const FIRMWARE_TYPE_VALUE: &str = "PEFirmwareType";
const COMPUTER_INFO_SCRIPT: &str = "(Get-ComputerInfo).BiosFirmwareType";

/// Determine whether the machine booted through UEFI or legacy BIOS.
///
/// `PEFirmwareType` (1 legacy, 2 UEFI) is read first. Any other value, or a
/// failed read, falls back to `Get-ComputerInfo`. Text that matches neither
/// mode is `Unknown` without an error.
pub fn probe(ctx: &SourceContext) -> ProbeOutcome<BootModeRecord> {
    match registry::read_dword(ctx, CONTROL_KEY, FIRMWARE_TYPE_VALUE) {
        Ok(2) => return ok(FirmwareMode::Uefi),
        Ok(1) => return ok(FirmwareMode::Legacy),
        Ok(other) => tracing::debug!("unexpected PEFirmwareType {}", other),
        Err(e) => tracing::debug!("PEFirmwareType unreadable: {}", e),
    }

    match powershell::run_script(ctx, COMPUTER_INFO_SCRIPT) {
        Ok(text) => ok(classify(&text)),
        Err(e) => ProbeOutcome::degraded(BootModeRecord::default(), e),
    }
}

fn ok(firmware_mode: FirmwareMode) -> ProbeOutcome<BootModeRecord> {
    ProbeOutcome::ok(BootModeRecord { firmware_mode })
}

/// Map `BiosFirmwareType` text onto a firmware mode.
pub fn classify(text: &str) -> FirmwareMode {
    let up = text.trim().to_uppercase();
    if up.contains("UEFI") {
        FirmwareMode::Uefi
    } else if up.contains("LEGACY") || up.contains("BIOS") {
        FirmwareMode::Legacy
    } else {
        FirmwareMode::Unknown
    }
}
