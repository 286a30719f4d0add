//! Boot disk partition style probe.

use super::ProbeOutcome;
use crate::snapshot::{DiskStyleRecord, PartitionStyle};
use crate::sources::{powershell, SourceContext};

const BOOT_DISK_SCRIPT: &str = "$ErrorActionPreference='Stop'; \
$d = Get-Disk | Where-Object IsBoot -eq $true | Select-Object -First 1 -ExpandProperty PartitionStyle; \
if ($null -eq $d) { 'Unknown' } else { $d }";

/// Determine the partition style of the disk marked as boot disk.
///
/// Best effort: unrecognised or empty output is `Unknown`, not an error.
/// Only a failing query process is reported.
pub fn probe(ctx: &SourceContext) -> ProbeOutcome<DiskStyleRecord> {
    match powershell::run_script(ctx, BOOT_DISK_SCRIPT) {
        Ok(text) => ProbeOutcome::ok(DiskStyleRecord {
            partition_style: classify(&text),
        }),
        Err(e) => ProbeOutcome::degraded(DiskStyleRecord::default(), e),
    }
}

/// Normalize `PartitionStyle` text.
pub fn classify(text: &str) -> PartitionStyle {
    match text.trim().to_uppercase().as_str() {
        "GPT" => PartitionStyle::Gpt,
        "MBR" => PartitionStyle::Mbr,
        "RAW" => PartitionStyle::Raw,
        _ => PartitionStyle::Unknown,
    }
}
