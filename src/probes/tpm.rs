//! TPM probe.
//!
//! Tiers, first useful answer wins:
//!
//! 1. `Get-Tpm`. Some builds serialize the selected object as a quoted
//!    string; the query is then re-issued forcing an array and the first
//!    element is used.
//! 2. `Win32_Tpm` through CIM in the MicrosoftTpm security namespace.
//! 3. `Win32_Tpm` through the legacy WMI cmdlet.
//!
//! A tier whose record carries no useful values counts as a parse failure.

use super::{first_success, ProbeOutcome, Tier};
use crate::error::ProbeError;
use crate::snapshot::TpmRecord;
use crate::sources::powershell::{self, JSON_PRELUDE};
use crate::sources::SourceContext;
use serde::Deserialize;

const TPM_NAMESPACE: &str = "root/cimv2/Security/MicrosoftTpm";
const GET_TPM_FIELDS: &str = "TpmPresent,TpmReady,SpecVersion,ManufacturerIdTxt,ManufacturerVersionFull20";
const WIN32_TPM_FIELDS: &[&str] = &[
    "IsEnabled_InitialValue",
    "IsActivated_InitialValue",
    "SpecVersion",
    "ManufacturerIdTxt",
    "ManufacturerVersionFull20",
];

/// Fields selected from `Get-Tpm`. Null is treated as absent.
#[derive(Debug, Deserialize)]
struct GetTpmPayload {
    #[serde(rename = "TpmPresent")]
    present: Option<bool>,
    #[serde(rename = "TpmReady")]
    ready: Option<bool>,
    #[serde(rename = "SpecVersion")]
    spec_version: Option<String>,
    #[serde(rename = "ManufacturerIdTxt")]
    vendor_id: Option<String>,
    #[serde(rename = "ManufacturerVersionFull20")]
    full_version: Option<String>,
}

/// Fields selected from `Win32_Tpm`.
#[derive(Debug, Deserialize)]
struct Win32TpmPayload {
    #[serde(rename = "IsEnabled_InitialValue")]
    enabled: Option<bool>,
    #[serde(rename = "IsActivated_InitialValue")]
    activated: Option<bool>,
    #[serde(rename = "SpecVersion")]
    spec_version: Option<String>,
    #[serde(rename = "ManufacturerIdTxt")]
    vendor_id: Option<String>,
    #[serde(rename = "ManufacturerVersionFull20")]
    full_version: Option<String>,
}

impl GetTpmPayload {
    fn into_record(self, raw: &str) -> TpmRecord {
        build_record(
            self.present.unwrap_or(false),
            self.ready.unwrap_or(false),
            self.spec_version,
            self.vendor_id,
            self.full_version,
            raw,
        )
    }
}

impl Win32TpmPayload {
    fn into_record(self, raw: &str) -> TpmRecord {
        let enabled = self.enabled.unwrap_or(false);
        let activated = self.activated.unwrap_or(false);
        build_record(
            enabled || activated,
            enabled && activated,
            self.spec_version,
            self.vendor_id,
            self.full_version,
            raw,
        )
    }
}

fn build_record(
    present: bool,
    ready: bool,
    spec_version: Option<String>,
    vendor_id: Option<String>,
    full_version: Option<String>,
    raw: &str,
) -> TpmRecord {
    let spec_version = spec_version.unwrap_or_default();
    let is_version2 = spec_version.contains("2.0")
        || full_version.is_some_and(|v| !v.trim().is_empty());
    TpmRecord {
        present,
        ready,
        is_version2,
        spec_version,
        vendor_id: vendor_id.unwrap_or_default().trim().to_string(),
        diagnostic_payload: raw.to_string(),
    }
}

/// Determine TPM presence and version.
pub fn probe(ctx: &SourceContext) -> ProbeOutcome<TpmRecord> {
    let tiers = vec![
        Tier::new("Get-Tpm", || via_get_tpm(ctx)),
        Tier::new("CIM Win32_Tpm", || via_cim(ctx)),
        Tier::new("WMI Win32_Tpm", || via_wmi(ctx)),
    ];
    match first_success("TPM", tiers) {
        Ok(record) => ProbeOutcome::ok(record),
        Err(e) => ProbeOutcome::degraded(TpmRecord::default(), e),
    }
}

fn get_tpm_script(force_array: bool) -> String {
    let subject = if force_array { "@($t)" } else { "$t" };
    format!(
        "{} $t = Get-Tpm | Select-Object {}; {} | ConvertTo-Json -Depth 4 -Compress",
        JSON_PRELUDE, GET_TPM_FIELDS, subject
    )
}

fn via_get_tpm(ctx: &SourceContext) -> Result<TpmRecord, ProbeError> {
    let raw = powershell::run_script(ctx, &get_tpm_script(false))?;
    let raw = if raw.starts_with('"') {
        tracing::debug!("Get-Tpm returned a JSON string, retrying as array");
        powershell::run_script(ctx, &get_tpm_script(true))?
    } else {
        raw
    };
    accept("Get-Tpm", &raw, GetTpmPayload::into_record)
}

fn via_cim(ctx: &SourceContext) -> Result<TpmRecord, ProbeError> {
    let script = powershell::cim_script(Some(TPM_NAMESPACE), "Win32_Tpm", WIN32_TPM_FIELDS);
    let raw = powershell::run_script(ctx, &script)?;
    accept("Get-CimInstance Win32_Tpm", &raw, Win32TpmPayload::into_record)
}

fn via_wmi(ctx: &SourceContext) -> Result<TpmRecord, ProbeError> {
    let script = format!(
        "{} Get-WmiObject -Namespace {} -Class Win32_Tpm | Select-Object {} | ConvertTo-Json -Depth 4 -Compress",
        JSON_PRELUDE,
        powershell::quote(r"root\CIMV2\Security\MicrosoftTpm"),
        WIN32_TPM_FIELDS.join(",")
    );
    let raw = powershell::run_script(ctx, &script)?;
    accept("Get-WmiObject Win32_Tpm", &raw, Win32TpmPayload::into_record)
}

/// Decode the first record of `raw` and require useful values.
fn accept<P>(
    origin: &str,
    raw: &str,
    into_record: impl Fn(P, &str) -> TpmRecord,
) -> Result<TpmRecord, ProbeError>
where
    P: serde::de::DeserializeOwned,
{
    let first = powershell::parse_one_or_many::<P>(origin, raw)?
        .into_iter()
        .next()
        .ok_or_else(|| ProbeError::parse(origin, "empty array"))?;
    let record = into_record(first, raw);
    if !record.has_useful_values() {
        return Err(ProbeError::parse(origin, "no useful values"));
    }
    Ok(record)
}
