//! Hardware inventory probe.

use super::{clean_whitespace, ProbeOutcome};
use crate::error::ProbeError;
use crate::snapshot::HardwareRecord;
use crate::sources::{powershell, SourceContext};
use serde::Deserialize;

const BYTES_PER_GIB: u64 = 1024 * 1024 * 1024;

/// Adapter name Windows reports when no vendor driver is loaded.
const BASIC_DISPLAY: &str = "microsoft basic display";

#[derive(Debug, Deserialize)]
struct Named {
    #[serde(rename = "Name")]
    name: Option<String>,
}

/// `TotalPhysicalMemory` arrives as a number from CIM but as a string from
/// some WMI providers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Bytes {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct ComputerSystem {
    #[serde(rename = "TotalPhysicalMemory")]
    total_physical_memory: Option<Bytes>,
}

#[derive(Debug, Deserialize)]
struct BaseBoard {
    #[serde(rename = "Manufacturer")]
    manufacturer: Option<String>,
    #[serde(rename = "Product")]
    product: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OperatingSystem {
    #[serde(rename = "Caption")]
    caption: Option<String>,
}

/// Collect CPU, GPU, RAM, board and OS names.
///
/// Each field is queried on its own; a failing query leaves that field
/// empty and the errors are folded into one.
pub fn probe(ctx: &SourceContext) -> ProbeOutcome<HardwareRecord> {
    let mut record = HardwareRecord::default();
    let mut errors = Vec::new();

    match powershell::query_cim::<Named>(ctx, None, "Win32_Processor", &["Name"]) {
        Ok(cpus) => {
            record.cpu_name = cpus
                .into_iter()
                .find_map(|c| c.name)
                .map(|n| clean_whitespace(&n))
                .unwrap_or_default();
        }
        Err(e) => errors.push(e),
    }

    match powershell::query_cim::<Named>(ctx, None, "Win32_VideoController", &["Name"]) {
        Ok(gpus) => record.gpu_name = pick_gpu(gpus.into_iter().filter_map(|g| g.name).collect()),
        Err(e) => errors.push(e),
    }

    match powershell::query_cim::<ComputerSystem>(ctx, None, "Win32_ComputerSystem", &["TotalPhysicalMemory"])
        .and_then(|items| ram_gib(items.into_iter().next()))
    {
        Ok(gib) => record.ram_gib = gib,
        Err(e) => errors.push(e),
    }

    match powershell::query_cim::<BaseBoard>(ctx, None, "Win32_BaseBoard", &["Manufacturer", "Product"]) {
        Ok(boards) => {
            if let Some(board) = boards.into_iter().next() {
                record.motherboard_label = board_label(board);
            }
        }
        Err(e) => errors.push(e),
    }

    match powershell::query_cim::<OperatingSystem>(ctx, None, "Win32_OperatingSystem", &["Caption"]) {
        Ok(systems) => {
            record.os_caption = systems
                .into_iter()
                .find_map(|s| s.caption)
                .map(|c| clean_whitespace(&c))
                .unwrap_or_default();
        }
        Err(e) => errors.push(e),
    }

    ProbeOutcome::with_error(record, ProbeError::combine("hardware", errors))
}

/// First adapter that is not the basic display driver, else the first one.
fn pick_gpu(names: Vec<String>) -> String {
    names
        .iter()
        .find(|n| !n.to_lowercase().contains(BASIC_DISPLAY))
        .or_else(|| names.first())
        .map(|n| clean_whitespace(n))
        .unwrap_or_default()
}

fn ram_gib(system: Option<ComputerSystem>) -> Result<u64, ProbeError> {
    let bytes = match system.and_then(|s| s.total_physical_memory) {
        Some(Bytes::Number(n)) => n,
        Some(Bytes::Text(text)) => text.trim().parse::<u64>().map_err(|e| {
            ProbeError::parse("Win32_ComputerSystem", format!("TotalPhysicalMemory {:?}: {}", text, e))
        })?,
        None => return Err(ProbeError::parse("Win32_ComputerSystem", "TotalPhysicalMemory missing")),
    };
    Ok(bytes / BYTES_PER_GIB)
}

fn board_label(board: BaseBoard) -> String {
    let manufacturer = clean_whitespace(&board.manufacturer.unwrap_or_default());
    let product = clean_whitespace(&board.product.unwrap_or_default());
    clean_whitespace(&format!("{} {}", manufacturer, product))
}
