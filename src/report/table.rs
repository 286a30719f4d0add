//! Table rendering for the default report view.

use super::theme::Theme;
use super::Report;
use crate::rules;
use crate::snapshot::{FirmwareMode, PartitionStyle, ServiceStatusRecord, StartPolicy};
use console::measure_text_width;

/// A box-drawn table. Cells may carry ANSI styling; widths are measured
/// on the visible text.
#[derive(Debug)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    column_widths: Vec<usize>,
}

impl Table {
    /// Create a new table with the given headers.
    pub fn new(headers: Vec<&str>) -> Self {
        let headers: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
        let column_widths = headers.iter().map(|h| measure_text_width(h)).collect();

        Self {
            headers,
            rows: Vec::new(),
            column_widths,
        }
    }

    /// Add a row to the table.
    pub fn add_row(&mut self, row: Vec<String>) {
        for (i, cell) in row.iter().enumerate() {
            if i < self.column_widths.len() {
                self.column_widths[i] = self.column_widths[i].max(measure_text_width(cell));
            }
        }
        self.rows.push(row);
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render the table as a string.
    pub fn render(&self) -> String {
        let mut output = String::new();

        output.push_str(&self.render_border('┌', '┬', '┐'));
        output.push('\n');

        output.push_str(&self.render_row(&self.headers));
        output.push('\n');

        output.push_str(&self.render_border('├', '┼', '┤'));
        output.push('\n');

        for row in &self.rows {
            output.push_str(&self.render_row(row));
            output.push('\n');
        }

        output.push_str(&self.render_border('└', '┴', '┘'));

        output
    }

    fn render_border(&self, left: char, mid: char, right: char) -> String {
        let mut s = String::new();
        s.push(left);

        for (i, width) in self.column_widths.iter().enumerate() {
            s.push_str(&"─".repeat(width + 2));
            if i < self.column_widths.len() - 1 {
                s.push(mid);
            }
        }

        s.push(right);
        s
    }

    fn render_row(&self, row: &[String]) -> String {
        let mut s = String::from("│");

        for (i, width) in self.column_widths.iter().enumerate() {
            let cell = row.get(i).map(|s| s.as_str()).unwrap_or("");
            let pad = width.saturating_sub(measure_text_width(cell));
            s.push_str(&format!(" {}{} │", cell, " ".repeat(pad)));
        }

        s
    }
}

/// Render the full report: checks, platform details and the verdict.
pub fn render(report: &Report, theme: &Theme, verbose: bool) -> String {
    let mut out = String::new();

    out.push_str(&theme.format_header("Checks"));
    out.push('\n');
    out.push_str(&checks_table(report, theme).render());
    out.push_str("\n\n");

    out.push_str(&theme.format_header("Platform"));
    out.push('\n');
    out.push_str(&details_table(report).render());
    out.push_str("\n\n");

    if verbose && !report.snapshot.diagnostics.is_empty() {
        out.push_str(&theme.format_header("Diagnostics"));
        out.push('\n');
        for diag in &report.snapshot.diagnostics {
            out.push_str(&format!(
                "  {} {}\n",
                theme.key.apply_to(format!("{}:", diag.probe)),
                theme.dim.apply_to(&diag.message)
            ));
        }
        out.push('\n');
    }

    out.push_str(&super::summary::render(report, theme));
    out
}

fn checks_table(report: &Report, theme: &Theme) -> Table {
    let mut table = Table::new(vec!["Check", "Result", "Gating"]);
    for id in rules::ALL_CHECKS {
        let passed = report.checks.get(id).copied().unwrap_or(false);
        let gating = rules::is_gating(id);
        table.add_row(vec![
            rules::describe(id).to_string(),
            theme.format_check(passed, gating),
            if gating { "yes".to_string() } else { String::new() },
        ]);
    }
    table
}

fn details_table(report: &Report) -> Table {
    let s = &report.snapshot;
    let mut table = Table::new(vec!["Component", "Detail"]);
    let mut row = |name: &str, detail: String| table.add_row(vec![name.to_string(), detail]);

    let tpm = if s.tpm.present {
        format!(
            "present{}, spec {}, vendor {}",
            if s.tpm.ready { " and ready" } else { ", not ready" },
            or_unknown(&s.tpm.spec_version),
            or_unknown(&s.tpm.vendor_id)
        )
    } else {
        "not detected".to_string()
    };
    row("TPM", tpm);
    row(
        "Secure Boot",
        format!(
            "{} ({:?})",
            if s.secure_boot.enabled { "enabled" } else { "disabled" },
            s.secure_boot.source_tier
        ),
    );
    row(
        "Boot mode",
        match s.boot_mode.firmware_mode {
            FirmwareMode::Uefi => "UEFI".to_string(),
            FirmwareMode::Legacy => "Legacy BIOS".to_string(),
            FirmwareMode::Unknown => "unknown".to_string(),
        },
    );
    row(
        "Boot disk",
        match s.disk.partition_style {
            PartitionStyle::Gpt => "GPT".to_string(),
            PartitionStyle::Mbr => "MBR".to_string(),
            PartitionStyle::Raw => "RAW".to_string(),
            PartitionStyle::Unknown => "unknown".to_string(),
        },
    );
    row(
        "Virtualization",
        format!(
            "hypervisor {}, Hyper-V {}, VBS {}",
            on_off(s.virtualization.hypervisor_present),
            on_off(s.virtualization.hyper_v_feature_enabled),
            on_off(s.virtualization.vbs_enabled)
        ),
    );
    let agent = &s.security_agent;
    row(
        "Vanguard",
        if agent.installed {
            format!(
                "{} {}{}",
                or_unknown(&agent.install_path),
                or_unknown(&agent.version),
                if agent.kernel_driver_present { ", driver present" } else { ", driver missing" }
            )
        } else {
            "not installed".to_string()
        },
    );
    row("vgc", service_detail(&agent.primary_service));
    row("vgk", service_detail(&agent.kernel_service));
    row("CPU", or_unknown(&s.hardware.cpu_name).to_string());
    row("GPU", or_unknown(&s.hardware.gpu_name).to_string());
    row("RAM", format!("{} GiB", s.hardware.ram_gib));
    row("Motherboard", or_unknown(&s.hardware.motherboard_label).to_string());
    row("OS", or_unknown(&s.hardware.os_caption).to_string());
    table
}

fn service_detail(service: &ServiceStatusRecord) -> String {
    if !service.exists {
        return "not installed".to_string();
    }
    let state = if service.running { "running" } else { "stopped" };
    match service.start_policy {
        StartPolicy::Unknown => format!("{}, start type unknown", state),
        policy => format!("{}, {:?} start", state, policy),
    }
}

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        "unknown"
    } else {
        value
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}
