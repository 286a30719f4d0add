//! Security agent installation probe.
//!
//! Combines the status of the agent's two services with on-disk discovery:
//! the install directory, the executable's file version and the presence of
//! the kernel driver file.

use super::{service, ProbeOutcome};
use crate::config::AgentConfig;
use crate::error::ProbeError;
use crate::shell::platform::dir_exists;
use crate::snapshot::SecurityAgentRecord;
use crate::sources::{powershell, registry, SourceContext};
use std::path::Path;

/// Determine whether the agent is installed and where.
pub fn probe(ctx: &SourceContext, agent: &AgentConfig) -> ProbeOutcome<SecurityAgentRecord> {
    let primary = service::probe(ctx, &agent.primary_service);
    let kernel = service::probe(ctx, &agent.kernel_service);
    let mut errors: Vec<ProbeError> = [primary.error, kernel.error].into_iter().flatten().collect();

    let install_path = locate_install_dir(ctx, agent);
    let installed =
        install_path.is_some() || primary.record.exists || kernel.record.exists;

    let mut version = String::new();
    let mut kernel_driver_present = false;
    if let Some(dir) = install_path.as_deref() {
        let executable = Path::new(dir).join(&agent.executable);
        if executable.is_file() {
            match powershell::file_version(ctx, &executable.to_string_lossy()) {
                Ok(v) => version = v,
                Err(e) => errors.push(e),
            }
        } else {
            tracing::debug!("{} not found, version unknown", executable.display());
        }
        kernel_driver_present = Path::new(dir).join(&agent.driver).is_file();
    }

    let record = SecurityAgentRecord {
        installed,
        install_path: install_path.unwrap_or_default(),
        version,
        primary_service: primary.record,
        kernel_service: kernel.record,
        kernel_driver_present,
    };
    ProbeOutcome::with_error(record, ProbeError::combine("security agent", errors))
}

/// Resolve the install directory.
///
/// The configured directory wins when it exists; otherwise the parent of
/// each service's `ImagePath` is tried, primary service first.
pub fn locate_install_dir(ctx: &SourceContext, agent: &AgentConfig) -> Option<String> {
    if dir_exists(&agent.install_dir) {
        return Some(agent.install_dir.clone());
    }
    [&agent.primary_service, &agent.kernel_service]
        .into_iter()
        .find_map(|name| image_dir(ctx, name))
}

fn image_dir(ctx: &SourceContext, service_name: &str) -> Option<String> {
    let raw = registry::read_string(ctx, &service::service_key(service_name), "ImagePath")
        .map_err(|e| tracing::debug!("ImagePath of {}: {}", service_name, e))
        .ok()?;
    let image = clean_image_path(&raw, ctx.tools().windows_dir());
    let dir = parent_dir(&image)?;
    dir_exists(dir).then(|| dir.to_string())
}

/// Reduce a service `ImagePath` to the path of its image file.
///
/// A quoted path is taken verbatim up to the closing quote. The NT object
/// prefix `\??\` is dropped and `\SystemRoot\`, `%SystemRoot%` or a bare
/// `System32\` are expanded against `windows_dir`. Unquoted paths end
/// after the first `.exe` or `.sys`, or else at the first space.
pub fn clean_image_path(raw: &str, windows_dir: &str) -> String {
    let raw = raw.trim();
    let (path, quoted) = match raw.strip_prefix('"') {
        Some(rest) => (rest.split('"').next().unwrap_or(rest), true),
        None => (raw, false),
    };

    let path = path.strip_prefix(r"\??\").unwrap_or(path);
    let path = expand_system_root(path, windows_dir);
    if quoted {
        return path;
    }

    let lower = path.to_ascii_lowercase();
    let cut = [".exe", ".sys"]
        .iter()
        .filter_map(|ext| lower.find(ext).map(|i| i + ext.len()))
        .min()
        .or_else(|| path.find(' '));
    match cut {
        Some(end) => path[..end].to_string(),
        None => path,
    }
}

fn expand_system_root(path: &str, windows_dir: &str) -> String {
    let lower = path.to_ascii_lowercase();
    for prefix in [r"\systemroot\", r"%systemroot%\"] {
        if lower.starts_with(prefix) {
            return format!(r"{}\{}", windows_dir, &path[prefix.len()..]);
        }
    }
    if lower.starts_with(r"system32\") {
        return format!(r"{}\{}", windows_dir, path);
    }
    path.to_string()
}

/// Parent directory on either separator.
pub fn parent_dir(path: &str) -> Option<&str> {
    let idx = path.rfind(['\\', '/'])?;
    let dir = &path[..idx];
    (!dir.is_empty()).then_some(dir)
}
