//! PowerShell adapter.
//!
//! Scripts run under the 64-bit Windows PowerShell with profiles disabled
//! and execution policy bypassed. Scripts that emit JSON start with
//! [`JSON_PRELUDE`] so the console encoding is UTF-8 and PowerShell 7 does
//! not wrap output in ANSI styling.

use super::{detail, SourceContext};
use crate::error::ProbeError;
use crate::shell::SystemTools;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Prefix for scripts whose stdout is parsed as JSON.
pub const JSON_PRELUDE: &str = "$ErrorActionPreference='Stop'; \
[Console]::OutputEncoding=[System.Text.Encoding]::UTF8; \
if ($PSStyle) { $PSStyle.OutputRendering='PlainText' };";

/// Arguments passed to `powershell.exe` ahead of the script.
const BASE_ARGS: &[&str] = &[
    "-NoProfile",
    "-NoLogo",
    "-NonInteractive",
    "-ExecutionPolicy",
    "Bypass",
    "-Command",
];

/// Full argument vector for running `script`.
pub fn invocation_args(script: &str) -> Vec<String> {
    BASE_ARGS
        .iter()
        .map(|s| s.to_string())
        .chain(std::iter::once(script.to_string()))
        .collect()
}

/// Run a script and return its trimmed stdout.
///
/// A non-zero exit is an [`ProbeError::ExternalToolFailure`]; empty output
/// is returned as-is so callers can decide what silence means.
pub fn run_script(ctx: &SourceContext, script: &str) -> Result<String, ProbeError> {
    let program = &ctx.tools().powershell;
    let result = ctx.run(program, &invocation_args(script))?;
    if !result.success {
        return Err(ProbeError::ExternalToolFailure {
            command: SystemTools::short_name(program).to_string(),
            code: result.exit_code,
            detail: detail(&result.stderr),
        });
    }
    Ok(result.stdout.trim().to_string())
}

/// Run a script and return stdout and stderr together, whatever the exit code.
///
/// For one-line queries whose answer may land on either stream.
pub fn run_script_lenient(ctx: &SourceContext, script: &str) -> Result<String, ProbeError> {
    let program = &ctx.tools().powershell;
    let result = ctx.run(program, &invocation_args(script))?;
    Ok(result.combined())
}

/// Run a script and require non-empty output.
pub fn run_script_required(ctx: &SourceContext, script: &str) -> Result<String, ProbeError> {
    let out = run_script(ctx, script)?;
    if out.is_empty() {
        return Err(ProbeError::ExternalToolFailure {
            command: SystemTools::short_name(&ctx.tools().powershell).to_string(),
            code: Some(0),
            detail: "no output".to_string(),
        });
    }
    Ok(out)
}

/// `ConvertTo-Json` emits a bare object for one result and an array for many.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// Single object.
    One(T),
    /// Array of objects.
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Flatten into a vector.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

/// Decode a payload that is either one object or a non-empty array of them.
pub fn parse_one_or_many<T: DeserializeOwned>(
    origin: &str,
    raw: &str,
) -> Result<Vec<T>, ProbeError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ProbeError::parse(origin, "empty payload"));
    }
    let items = serde_json::from_str::<OneOrMany<T>>(raw)
        .map_err(|e| ProbeError::parse(origin, format!("not a record or array: {}", e)))?
        .into_vec();
    if items.is_empty() {
        return Err(ProbeError::parse(origin, "empty array"));
    }
    Ok(items)
}

/// Run a JSON-emitting script and decode its records.
pub fn query_json<T: DeserializeOwned>(
    ctx: &SourceContext,
    origin: &str,
    script: &str,
) -> Result<Vec<T>, ProbeError> {
    let raw = run_script(ctx, script)?;
    parse_one_or_many(origin, &raw)
}

/// Script selecting `properties` from every instance of a CIM class.
pub fn cim_script(namespace: Option<&str>, class: &str, properties: &[&str]) -> String {
    let namespace = namespace
        .map(|ns| format!("-Namespace {} ", quote(ns)))
        .unwrap_or_default();
    format!(
        "{} Get-CimInstance {}-ClassName {} | Select-Object {} | ConvertTo-Json -Depth 4 -Compress",
        JSON_PRELUDE,
        namespace,
        class,
        properties.join(",")
    )
}

/// Query a CIM class and decode its instances.
pub fn query_cim<T: DeserializeOwned>(
    ctx: &SourceContext,
    namespace: Option<&str>,
    class: &str,
    properties: &[&str],
) -> Result<Vec<T>, ProbeError> {
    query_json(ctx, class, &cim_script(namespace, class, properties))
}

/// Product file version of an executable, via its version resource.
pub fn file_version(ctx: &SourceContext, path: &str) -> Result<String, ProbeError> {
    let script = format!("(Get-Item {}).VersionInfo.FileVersion", quote(path));
    run_script(ctx, &script)
}

/// Single-quoted PowerShell string literal.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
