//! Registry adapter.
//!
//! Reads go through `reg.exe query` and its text output is parsed here.
//! Key paths use the short hive form, e.g. `HKLM\SYSTEM\CurrentControlSet`.

use super::{detail, SourceContext};
use crate::error::ProbeError;

/// Read a DWORD value.
pub fn read_dword(ctx: &SourceContext, key: &str, value_name: &str) -> Result<u32, ProbeError> {
    let output = query(ctx, key, Some(value_name))?;
    parse_reg_dword(&output, value_name).ok_or_else(|| {
        ProbeError::parse(
            format!(r"{}\{}", key, value_name),
            "value missing or not a REG_DWORD",
        )
    })
}

/// Read a string value (`REG_SZ`, `REG_EXPAND_SZ` or `REG_MULTI_SZ`).
pub fn read_string(ctx: &SourceContext, key: &str, value_name: &str) -> Result<String, ProbeError> {
    let output = query(ctx, key, Some(value_name))?;
    parse_reg_string(&output, value_name).ok_or_else(|| {
        ProbeError::parse(
            format!(r"{}\{}", key, value_name),
            "value missing or not a string",
        )
    })
}

/// Names of the immediate subkeys of `key`.
///
/// Fails when the key cannot be opened for enumeration.
pub fn subkeys(ctx: &SourceContext, key: &str) -> Result<Vec<String>, ProbeError> {
    let output = query(ctx, key, None)?;
    Ok(parse_subkeys(&output, key))
}

/// Whether `key` can be opened.
pub fn key_exists(ctx: &SourceContext, key: &str) -> bool {
    query(ctx, key, None).is_ok()
}

fn query(ctx: &SourceContext, key: &str, value_name: Option<&str>) -> Result<String, ProbeError> {
    let mut args = vec!["query".to_string(), key.to_string()];
    if let Some(name) = value_name {
        args.push("/v".to_string());
        args.push(name.to_string());
    }
    let result = ctx.run(&ctx.tools().reg, &args)?;
    if !result.success {
        let text = result.combined();
        let message = if text.is_empty() {
            format!("reg.exe exited with {:?}", result.exit_code)
        } else {
            detail(text.trim_start_matches("ERROR:"))
        };
        return Err(ProbeError::unavailable(key, message));
    }
    Ok(result.stdout)
}

/// Expand a short hive prefix to the form `reg.exe` prints.
pub fn expand_hive(key: &str) -> String {
    const HIVES: &[(&str, &str)] = &[
        ("HKLM", "HKEY_LOCAL_MACHINE"),
        ("HKCU", "HKEY_CURRENT_USER"),
        ("HKCR", "HKEY_CLASSES_ROOT"),
        ("HKU", "HKEY_USERS"),
        ("HKCC", "HKEY_CURRENT_CONFIG"),
    ];
    let (hive, rest) = key.split_once('\\').unwrap_or((key, ""));
    let long = HIVES
        .iter()
        .find(|(short, _)| short.eq_ignore_ascii_case(hive))
        .map(|(_, long)| *long)
        .unwrap_or(hive);
    if rest.is_empty() {
        long.to_string()
    } else {
        format!(r"{}\{}", long, rest)
    }
}

fn parse_reg_dword(output: &str, value_name: &str) -> Option<u32> {
    let (reg_type, value) = parse_reg_line(output, value_name)?;
    if reg_type != "REG_DWORD" {
        return None;
    }

    let value = value.trim();
    if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        value.parse::<u32>().ok()
    }
}

fn parse_reg_string(output: &str, value_name: &str) -> Option<String> {
    let (reg_type, value) = parse_reg_line(output, value_name)?;
    match reg_type.as_str() {
        "REG_SZ" | "REG_EXPAND_SZ" | "REG_MULTI_SZ" => Some(value.trim().to_string()),
        _ => None,
    }
}

/// Find the `<name> <type> <data>` line for `value_name`.
///
/// Data keeps its internal spacing; only the columns before it are split.
fn parse_reg_line(output: &str, value_name: &str) -> Option<(String, String)> {
    for line in output.lines() {
        let line = line.trim();
        let Some((name, rest)) = split_column(line) else {
            continue;
        };
        if !name.eq_ignore_ascii_case(value_name) {
            continue;
        }
        let Some((reg_type, value)) = split_column(rest) else {
            continue;
        };
        if !reg_type.starts_with("REG_") {
            continue;
        }
        return Some((reg_type.to_string(), value.to_string()));
    }
    None
}

fn split_column(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    let end = text.find(char::is_whitespace)?;
    Some((&text[..end], text[end..].trim_start()))
}

fn parse_subkeys(output: &str, key: &str) -> Vec<String> {
    let parent = expand_hive(key).to_ascii_lowercase();
    let prefix = format!("{}\\", parent.trim_end_matches('\\'));
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.to_ascii_lowercase().starts_with(&prefix))
        .filter_map(|line| {
            let child = &line[prefix.len()..];
            (!child.is_empty() && !child.contains('\\')).then(|| child.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::SystemTools;
    use crate::sources::mock::ScriptedRunner;
    use std::sync::Arc;
    use std::time::Duration;

    const KEYS: &str = r"HKLM\SYSTEM\CurrentControlSet\Control\SecureBoot\Keys";

    fn ctx(runner: ScriptedRunner) -> SourceContext {
        SourceContext::new(Arc::new(runner), SystemTools::default(), Duration::from_secs(5))
    }

    #[test]
    fn parses_reg_dword_hex_value() {
        let output = r#"
HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\SecureBoot\State
    UEFISecureBootEnabled    REG_DWORD    0x1
"#;
        assert_eq!(parse_reg_dword(output, "UEFISecureBootEnabled"), Some(1));
    }

    #[test]
    fn parses_reg_dword_decimal_value() {
        let output = "    Start    REG_DWORD    4\n";
        assert_eq!(parse_reg_dword(output, "start"), Some(4));
    }

    #[test]
    fn dword_rejects_wrong_type() {
        let output = "    Start    REG_SZ    2\n";
        assert_eq!(parse_reg_dword(output, "Start"), None);
    }

    #[test]
    fn parses_reg_sz_value_with_spaces() {
        let output = r#"
HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Services\vgc
    ImagePath    REG_EXPAND_SZ    "C:\Program Files\Riot Vanguard\vgc.exe"
"#;
        assert_eq!(
            parse_reg_string(output, "ImagePath").as_deref(),
            Some(r#""C:\Program Files\Riot Vanguard\vgc.exe""#)
        );
    }

    #[test]
    fn missing_value_is_none() {
        assert_eq!(parse_reg_string("HKEY_LOCAL_MACHINE\\X\n", "ImagePath"), None);
    }

    #[test]
    fn expands_short_hives() {
        assert_eq!(expand_hive(r"HKLM\SYSTEM"), r"HKEY_LOCAL_MACHINE\SYSTEM");
        assert_eq!(expand_hive(r"hkcu\Software"), r"HKEY_CURRENT_USER\Software");
        assert_eq!(expand_hive("HKU"), "HKEY_USERS");
        assert_eq!(
            expand_hive(r"HKEY_LOCAL_MACHINE\X"),
            r"HKEY_LOCAL_MACHINE\X"
        );
    }

    #[test]
    fn parses_immediate_subkeys_only() {
        let output = r#"
HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\SecureBoot\Keys
    Version    REG_DWORD    0x1

HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\SecureBoot\Keys\db
HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\SecureBoot\Keys\dbx
HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\SecureBoot\Keys\KEK
HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\SecureBoot\Keys\KEK\Nested
"#;
        assert_eq!(parse_subkeys(output, KEYS), vec!["db", "dbx", "KEK"]);
    }

    #[test]
    fn read_dword_through_reg_exe() {
        let runner = ScriptedRunner::new().on(
            "PEFirmwareType",
            "HKEY_LOCAL_MACHINE\\SYSTEM\\CurrentControlSet\\Control\n    PEFirmwareType    REG_DWORD    0x2\n",
        );
        let value = read_dword(
            &ctx(runner),
            r"HKLM\SYSTEM\CurrentControlSet\Control",
            "PEFirmwareType",
        )
        .unwrap();
        assert_eq!(value, 2);
    }

    #[test]
    fn access_denied_is_source_unavailable() {
        let runner = ScriptedRunner::new().on_exit("Keys", 1, "", "ERROR: Access is denied.\r\n");
        let err = subkeys(&ctx(runner), KEYS).unwrap_err();
        assert_eq!(err, ProbeError::unavailable(KEYS, "Access is denied."));
    }

    #[test]
    fn missing_value_is_parse_failure() {
        let runner = ScriptedRunner::new().on("Start", "HKEY_LOCAL_MACHINE\\X\n");
        let err = read_dword(&ctx(runner), r"HKLM\X", "Start").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ParseFailure);
    }

    #[test]
    fn key_exists_follows_exit_status() {
        let runner = ScriptedRunner::new()
            .on(r"Keys\PK", "HKEY_LOCAL_MACHINE\\...\\PK\n")
            .on_exit(r"Keys\db", 1, "", "ERROR: The system was unable to find the specified registry key or value.");
        let ctx = ctx(runner);
        assert!(key_exists(&ctx, &format!(r"{}\PK", KEYS)));
        assert!(!key_exists(&ctx, &format!(r"{}\db", KEYS)));
    }
}
