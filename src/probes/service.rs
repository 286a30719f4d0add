//! Windows service status probe.
//!
//! Existence and run state come from `sc query`. The start policy is then
//! resolved through three sources, first known answer wins:
//! `Get-Service` StartType, the registry `Start` value, and the `sc qc`
//! configuration dump. An existing service whose policy stays unresolved
//! is reported as degraded.

use super::{first_success, ProbeOutcome, Tier};
use crate::error::ProbeError;
use crate::snapshot::{ServiceStatusRecord, StartPolicy};
use crate::sources::{powershell, registry, service_control, SourceContext};
use regex::Regex;
use std::sync::LazyLock;

/// Phrases `sc query` prints for a service that is not installed, across
/// the locales seen in the field.
const ABSENCE_PHRASES: &[&str] = &["does not exist", "non esiste", "failed"];

/// Run-state tokens, upper-cased.
const RUNNING_TOKENS: &[&str] = &["RUNNING", "IN ESECUZIONE"];

/// Numeric start type field of an `sc qc` dump.
static START_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)START_TYPE\s*:\s*(\d)").expect("START_TYPE_RE must compile")
});

/// Registry key of a service.
pub fn service_key(service: &str) -> String {
    format!(r"HKLM\SYSTEM\CurrentControlSet\Services\{}", service)
}

/// Determine existence, run state and start policy of `service`.
pub fn probe(ctx: &SourceContext, service: &str) -> ProbeOutcome<ServiceStatusRecord> {
    let status = match service_control::query(ctx, service) {
        Ok(text) => text,
        Err(e) => return ProbeOutcome::degraded(ServiceStatusRecord::default(), e),
    };

    let mut record = parse_status(&status);
    if !record.exists {
        tracing::debug!("service {} not installed", service);
        return ProbeOutcome::ok(record);
    }

    let tiers = vec![
        Tier::new("Get-Service", || known(service, start_from_powershell(ctx, service))),
        Tier::new("registry", || known(service, start_from_registry(ctx, service))),
        Tier::new("sc qc", || known(service, start_from_config(ctx, service))),
    ];
    match first_success(service, tiers) {
        Ok(policy) => {
            record.start_policy = policy;
            ProbeOutcome::ok(record)
        }
        Err(e) => {
            tracing::debug!("start policy of {} unresolved: {}", service, e);
            ProbeOutcome::degraded(record, e)
        }
    }
}

/// Interpret `sc query` text. Absence short-circuits with an unknown policy.
pub fn parse_status(text: &str) -> ServiceStatusRecord {
    let lower = text.to_lowercase();
    if ABSENCE_PHRASES.iter().any(|p| lower.contains(p)) {
        return ServiceStatusRecord {
            exists: false,
            running: false,
            start_policy: StartPolicy::Unknown,
            raw_diagnostic: text.to_string(),
        };
    }
    let upper = text.to_uppercase();
    ServiceStatusRecord {
        exists: true,
        running: RUNNING_TOKENS.iter().any(|t| upper.contains(t)),
        start_policy: StartPolicy::Unknown,
        raw_diagnostic: text.to_string(),
    }
}

fn known(service: &str, policy: Result<StartPolicy, ProbeError>) -> Result<StartPolicy, ProbeError> {
    match policy? {
        StartPolicy::Unknown => Err(ProbeError::parse(service, "start type not recognised")),
        known => Ok(known),
    }
}

fn start_from_powershell(ctx: &SourceContext, service: &str) -> Result<StartPolicy, ProbeError> {
    let script = format!(
        "try {{ (Get-Service -Name {} | Select-Object -ExpandProperty StartType) }} catch {{ '' }}",
        powershell::quote(service)
    );
    let text = powershell::run_script_lenient(ctx, &script)?;
    Ok(normalize_start_type(&text))
}

fn start_from_registry(ctx: &SourceContext, service: &str) -> Result<StartPolicy, ProbeError> {
    let code = registry::read_dword(ctx, &service_key(service), "Start")?;
    Ok(StartPolicy::from_code(code))
}

fn start_from_config(ctx: &SourceContext, service: &str) -> Result<StartPolicy, ProbeError> {
    let text = service_control::query_config(ctx, service)?;
    Ok(parse_config_dump(&text))
}

/// Normalize a `Get-Service` StartType name.
pub fn normalize_start_type(text: &str) -> StartPolicy {
    let up = text.trim().to_uppercase();
    if up.contains("BOOT") {
        StartPolicy::Boot
    } else if up.contains("SYSTEM") {
        StartPolicy::System
    } else if up.contains("AUTO") {
        StartPolicy::Automatic
    } else if up.contains("MANUAL") || up.contains("DEMAND") {
        StartPolicy::Manual
    } else if up.contains("DISABLED") {
        StartPolicy::Disabled
    } else {
        StartPolicy::Unknown
    }
}

/// Read the start type out of an `sc qc` dump.
///
/// The numeric `START_TYPE : n` field wins; keyword matching on the raw
/// text is the fallback for localized dumps.
pub fn parse_config_dump(text: &str) -> StartPolicy {
    if let Some(code) = START_TYPE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
    {
        let policy = StartPolicy::from_code(code);
        if policy.is_known() {
            return policy;
        }
    }

    let up = text.to_uppercase();
    if up.contains("BOOT_START") {
        StartPolicy::Boot
    } else if up.contains("SYSTEM_START") {
        StartPolicy::System
    } else if up.contains("AUTO_START") || up.contains("AUTOMATIC") {
        StartPolicy::Automatic
    } else if up.contains("DEMAND_START") || up.contains("MANUAL") {
        StartPolicy::Manual
    } else if up.contains("DISABLED") {
        StartPolicy::Disabled
    } else {
        StartPolicy::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::SystemTools;
    use crate::sources::mock::ScriptedRunner;
    use std::sync::Arc;
    use std::time::Duration;

    const RUNNING: &str = "SERVICE_NAME: vgc\n        TYPE               : 10  WIN32_OWN_PROCESS\n        STATE              : 4  RUNNING\n";
    const STOPPED: &str = "SERVICE_NAME: vgc\n        TYPE               : 10  WIN32_OWN_PROCESS\n        STATE              : 1  STOPPED\n";
    const MISSING: &str = "[SC] EnumQueryServicesStatus:OpenService FAILED 1060:\n\nThe specified service does not exist as an installed service.";

    fn run(runner: ScriptedRunner) -> (Arc<ScriptedRunner>, ProbeOutcome<ServiceStatusRecord>) {
        let runner = Arc::new(runner);
        let ctx = SourceContext::new(runner.clone(), SystemTools::default(), Duration::from_secs(5));
        let outcome = probe(&ctx, "vgc");
        (runner, outcome)
    }

    #[test]
    fn running_service_with_powershell_start_type() {
        let (runner, outcome) = run(
            ScriptedRunner::new()
                .on("query vgc", RUNNING)
                .on("Get-Service", "Manual\r\n"),
        );
        let record = outcome.record;
        assert!(record.exists);
        assert!(record.running);
        assert_eq!(record.start_policy, StartPolicy::Manual);
        assert!(!runner.called("reg.exe"));
        assert!(!runner.called("qc vgc"));
    }

    #[test]
    fn italian_running_token() {
        let record = parse_status("STATO              : 4  IN ESECUZIONE");
        assert!(record.exists);
        assert!(record.running);
    }

    #[test]
    fn absence_short_circuits_start_resolution() {
        let (runner, outcome) = run(
            ScriptedRunner::new()
                .on_exit("query vgc", 1060, MISSING, "")
                .on("Get-Service", "Automatic"),
        );
        assert!(!outcome.record.exists);
        assert!(!outcome.record.running);
        assert_eq!(outcome.record.start_policy, StartPolicy::Unknown);
        assert!(!runner.called("Get-Service"));
        assert!(outcome.error.is_none());
    }

    #[test]
    fn italian_absence_phrase() {
        let record = parse_status("Il servizio specificato non esiste come servizio installato.");
        assert!(!record.exists);
    }

    #[test]
    fn parse_status_is_idempotent() {
        assert_eq!(parse_status(RUNNING), parse_status(RUNNING));
        assert!(!parse_status(STOPPED).running);
    }

    #[test]
    fn registry_used_when_powershell_is_silent() {
        let (runner, outcome) = run(
            ScriptedRunner::new()
                .on("query vgc", STOPPED)
                .on("Get-Service", "")
                .on(r"Services\vgc", "    Start    REG_DWORD    0x4\n"),
        );
        assert_eq!(outcome.record.start_policy, StartPolicy::Disabled);
        assert!(!runner.called("qc vgc"));
    }

    #[test]
    fn config_dump_start_type_two_is_automatic() {
        let (_, outcome) = run(
            ScriptedRunner::new()
                .on("query vgc", RUNNING)
                .on_timeout("Get-Service")
                .on_exit(r"Services\vgc", 1, "", "ERROR: Access is denied.")
                .on("qc vgc", "        START_TYPE         : 2   AUTO_START\n"),
        );
        assert_eq!(outcome.record.start_policy, StartPolicy::Automatic);
        assert!(outcome.error.is_none());
    }

    #[test]
    fn unresolved_start_policy_is_reported() {
        let (_, outcome) = run(ScriptedRunner::new().on("query vgc", RUNNING));
        assert!(outcome.record.exists);
        assert!(outcome.record.running);
        assert_eq!(outcome.record.start_policy, StartPolicy::Unknown);
        let err = outcome.error.unwrap();
        assert!(err.to_string().starts_with("vgc unavailable"));
    }

    #[test]
    fn status_query_failure_is_soft_error() {
        let (_, outcome) = run(ScriptedRunner::new().on_timeout("query vgc"));
        assert!(!outcome.record.exists);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn normalizes_start_type_names() {
        assert_eq!(normalize_start_type("Automatic"), StartPolicy::Automatic);
        assert_eq!(normalize_start_type("AutomaticDelayedStart"), StartPolicy::Automatic);
        assert_eq!(normalize_start_type("Boot"), StartPolicy::Boot);
        assert_eq!(normalize_start_type("System"), StartPolicy::System);
        assert_eq!(normalize_start_type("Disabled"), StartPolicy::Disabled);
        assert_eq!(normalize_start_type("???"), StartPolicy::Unknown);
    }

    #[test]
    fn config_dump_keyword_fallback() {
        assert_eq!(parse_config_dump("TIPO_AVVIO : DEMAND_START"), StartPolicy::Manual);
        assert_eq!(parse_config_dump("START_TYPE : 0 BOOT_START"), StartPolicy::Boot);
        assert_eq!(parse_config_dump("start_type:1"), StartPolicy::System);
        assert_eq!(parse_config_dump(""), StartPolicy::Unknown);
    }
}
