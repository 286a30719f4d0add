//! Secure Boot state and key hierarchy probes.

use super::{first_success, ProbeOutcome, Tier};
use crate::snapshot::{SecureBootKeyRecord, SecureBootRecord, SecureBootSource};
use crate::sources::{powershell, registry, SourceContext};

const STATE_KEY: &str = r"HKLM\SYSTEM\CurrentControlSet\Control\SecureBoot\State";
const STATE_VALUE: &str = "UEFISecureBootEnabled";
const KEYS_KEY: &str = r"HKLM\SYSTEM\CurrentControlSet\Control\SecureBoot\Keys";
const CONFIRM_SCRIPT: &str =
    "$v = Confirm-SecureBootUEFI; if ($?) { if ($v) { 'True' } else { 'False' } }";

/// Determine whether UEFI Secure Boot is enabled.
///
/// The firmware state value in the registry is authoritative; the
/// `Confirm-SecureBootUEFI` cmdlet is asked only when it cannot be read.
pub fn probe(ctx: &SourceContext) -> ProbeOutcome<SecureBootRecord> {
    let tiers = vec![
        Tier::new("registry", || {
            let value = registry::read_dword(ctx, STATE_KEY, STATE_VALUE)?;
            Ok(SecureBootRecord {
                enabled: value == 1,
                source_tier: SecureBootSource::RegistryValue,
            })
        }),
        Tier::new("Confirm-SecureBootUEFI", || {
            let out = powershell::run_script_required(ctx, CONFIRM_SCRIPT)?;
            Ok(SecureBootRecord {
                enabled: out.to_lowercase().contains("true"),
                source_tier: SecureBootSource::PlatformQuery,
            })
        }),
    ];
    match first_success("Secure Boot", tiers) {
        Ok(record) => ProbeOutcome::ok(record),
        Err(e) => ProbeOutcome::degraded(SecureBootRecord::default(), e),
    }
}

/// Inspect the Secure Boot key store.
///
/// The store is often unreadable without elevation. With Secure Boot on,
/// a valid hierarchy must exist, so an unreadable store is recorded as
/// assumed present and is not an error.
pub fn probe_keys(ctx: &SourceContext, secure_boot: &SecureBootRecord) -> ProbeOutcome<SecureBootKeyRecord> {
    let enabled = secure_boot.enabled;
    if let Err(e) = registry::subkeys(ctx, KEYS_KEY) {
        let record = SecureBootKeyRecord {
            keys_enumerable: false,
            assumed_present_because_enabled: enabled,
            ..Default::default()
        };
        if enabled {
            tracing::debug!("Secure Boot key store unreadable, assuming present: {}", e);
            return ProbeOutcome::ok(record);
        }
        return ProbeOutcome::degraded(record, e);
    }

    let present = |name: &str| registry::key_exists(ctx, &format!(r"{}\{}", KEYS_KEY, name));
    ProbeOutcome::ok(SecureBootKeyRecord {
        keys_enumerable: true,
        assumed_present_because_enabled: enabled,
        platform_key_present: present("PK"),
        key_exchange_key_present: present("KEK"),
        signature_db_present: present("db"),
        revocation_db_present: present("dbx"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::shell::SystemTools;
    use crate::sources::mock::ScriptedRunner;
    use std::sync::Arc;
    use std::time::Duration;

    fn ctx(runner: Arc<ScriptedRunner>) -> SourceContext {
        SourceContext::new(runner, SystemTools::default(), Duration::from_secs(5))
    }

    fn enabled() -> SecureBootRecord {
        SecureBootRecord {
            enabled: true,
            source_tier: SecureBootSource::RegistryValue,
        }
    }

    #[test]
    fn registry_value_one_is_enabled() {
        let runner = Arc::new(ScriptedRunner::new().on(
            STATE_VALUE,
            "HKEY_LOCAL_MACHINE\\...\\State\n    UEFISecureBootEnabled    REG_DWORD    0x1\n",
        ));
        let outcome = probe(&ctx(runner.clone()));
        assert_eq!(outcome.record, enabled());
        assert!(!runner.called("Confirm-SecureBootUEFI"));
    }

    #[test]
    fn registry_value_zero_is_disabled() {
        let runner = Arc::new(ScriptedRunner::new().on(
            STATE_VALUE,
            "    UEFISecureBootEnabled    REG_DWORD    0x0\n",
        ));
        let outcome = probe(&ctx(runner));
        assert!(!outcome.record.enabled);
        assert_eq!(outcome.record.source_tier, SecureBootSource::RegistryValue);
    }

    #[test]
    fn falls_back_to_platform_query() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on_exit(STATE_VALUE, 1, "", "ERROR: Access is denied.")
                .on("Confirm-SecureBootUEFI", "True\r\n"),
        );
        let outcome = probe(&ctx(runner));
        assert!(outcome.record.enabled);
        assert_eq!(outcome.record.source_tier, SecureBootSource::PlatformQuery);
        assert!(outcome.error.is_none());
    }

    #[test]
    fn unresolved_when_both_fail() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on_exit(STATE_VALUE, 1, "", "ERROR: Access is denied.")
                .on("Confirm-SecureBootUEFI", ""),
        );
        let outcome = probe(&ctx(runner));
        assert!(!outcome.record.enabled);
        assert_eq!(outcome.record.source_tier, SecureBootSource::Unresolved);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn unreadable_store_with_secure_boot_on_is_not_an_error() {
        let runner = Arc::new(ScriptedRunner::new().on_exit("Keys", 1, "", "ERROR: Access is denied."));
        let outcome = probe_keys(&ctx(runner), &enabled());
        assert!(!outcome.record.keys_enumerable);
        assert!(outcome.record.assumed_present_because_enabled);
        assert!(outcome.error.is_none());
    }

    #[test]
    fn unreadable_store_with_secure_boot_off_is_soft_error() {
        let runner = Arc::new(ScriptedRunner::new().on_exit("Keys", 1, "", "ERROR: Access is denied."));
        let outcome = probe_keys(&ctx(runner), &SecureBootRecord::default());
        assert!(!outcome.record.keys_enumerable);
        assert!(!outcome.record.assumed_present_because_enabled);
        assert_eq!(outcome.error.unwrap().kind(), ErrorKind::SourceUnavailable);
    }

    #[test]
    fn enumerable_store_checks_each_key() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on(r"Keys\PK", "HKEY_LOCAL_MACHINE\\...\\Keys\\PK\n")
                .on(r"Keys\KEK", "HKEY_LOCAL_MACHINE\\...\\Keys\\KEK\n")
                .on(r"Keys\dbx", "HKEY_LOCAL_MACHINE\\...\\Keys\\dbx\n")
                .on_exit(r"Keys\db", 1, "", "ERROR: The system was unable to find the specified registry key or value.")
                .on("Keys", "HKEY_LOCAL_MACHINE\\SYSTEM\\CurrentControlSet\\Control\\SecureBoot\\Keys\n"),
        );
        let outcome = probe_keys(&ctx(runner), &SecureBootRecord::default());
        let keys = outcome.record;
        assert!(keys.keys_enumerable);
        assert!(keys.platform_key_present);
        assert!(keys.key_exchange_key_present);
        assert!(!keys.signature_db_present);
        assert!(keys.revocation_db_present);
        assert!(outcome.error.is_none());
    }
}
