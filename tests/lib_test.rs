//! Library integration tests.

use securecheck::{CheckError, ProbeError};

#[test]
fn error_types_are_public() {
    let err = CheckError::ConfigValidationError {
        message: "deadline_secs must be greater than zero".into(),
    };
    assert!(err.to_string().contains("deadline_secs"));

    let probe = ProbeError::unavailable("registry", "Access is denied.");
    let wrapped: CheckError = probe.into();
    assert!(wrapped.to_string().contains("Access is denied."));
}

#[test]
fn result_type_alias_is_public() {
    fn test_fn() -> securecheck::Result<()> {
        Ok(())
    }
    assert!(test_fn().is_ok());
}

#[test]
fn cli_types_are_public() {
    use clap::Parser;
    use securecheck::cli::Cli;
    use securecheck::report::OutputFormat;

    let cli = Cli::parse_from(["securecheck", "--json", "--exit-code"]);
    assert_eq!(cli.output_format(), OutputFormat::Json);
    assert!(cli.exit_code);
}

#[test]
fn config_defaults_are_public() {
    use securecheck::config::CheckerConfig;

    let config = CheckerConfig::default();
    assert_eq!(config.agent.primary_service, "vgc");
    assert!(securecheck::config::validate(&config).is_ok());
}

#[test]
fn rules_surface_is_public() {
    use securecheck::rules;

    assert_eq!(rules::GATING_CHECKS.len(), 6);
    assert!(rules::is_gating(rules::VGC));
    assert!(!rules::is_gating(rules::VGC_RUNNING));
    assert_eq!(rules::describe(rules::RAM), "RAM >= 4 GiB");
}
