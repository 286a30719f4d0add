//! Configuration loading.
//!
//! Layers, later overriding earlier:
//!
//! 1. Built-in defaults
//! 2. YAML file (`--config` or `SECURECHECK_CONFIG`)
//! 3. `SECURECHECK_QUERY_TIMEOUT_SECS` / `SECURECHECK_DEADLINE_SECS`
//!
//! Command-line overrides are applied by the caller afterwards.

use crate::config::schema::CheckerConfig;
use crate::error::{CheckError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "SECURECHECK_CONFIG";

/// Environment override for the per-query timeout.
pub const QUERY_TIMEOUT_ENV: &str = "SECURECHECK_QUERY_TIMEOUT_SECS";

/// Environment override for the overall deadline.
pub const DEADLINE_ENV: &str = "SECURECHECK_DEADLINE_SECS";

/// Load configuration using the real process environment.
pub fn load_config(explicit: Option<&Path>) -> Result<CheckerConfig> {
    load_with_env(explicit, |key: &str| std::env::var(key))
}

/// Load configuration with a custom env var lookup function.
///
/// This allows testing without modifying actual environment variables.
pub fn load_with_env<F>(explicit: Option<&Path>, env_fn: F) -> Result<CheckerConfig>
where
    F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
{
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| env_fn(CONFIG_ENV).ok().map(PathBuf::from));

    let mut config = match path {
        Some(path) => load_file(&path)?,
        None => CheckerConfig::default(),
    };

    if let Some(secs) = env_secs(&env_fn, QUERY_TIMEOUT_ENV)? {
        config.query_timeout_secs = secs;
    }
    if let Some(secs) = env_secs(&env_fn, DEADLINE_ENV)? {
        config.deadline_secs = secs;
    }

    validate(&config)?;
    Ok(config)
}

/// Parse a single YAML config file.
pub fn load_file(path: &Path) -> Result<CheckerConfig> {
    if !path.exists() {
        return Err(CheckError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(CheckerConfig::default());
    }
    serde_yaml::from_str(&content).map_err(|e| CheckError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn env_secs<F>(env_fn: &F, key: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
{
    let Ok(raw) = env_fn(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|_| CheckError::ConfigValidationError {
            message: format!("{} must be a whole number of seconds, got '{}'", key, raw),
        })
}

/// Reject values that would make every probe fail immediately.
pub fn validate(config: &CheckerConfig) -> Result<()> {
    if config.query_timeout_secs == 0 {
        return Err(CheckError::ConfigValidationError {
            message: "query_timeout_secs must be greater than zero".to_string(),
        });
    }
    if config.deadline_secs == 0 {
        return Err(CheckError::ConfigValidationError {
            message: "deadline_secs must be greater than zero".to_string(),
        });
    }
    let agent = &config.agent;
    for (field, value) in [
        ("agent.primary_service", &agent.primary_service),
        ("agent.kernel_service", &agent.kernel_service),
        ("agent.executable", &agent.executable),
        ("agent.driver", &agent.driver),
    ] {
        if value.trim().is_empty() {
            return Err(CheckError::ConfigValidationError {
                message: format!("{} must not be empty", field),
            });
        }
    }
    Ok(())
}
