//! Configuration schema.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default bound on a single external query, in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Default bound on the whole snapshot, in seconds.
pub const DEFAULT_DEADLINE_SECS: u64 = 120;

/// Top-level checker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckerConfig {
    /// Upper bound for each external query.
    pub query_timeout_secs: u64,

    /// Upper bound for gathering the whole snapshot.
    pub deadline_secs: u64,

    /// Identity of the monitored security agent.
    pub agent: AgentConfig,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
            deadline_secs: DEFAULT_DEADLINE_SECS,
            agent: AgentConfig::default(),
        }
    }
}

impl CheckerConfig {
    /// Per-query timeout as a [`Duration`].
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Overall deadline as a [`Duration`].
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

/// Where the kernel-mode security agent lives and what it is called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    /// Well-known install directory checked before any service lookup.
    pub install_dir: String,

    /// User-mode service name.
    pub primary_service: String,

    /// Kernel driver service name.
    pub kernel_service: String,

    /// Executable whose file version is reported.
    pub executable: String,

    /// Driver file expected next to the executable.
    pub driver: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            install_dir: r"C:\Program Files\Riot Vanguard".to_string(),
            primary_service: "vgc".to_string(),
            kernel_service: "vgk".to_string(),
            executable: "vgc.exe".to_string(),
            driver: "vgk.sys".to_string(),
        }
    }
}
