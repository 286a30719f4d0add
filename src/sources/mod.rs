//! External source adapters.
//!
//! Each adapter is a thin, stateless call to one information source and
//! carries no fallback logic of its own; ordering of sources is the
//! business of [`crate::probes`].
//!
//! - [`powershell`] - Script invocation and JSON payload decoding
//! - [`registry`] - Registry reads through `reg.exe`
//! - [`service_control`] - Service status and configuration through `sc.exe`
//! - [`mock`] - Scripted [`CommandRunner`] for tests

pub mod mock;
pub mod powershell;
pub mod registry;
pub mod service_control;

use crate::error::ProbeError;
use crate::shell::{CommandResult, CommandRunner, SystemRunner, SystemTools};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Longest slice of tool output copied into an error message.
const MAX_DETAIL_CHARS: usize = 400;

/// Everything an adapter needs to reach the operating system.
///
/// Cheap to clone; each probe thread gets its own copy.
#[derive(Clone)]
pub struct SourceContext {
    runner: Arc<dyn CommandRunner>,
    tools: SystemTools,
    timeout: Duration,
}

impl SourceContext {
    /// Create a context over an arbitrary runner.
    pub fn new(runner: Arc<dyn CommandRunner>, tools: SystemTools, timeout: Duration) -> Self {
        Self {
            runner,
            tools,
            timeout,
        }
    }

    /// Context over the real system tools of this host.
    pub fn system(timeout: Duration) -> Self {
        Self::new(Arc::new(SystemRunner), SystemTools::detect(), timeout)
    }

    /// Tool locations.
    pub fn tools(&self) -> &SystemTools {
        &self.tools
    }

    /// Bound applied to every call made through this context.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run a program under the per-query timeout.
    pub fn run(&self, program: &str, args: &[String]) -> Result<CommandResult, ProbeError> {
        self.runner.run(program, args, self.timeout)
    }
}

impl fmt::Debug for SourceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceContext")
            .field("tools", &self.tools)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Trim tool output and cap its length for inclusion in error messages.
pub(crate) fn detail(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= MAX_DETAIL_CHARS {
        return text.to_string();
    }
    let mut short: String = text.chars().take(MAX_DETAIL_CHARS).collect();
    short.push('…');
    short
}
