//! Scripted command runner for testing.
//!
//! `ScriptedRunner` implements [`CommandRunner`] by matching the rendered
//! command line against registered needles and replaying a canned answer.
//! Commands with no matching rule fail to spawn, which is what a probe
//! sees when a tool is missing from the host.
//!
//! # Example
//!
//! ```
//! use securecheck::shell::SystemTools;
//! use securecheck::sources::mock::ScriptedRunner;
//! use securecheck::sources::{registry, SourceContext};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let runner = Arc::new(ScriptedRunner::new().on(
//!     "UEFISecureBootEnabled",
//!     "HKEY_LOCAL_MACHINE\\SYSTEM\\State\n    UEFISecureBootEnabled    REG_DWORD    0x1\n",
//! ));
//! let ctx = SourceContext::new(runner.clone(), SystemTools::default(), Duration::from_secs(5));
//!
//! let value = registry::read_dword(&ctx, r"HKLM\SYSTEM\State", "UEFISecureBootEnabled").unwrap();
//! assert_eq!(value, 1);
//! assert_eq!(runner.count("reg.exe"), 1);
//! ```

use crate::error::ProbeError;
use crate::shell::{CommandResult, CommandRunner, SystemTools};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

/// Canned answer for a matched command.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Process ran to completion.
    Output(CommandResult),
    /// Process exceeded its deadline.
    Timeout,
    /// Process could not be started.
    SpawnError(String),
}

#[derive(Debug, Clone)]
struct Rule {
    needle: String,
    reply: Reply,
    delay: Duration,
}

/// [`CommandRunner`] that replays scripted answers and records every call.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    /// Create a runner with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands containing `needle` with a successful exit and `stdout`.
    ///
    /// Rules are checked in registration order, so register the more
    /// specific needles first.
    pub fn on(self, needle: &str, stdout: &str) -> Self {
        self.reply(
            needle,
            Reply::Output(CommandResult::success(stdout, "", Duration::ZERO)),
        )
    }

    /// Answer with a non-zero exit, `stdout` and `stderr`.
    pub fn on_exit(self, needle: &str, code: i32, stdout: &str, stderr: &str) -> Self {
        self.reply(
            needle,
            Reply::Output(CommandResult::failure(
                Some(code),
                stdout,
                stderr,
                Duration::ZERO,
            )),
        )
    }

    /// Answer with a timeout.
    pub fn on_timeout(self, needle: &str) -> Self {
        self.reply(needle, Reply::Timeout)
    }

    /// Answer with a spawn failure.
    pub fn on_spawn_error(self, needle: &str, message: &str) -> Self {
        self.reply(needle, Reply::SpawnError(message.to_string()))
    }

    /// Sleep for `delay` before answering successfully with `stdout`.
    pub fn on_delayed(mut self, needle: &str, delay: Duration, stdout: &str) -> Self {
        self.rules.push(Rule {
            needle: needle.to_string(),
            reply: Reply::Output(CommandResult::success(stdout, "", delay)),
            delay,
        });
        self
    }

    /// Register an arbitrary reply.
    pub fn reply(mut self, needle: &str, reply: Reply) -> Self {
        self.rules.push(Rule {
            needle: needle.to_string(),
            reply,
            delay: Duration::ZERO,
        });
        self
    }

    /// Every command line run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of calls whose command line contains `needle`.
    pub fn count(&self, needle: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(needle)).count()
    }

    /// Whether any call contained `needle`.
    pub fn called(&self, needle: &str) -> bool {
        self.count(needle) > 0
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandResult, ProbeError> {
        let line = std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(line.clone());
        }

        let Some(rule) = self.rules.iter().find(|r| line.contains(&r.needle)) else {
            return Err(ProbeError::unavailable(
                SystemTools::short_name(program),
                "no scripted reply",
            ));
        };

        if !rule.delay.is_zero() {
            thread::sleep(rule.delay);
        }

        match &rule.reply {
            Reply::Output(result) => Ok(result.clone()),
            Reply::Timeout => Err(ProbeError::Timeout {
                operation: program.to_string(),
                after: timeout,
            }),
            Reply::SpawnError(message) => Err(ProbeError::unavailable(
                SystemTools::short_name(program),
                message.clone(),
            )),
        }
    }
}
