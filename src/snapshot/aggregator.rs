//! Scatter/gather snapshot collection.
//!
//! Every probe job runs on its own thread and reports over a channel. The
//! gather loop waits until all jobs have reported or the overall deadline
//! passes; a job still pending at that point contributes its default
//! record and a timeout diagnostic.

use super::records::*;
use crate::config::{AgentConfig, CheckerConfig};
use crate::error::ProbeError;
use crate::probes::{self, ProbeOutcome};
use crate::sources::SourceContext;
use chrono::Utc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Probe jobs in reporting order.
pub const JOBS: [&str; 7] = [
    "tpm",
    "secure_boot",
    "boot_mode",
    "disk",
    "virtualization",
    "security_agent",
    "hardware",
];

/// Diagnostic tag for the key store half of the `secure_boot` job.
pub const SECURE_BOOT_KEYS: &str = "secure_boot_keys";

/// Result of one job.
#[derive(Debug)]
enum JobResult {
    Tpm(ProbeOutcome<TpmRecord>),
    SecureBoot(ProbeOutcome<SecureBootRecord>, ProbeOutcome<SecureBootKeyRecord>),
    BootMode(ProbeOutcome<BootModeRecord>),
    Disk(ProbeOutcome<DiskStyleRecord>),
    Virtualization(ProbeOutcome<VirtualizationRecord>),
    SecurityAgent(ProbeOutcome<SecurityAgentRecord>),
    Hardware(ProbeOutcome<HardwareRecord>),
}

fn run_job(index: usize, ctx: &SourceContext, agent: &AgentConfig) -> JobResult {
    match index {
        0 => JobResult::Tpm(probes::tpm::probe(ctx)),
        1 => {
            let state = probes::secure_boot::probe(ctx);
            let keys = probes::secure_boot::probe_keys(ctx, &state.record);
            JobResult::SecureBoot(state, keys)
        }
        2 => JobResult::BootMode(probes::boot_mode::probe(ctx)),
        3 => JobResult::Disk(probes::disk::probe(ctx)),
        4 => JobResult::Virtualization(probes::virtualization::probe(ctx)),
        5 => JobResult::SecurityAgent(probes::agent::probe(ctx, agent)),
        _ => JobResult::Hardware(probes::hardware::probe(ctx)),
    }
}

/// Runs every probe and assembles one [`SystemSnapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotAggregator {
    ctx: SourceContext,
    agent: AgentConfig,
    deadline: Duration,
}

impl SnapshotAggregator {
    pub fn new(ctx: SourceContext, agent: AgentConfig, deadline: Duration) -> Self {
        Self {
            ctx,
            agent,
            deadline,
        }
    }

    /// Aggregator over the real system tools.
    pub fn from_config(config: &CheckerConfig) -> Self {
        Self::new(
            SourceContext::system(config.query_timeout()),
            config.agent.clone(),
            config.deadline(),
        )
    }

    /// Collect a snapshot. Never fails; degraded probes show up in
    /// [`SystemSnapshot::diagnostics`].
    pub fn collect(&self) -> SystemSnapshot {
        let started = Instant::now();
        let collected_at = Utc::now();
        let (tx, rx) = mpsc::channel::<(usize, JobResult)>();

        let mut handles: Vec<Option<JoinHandle<()>>> = Vec::with_capacity(JOBS.len());
        let mut spawn_errors: Vec<Option<ProbeError>> = vec![None; JOBS.len()];
        for (index, name) in JOBS.iter().enumerate() {
            let tx = tx.clone();
            let ctx = self.ctx.clone();
            let agent = self.agent.clone();
            let spawned = thread::Builder::new()
                .name(format!("probe-{}", name))
                .spawn(move || {
                    let result = run_job(index, &ctx, &agent);
                    let _ = tx.send((index, result));
                });
            match spawned {
                Ok(handle) => handles.push(Some(handle)),
                Err(e) => {
                    spawn_errors[index] = Some(ProbeError::unavailable(*name, e.to_string()));
                    handles.push(None);
                }
            }
        }
        drop(tx);

        let mut results: Vec<Option<JobResult>> = (0..JOBS.len()).map(|_| None).collect();
        let mut pending = handles.iter().filter(|h| h.is_some()).count();
        let mut disconnected = false;
        while pending > 0 {
            let remaining = self.deadline.saturating_sub(started.elapsed());
            match rx.recv_timeout(remaining) {
                Ok((index, result)) => {
                    results[index] = Some(result);
                    pending -= 1;
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        // A thread sends before it ends, so a job finished at this point has
        // either queued its result or died without one.
        let finished: Vec<bool> = handles
            .iter()
            .map(|h| h.as_ref().is_none_or(JoinHandle::is_finished))
            .collect();
        while let Ok((index, result)) = rx.try_recv() {
            results[index] = Some(result);
        }

        let mut builder = SnapshotBuilder::default();
        for (index, name) in JOBS.iter().enumerate() {
            match results[index].take() {
                Some(result) => builder.absorb(result),
                None => {
                    let error = spawn_errors[index].take().unwrap_or_else(|| {
                        if disconnected || finished[index] {
                            ProbeError::unavailable(*name, "probe thread exited without reporting")
                        } else {
                            ProbeError::Timeout {
                                operation: (*name).to_string(),
                                after: self.deadline,
                            }
                        }
                    });
                    builder.diagnose(name, Some(error));
                }
            }
        }

        let snapshot = builder.finish(collected_at, started.elapsed());
        for diag in &snapshot.diagnostics {
            tracing::warn!("{} degraded: {}", diag.probe, diag.message);
        }
        tracing::debug!(
            "snapshot collected in {}ms with {} diagnostic(s)",
            snapshot.elapsed_ms,
            snapshot.diagnostics.len()
        );
        snapshot
    }
}

/// Accumulates job results in job order.
#[derive(Default)]
struct SnapshotBuilder {
    snapshot: SystemSnapshot,
}

impl SnapshotBuilder {
    fn diagnose(&mut self, probe: &str, error: Option<ProbeError>) {
        if let Some(error) = error {
            self.snapshot.diagnostics.push(ProbeDiagnostic::new(probe, error));
        }
    }

    fn absorb(&mut self, result: JobResult) {
        match result {
            JobResult::Tpm(o) => {
                self.snapshot.tpm = o.record;
                self.diagnose("tpm", o.error);
            }
            JobResult::SecureBoot(state, keys) => {
                self.snapshot.secure_boot = state.record;
                self.snapshot.secure_boot_keys = keys.record;
                self.diagnose("secure_boot", state.error);
                self.diagnose(SECURE_BOOT_KEYS, keys.error);
            }
            JobResult::BootMode(o) => {
                self.snapshot.boot_mode = o.record;
                self.diagnose("boot_mode", o.error);
            }
            JobResult::Disk(o) => {
                self.snapshot.disk = o.record;
                self.diagnose("disk", o.error);
            }
            JobResult::Virtualization(o) => {
                self.snapshot.virtualization = o.record;
                self.diagnose("virtualization", o.error);
            }
            JobResult::SecurityAgent(o) => {
                self.snapshot.security_agent = o.record;
                self.diagnose("security_agent", o.error);
            }
            JobResult::Hardware(o) => {
                self.snapshot.hardware = o.record;
                self.diagnose("hardware", o.error);
            }
        }
    }

    fn finish(mut self, collected_at: chrono::DateTime<Utc>, elapsed: Duration) -> SystemSnapshot {
        self.snapshot.collected_at = collected_at;
        self.snapshot.elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.snapshot
    }
}
