//! Service control adapter.
//!
//! `sc.exe` reports a missing service with a failing exit status and the
//! explanation on stdout, so both calls hand back the combined text
//! whatever the exit code and leave interpretation to the probe.

use super::SourceContext;
use crate::error::ProbeError;

/// Status dump of a service (`sc query <name>`).
pub fn query(ctx: &SourceContext, service: &str) -> Result<String, ProbeError> {
    run(ctx, "query", service)
}

/// Configuration dump of a service (`sc qc <name>`).
pub fn query_config(ctx: &SourceContext, service: &str) -> Result<String, ProbeError> {
    run(ctx, "qc", service)
}

fn run(ctx: &SourceContext, verb: &str, service: &str) -> Result<String, ProbeError> {
    let args = [verb.to_string(), service.to_string()];
    let result = ctx.run(&ctx.tools().sc, &args)?;
    Ok(result.combined())
}
