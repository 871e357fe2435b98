//! Transparent instrumentation around a probe run: wall-clock duration,
//! request throughput, and process memory delta.

use crate::events::{BenchStatus, BenchmarkRecord};
use crate::probe::{Probe, ProbeCtx, ProbeStatus};
use std::time::Instant;

/// Run a probe and produce exactly one record, whatever the outcome.
pub async fn run_instrumented(probe: &dyn Probe, ctx: &ProbeCtx) -> BenchmarkRecord {
    let mem_before = resident_kb();
    let started_at = crate::now_rfc3339();
    let start = Instant::now();

    let outcome = probe.run(ctx).await;

    let duration = start.elapsed();
    let ended_at = crate::now_rfc3339();
    let mem_after = resident_kb();

    let status = match outcome.status {
        ProbeStatus::Completed => BenchStatus::Done,
        ProbeStatus::Cancelled => BenchStatus::Cancelled,
        ProbeStatus::Failed(ref reason) => {
            log::warn!("probe {} failed: {}", probe.name(), reason);
            BenchStatus::Failed
        }
    };

    BenchmarkRecord {
        module: probe.name(),
        started_at,
        ended_at,
        duration_ms: duration.as_millis() as u64,
        requests: outcome.requests,
        rps: requests_per_second(outcome.requests, duration.as_secs_f64()),
        mem_before_kb: mem_before,
        mem_after_kb: mem_after,
        mem_delta_kb: mem_after as i64 - mem_before as i64,
        status,
    }
}

fn requests_per_second(requests: u64, secs: f64) -> f64 {
    if requests == 0 || secs <= 0.0 {
        0.0
    } else {
        requests as f64 / secs
    }
}

/// Resident set size in KB. Linux only; other platforms report 0.
pub fn resident_kb() -> u64 {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|s| parse_vmrss_kb(&s))
            .unwrap_or(0)
    }
    #[cfg(not(target_os = "linux"))]
    {
        0
    }
}

#[cfg(target_os = "linux")]
fn parse_vmrss_kb(status: &str) -> Option<u64> {
    status
        .lines()
        .find(|l| l.starts_with("VmRSS:"))
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|v| v.parse().ok())
}
