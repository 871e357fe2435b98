//! The probe abstraction: an independent reconnaissance task with discrete
//! steps, cooperative cancellation, and per-step progress.

use crate::aggregator::Findings;
use crate::events::ProgressReporter;
use async_trait::async_trait;
use rand::{thread_rng, Rng};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How a probe's run ended. Cancellation is a first-class outcome, not an
/// error, and per-step failures never surface here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    Completed,
    Cancelled,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub status: ProbeStatus,
    /// Outbound request/lookup attempts made, for throughput accounting.
    pub requests: u64,
}

impl ProbeOutcome {
    pub fn completed(requests: u64) -> Self {
        ProbeOutcome {
            status: ProbeStatus::Completed,
            requests,
        }
    }

    pub fn cancelled(requests: u64) -> Self {
        ProbeOutcome {
            status: ProbeStatus::Cancelled,
            requests,
        }
    }

    pub fn failed(reason: impl Into<String>, requests: u64) -> Self {
        ProbeOutcome {
            status: ProbeStatus::Failed(reason.into()),
            requests,
        }
    }
}

/// Everything a probe needs at run time. One per probe, built by the
/// orchestrator.
pub struct ProbeCtx {
    pub cancel: CancellationToken,
    pub findings: Arc<Findings>,
    pub progress: ProgressReporter,
}

#[async_trait]
pub trait Probe: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run every step, writing findings through `ctx.findings` and
    /// emitting a progress fraction after each step. Must observe
    /// `ctx.cancel` at every suspension point and return promptly with
    /// `Cancelled` once it fires.
    async fn run(&self, ctx: &ProbeCtx) -> ProbeOutcome;
}

/// Randomized inter-step delay to avoid bursty request patterns. The wait
/// races against the cancellation token rather than running to completion.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    min_ms: u64,
    max_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing {
            min_ms: 1_000,
            max_ms: 2_000,
        }
    }
}

impl Pacing {
    /// No delay at all. Used by tests and by single-step probes.
    pub fn none() -> Self {
        Pacing { min_ms: 0, max_ms: 0 }
    }

    pub async fn wait(&self, cancel: &CancellationToken) {
        if self.max_ms == 0 {
            return;
        }
        let ms = if self.min_ms >= self.max_ms {
            self.max_ms
        } else {
            thread_rng().gen_range(self.min_ms..self.max_ms)
        };
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(Duration::from_millis(ms)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test]
    async fn cancellation_preempts_pacing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let pacing = Pacing::default();
        let start = Instant::now();
        pacing.wait(&cancel).await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_sleeps_within_bounds() {
        let cancel = CancellationToken::new();
        let pacing = Pacing::default();
        let start = Instant::now();
        pacing.wait(&cancel).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1_000));
        assert!(elapsed <= Duration::from_millis(2_000));
    }

    #[tokio::test]
    async fn none_returns_immediately() {
        let cancel = CancellationToken::new();
        Pacing::none().wait(&cancel).await;
    }
}
