//! Event types flowing from probes to the consumer: per-step progress,
//! one benchmark record per probe, and the single terminal signal.

use serde::Serialize;
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};

/// Buffer sizes for the diagnostic streams. Full buffers drop events
/// instead of stalling a probe.
pub const PROGRESS_BUFFER: usize = 50;
pub const BENCH_BUFFER: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub module: &'static str,
    pub fraction: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchStatus {
    Done,
    Cancelled,
    Failed,
}

/// Timing, throughput, and memory measurement for one probe's execution.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkRecord {
    pub module: &'static str,
    pub started_at: String,
    pub ended_at: String,
    pub duration_ms: u64,
    pub requests: u64,
    pub rps: f64,
    pub mem_before_kb: u64,
    pub mem_after_kb: u64,
    pub mem_delta_kb: i64,
    pub status: BenchStatus,
}

/// Per-module progress emitter. Enforces the ordering contract: fractions
/// are clamped to [0, 1] and an emission not strictly greater than the
/// last delivered one is dropped, so the consumer always sees a
/// non-decreasing sequence.
pub struct ProgressReporter {
    module: &'static str,
    tx: mpsc::Sender<ProgressEvent>,
    last: Mutex<f64>,
}

impl ProgressReporter {
    pub fn new(module: &'static str, tx: mpsc::Sender<ProgressEvent>) -> Self {
        ProgressReporter {
            module,
            tx,
            last: Mutex::new(0.0),
        }
    }

    pub fn module(&self) -> &'static str {
        self.module
    }

    pub fn emit(&self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0);
        let mut last = self.last.lock().unwrap();
        if fraction <= *last {
            return;
        }
        *last = fraction;
        // try_send: a slow consumer must not stall the probe.
        let _ = self.tx.try_send(ProgressEvent {
            module: self.module,
            fraction,
        });
    }

    /// Highest fraction emitted so far.
    pub fn last(&self) -> f64 {
        *self.last.lock().unwrap()
    }
}

/// Consumer-facing half of the run's event channels. The terminal signal
/// resolves only after every registered probe has reported in.
pub struct EventStream {
    pub progress: mpsc::Receiver<ProgressEvent>,
    pub bench: mpsc::Receiver<BenchmarkRecord>,
    pub done: oneshot::Receiver<()>,
}
