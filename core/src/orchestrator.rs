//! Fans probes out as independent tasks under one cancellation scope,
//! counts completion notifications, and emits the terminal signal exactly
//! once.

use crate::aggregator::Findings;
use crate::bench;
use crate::events::{
    BenchmarkRecord, EventStream, ProgressEvent, ProgressReporter, BENCH_BUFFER, PROGRESS_BUFFER,
};
use crate::probe::{Probe, ProbeCtx};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

pub struct Orchestrator {
    cancel: CancellationToken,
    findings: Arc<Findings>,
    progress_tx: mpsc::Sender<ProgressEvent>,
    bench_tx: mpsc::Sender<BenchmarkRecord>,
    done_tx: oneshot::Sender<()>,
}

impl Orchestrator {
    /// Build the orchestrator and the consumer-facing event stream. The
    /// caller keeps a clone of `cancel` to stop the run externally.
    pub fn new(findings: Arc<Findings>, cancel: CancellationToken) -> (Self, EventStream) {
        let (progress_tx, progress_rx) = mpsc::channel(PROGRESS_BUFFER);
        let (bench_tx, bench_rx) = mpsc::channel(BENCH_BUFFER);
        let (done_tx, done_rx) = oneshot::channel();
        (
            Orchestrator {
                cancel,
                findings,
                progress_tx,
                bench_tx,
                done_tx,
            },
            EventStream {
                progress: progress_rx,
                bench: bench_rx,
                done: done_rx,
            },
        )
    }

    /// Signal the shared cancellation scope. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Launch every probe as its own task, each wrapped by the benchmark
    /// instrumentation, and spawn the collector that emits the terminal
    /// signal after the last completion notification. Returns immediately.
    ///
    /// The collector is the only completion path: one notification per
    /// probe regardless of outcome, terminal once the count matches the
    /// number registered here. A probe's aggregator writes and its
    /// benchmark record are sequenced before its notification, so a
    /// snapshot taken on the terminal signal is complete.
    pub fn start(self, probes: Vec<Box<dyn Probe>>) {
        let count = probes.len();
        let (notify_tx, mut notify_rx) = mpsc::channel::<&'static str>(count.max(1));

        for probe in probes {
            let ctx = ProbeCtx {
                cancel: self.cancel.clone(),
                findings: Arc::clone(&self.findings),
                progress: ProgressReporter::new(probe.name(), self.progress_tx.clone()),
            };
            let bench_tx = self.bench_tx.clone();
            let notify = notify_tx.clone();
            tokio::spawn(async move {
                let record = bench::run_instrumented(probe.as_ref(), &ctx).await;
                log::debug!(
                    "probe {} finished: {:?} in {} ms",
                    record.module,
                    record.status,
                    record.duration_ms
                );
                // Fire-and-forget; a full bench buffer must not delay
                // completion counting.
                let _ = bench_tx.try_send(record);
                let _ = notify.send(ctx.progress.module()).await;
            });
        }
        drop(notify_tx);

        let done_tx = self.done_tx;
        tokio::spawn(async move {
            let mut seen = 0usize;
            while seen < count {
                match notify_rx.recv().await {
                    Some(module) => {
                        seen += 1;
                        log::debug!("completion {}/{} ({})", seen, count, module);
                    }
                    // All senders gone; every probe task has finished.
                    None => break,
                }
            }
            let _ = done_tx.send(());
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::BenchStatus;
    use crate::probe::{Pacing, ProbeOutcome};
    use async_trait::async_trait;
    use std::time::Duration;

    enum Behavior {
        /// Write one subdomain finding, emit full progress, complete.
        Finder(&'static str),
        /// Return a failed outcome without findings.
        Fail,
        /// Park on the cancellation token, then report cancelled.
        WaitForCancel,
    }

    struct FakeProbe {
        name: &'static str,
        behavior: Behavior,
    }

    #[async_trait]
    impl Probe for FakeProbe {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(&self, ctx: &ProbeCtx) -> ProbeOutcome {
            match &self.behavior {
                Behavior::Finder(fqdn) => {
                    ctx.findings.add_subdomain(*fqdn);
                    ctx.progress.emit(1.0);
                    ProbeOutcome::completed(1)
                }
                Behavior::Fail => ProbeOutcome::failed("simulated", 0),
                Behavior::WaitForCancel => {
                    ctx.progress.emit(0.5);
                    ctx.cancel.cancelled().await;
                    ProbeOutcome::cancelled(0)
                }
            }
        }
    }

    fn setup() -> (Arc<Findings>, CancellationToken) {
        (
            Arc::new(Findings::new("example.com")),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn terminal_fires_once_after_all_probes() {
        let (findings, cancel) = setup();
        let (orch, mut stream) = Orchestrator::new(Arc::clone(&findings), cancel);
        orch.start(vec![
            Box::new(FakeProbe {
                name: "a",
                behavior: Behavior::Finder("a.example.com"),
            }),
            Box::new(FakeProbe {
                name: "b",
                behavior: Behavior::Finder("b.example.com"),
            }),
            Box::new(FakeProbe {
                name: "c",
                behavior: Behavior::Fail,
            }),
        ]);

        stream.done.await.expect("terminal signal");

        // Snapshot taken on the terminal signal sees every probe's writes.
        let snap = findings.snapshot();
        assert!(snap.subdomains.contains("a.example.com"));
        assert!(snap.subdomains.contains("b.example.com"));

        // Exactly one benchmark record per probe, failure included.
        let mut records = Vec::new();
        while let Ok(rec) = stream.bench.try_recv() {
            records.push(rec);
        }
        assert_eq!(records.len(), 3);
        assert_eq!(
            records.iter().filter(|r| r.status == BenchStatus::Failed).count(),
            1
        );
    }

    #[tokio::test]
    async fn terminal_fires_for_empty_probe_set() {
        let (findings, cancel) = setup();
        let (orch, stream) = Orchestrator::new(findings, cancel);
        orch.start(Vec::new());
        stream.done.await.expect("terminal signal");
    }

    #[tokio::test]
    async fn cancellation_unwinds_every_probe_and_still_signals() {
        let (findings, cancel) = setup();
        let (orch, mut stream) = Orchestrator::new(findings, cancel.clone());
        orch.start(vec![
            Box::new(FakeProbe {
                name: "w1",
                behavior: Behavior::WaitForCancel,
            }),
            Box::new(FakeProbe {
                name: "w2",
                behavior: Behavior::WaitForCancel,
            }),
        ]);

        // Idempotent: repeated cancellation is the same as one.
        cancel.cancel();
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(5), &mut stream.done)
            .await
            .expect("terminal within bound")
            .expect("terminal signal");

        let mut statuses = Vec::new();
        while let Ok(rec) = stream.bench.try_recv() {
            statuses.push(rec.status);
        }
        assert_eq!(statuses, vec![BenchStatus::Cancelled, BenchStatus::Cancelled]);
    }

    #[tokio::test]
    async fn cancelled_probe_progress_stays_below_one() {
        let (findings, cancel) = setup();
        let (orch, mut stream) = Orchestrator::new(findings, cancel.clone());
        orch.start(vec![Box::new(FakeProbe {
            name: "w",
            behavior: Behavior::WaitForCancel,
        })]);
        cancel.cancel();
        stream.done.await.expect("terminal signal");

        let mut last = 0.0;
        while let Ok(ev) = stream.progress.try_recv() {
            assert!(ev.fraction >= last, "progress must be non-decreasing");
            last = ev.fraction;
        }
        assert!(last < 1.0);
    }

    #[tokio::test]
    async fn pacing_probe_cancels_promptly() {
        struct PacedProbe;

        #[async_trait]
        impl Probe for PacedProbe {
            fn name(&self) -> &'static str {
                "paced"
            }
            async fn run(&self, ctx: &ProbeCtx) -> ProbeOutcome {
                for _ in 0..100 {
                    if ctx.cancel.is_cancelled() {
                        return ProbeOutcome::cancelled(0);
                    }
                    Pacing::default().wait(&ctx.cancel).await;
                }
                ProbeOutcome::completed(0)
            }
        }

        let (findings, cancel) = setup();
        let (orch, stream) = Orchestrator::new(findings, cancel.clone());
        orch.start(vec![Box::new(PacedProbe)]);
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(2), stream.done)
            .await
            .expect("cancel pre-empts the pacing delay")
            .expect("terminal signal");
    }
}
