//! Directory probing: candidate paths distributed over a small fixed-size
//! worker pool sharing one queue, one bounded HEAD request per path.

use async_trait::async_trait;
use recon_core::probe::{Pacing, Probe, ProbeCtx, ProbeOutcome};
use recon_core::target::Target;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Paths tried when no list is given.
pub const DEFAULT_PATHS: &[&str] = &[".git", "robots.txt", "admin"];

pub const DEFAULT_WORKERS: usize = 2;

pub fn default_paths() -> Vec<String> {
    DEFAULT_PATHS.iter().map(|s| s.to_string()).collect()
}

/// One path per non-empty, non-comment line; falls back to the defaults.
pub fn load_paths(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(s) => {
            let paths: Vec<String> = s
                .lines()
                .map(|l| l.trim().trim_start_matches('/'))
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(str::to_string)
                .collect();
            if paths.is_empty() {
                default_paths()
            } else {
                paths
            }
        }
        Err(e) => {
            log::warn!("could not read path list {}: {}", path.display(), e);
            default_paths()
        }
    }
}

pub struct DirectoryProbe {
    client: Client,
    target: Target,
    base_url: String,
    paths: Vec<String>,
    workers: usize,
    pacing: Pacing,
}

impl DirectoryProbe {
    pub fn new(client: Client, target: Target, paths: Vec<String>, workers: usize) -> Self {
        let base_url = format!("https://{}", target.host());
        DirectoryProbe {
            client,
            target,
            base_url,
            paths,
            workers: workers.max(1),
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Override the probed origin. Tests point this at a local listener.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Probe for DirectoryProbe {
    fn name(&self) -> &'static str {
        "Directories"
    }

    async fn run(&self, ctx: &ProbeCtx) -> ProbeOutcome {
        let total = self.paths.len();
        if total == 0 {
            ctx.progress.emit(1.0);
            return ProbeOutcome::completed(0);
        }

        let queue = Arc::new(Mutex::new(VecDeque::from(self.paths.clone())));
        let finished = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(AtomicU64::new(0));
        let (step_tx, mut step_rx) = mpsc::channel::<()>(total);

        let mut set = JoinSet::new();
        for _ in 0..self.workers {
            let queue = Arc::clone(&queue);
            let finished = Arc::clone(&finished);
            let requests = Arc::clone(&requests);
            let step_tx = step_tx.clone();
            let cancel = ctx.cancel.clone();
            let findings = Arc::clone(&ctx.findings);
            let client = self.client.clone();
            let target = self.target.clone();
            let base = self.base_url.clone();
            let pacing = self.pacing;
            set.spawn(async move {
                loop {
                    if cancel.is_cancelled() {
                        return;
                    }
                    let path = queue.lock().unwrap().pop_front();
                    let Some(path) = path else { return };
                    pacing.wait(&cancel).await;
                    if cancel.is_cancelled() {
                        return;
                    }
                    let url = format!("{}/{}", base, path);
                    requests.fetch_add(1, Ordering::Relaxed);
                    let send = client
                        .head(&url)
                        .header(USER_AGENT, target.random_ua())
                        .send();
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        res = send => {
                            if let Ok(resp) = res {
                                if resp.status().as_u16() < 400 {
                                    findings.add_directory(url);
                                }
                            }
                        }
                    }
                    finished.fetch_add(1, Ordering::Relaxed);
                    let _ = step_tx.send(()).await;
                }
            });
        }
        drop(step_tx);

        // Progress is emitted from here so the fraction stays monotone no
        // matter how workers interleave.
        let mut steps = 0usize;
        while step_rx.recv().await.is_some() {
            steps += 1;
            ctx.progress.emit(steps as f64 / total as f64);
        }
        while set.join_next().await.is_some() {}

        let requests = requests.load(Ordering::Relaxed);
        if ctx.cancel.is_cancelled() && finished.load(Ordering::Relaxed) < total {
            return ProbeOutcome::cancelled(requests);
        }
        ctx.progress.emit(1.0);
        ProbeOutcome::completed(requests)
    }
}
