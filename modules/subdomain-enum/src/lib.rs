//! Subdomain discovery: paced name resolution of candidate labels under
//! the target host.

use async_trait::async_trait;
use recon_core::probe::{Pacing, Probe, ProbeCtx, ProbeOutcome};
use std::path::Path;
use tokio::net::lookup_host;

/// Labels tried when no wordlist is given.
pub const DEFAULT_LABELS: &[&str] = &["www", "api", "admin", "mail", "dev"];

pub fn default_labels() -> Vec<String> {
    DEFAULT_LABELS.iter().map(|s| s.to_string()).collect()
}

/// One label per non-empty, non-comment line. Unreadable files fall back
/// to the default list.
pub fn load_labels(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(s) => {
            let labels: Vec<String> = s
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(str::to_string)
                .collect();
            if labels.is_empty() {
                default_labels()
            } else {
                labels
            }
        }
        Err(e) => {
            log::warn!("could not read wordlist {}: {}", path.display(), e);
            default_labels()
        }
    }
}

pub struct SubdomainProbe {
    host: String,
    labels: Vec<String>,
    pacing: Pacing,
}

impl SubdomainProbe {
    pub fn new(host: impl Into<String>, labels: Vec<String>) -> Self {
        SubdomainProbe {
            host: host.into(),
            labels,
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }
}

#[async_trait]
impl Probe for SubdomainProbe {
    fn name(&self) -> &'static str {
        "Subdomains"
    }

    async fn run(&self, ctx: &ProbeCtx) -> ProbeOutcome {
        let total = self.labels.len() as f64;
        let mut requests = 0u64;
        for (i, label) in self.labels.iter().enumerate() {
            if ctx.cancel.is_cancelled() {
                return ProbeOutcome::cancelled(requests);
            }
            self.pacing.wait(&ctx.cancel).await;
            if ctx.cancel.is_cancelled() {
                return ProbeOutcome::cancelled(requests);
            }
            let fqdn = format!("{}.{}", label, self.host);
            requests += 1;
            let resolved = tokio::select! {
                _ = ctx.cancel.cancelled() => return ProbeOutcome::cancelled(requests),
                res = lookup_host((fqdn.as_str(), 0u16)) => {
                    // NXDOMAIN and resolver errors are no-findings.
                    res.map(|mut addrs| addrs.next().is_some()).unwrap_or(false)
                }
            };
            if resolved {
                ctx.findings.add_subdomain(fqdn);
            }
            ctx.progress.emit((i + 1) as f64 / total);
        }
        ProbeOutcome::completed(requests)
    }
}
