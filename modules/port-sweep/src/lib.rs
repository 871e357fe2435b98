//! TCP liveness probe: bounded-timeout connect attempts with pacing.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use recon_core::probe::{Pacing, Probe, ProbeCtx, ProbeOutcome};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Parse a comma-separated list of ports/ranges (e.g., "22,80,443", "1-1024,8080").
pub fn parse_ports(spec: &str) -> Result<Vec<u16>> {
    let mut ports = Vec::new();
    for part in spec.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if let Some((start, end)) = part.split_once('-') {
            let s: u16 = start.parse()?;
            let e: u16 = end.parse()?;
            if s == 0 || e == 0 || s > e {
                return Err(anyhow!("invalid port range: {}", part));
            }
            ports.extend(s..=e);
        } else {
            let p: u16 = part.parse()?;
            if p == 0 {
                return Err(anyhow!("invalid port: {}", part));
            }
            ports.push(p);
        }
    }
    ports.sort_unstable();
    ports.dedup();
    Ok(ports)
}

/// Ports probed when no spec is given.
pub fn default_ports() -> Vec<u16> {
    vec![80, 443, 22]
}

/// One paced step per candidate port; an accepted connection records the
/// port as open and is dropped immediately.
pub struct PortProbe {
    host: String,
    ports: Vec<u16>,
    connect_timeout: Duration,
    pacing: Pacing,
}

impl PortProbe {
    pub fn new(host: impl Into<String>, ports: Vec<u16>, connect_timeout: Duration) -> Self {
        PortProbe {
            host: host.into(),
            ports,
            connect_timeout,
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }
}

#[async_trait]
impl Probe for PortProbe {
    fn name(&self) -> &'static str {
        "Ports"
    }

    async fn run(&self, ctx: &ProbeCtx) -> ProbeOutcome {
        let total = self.ports.len() as f64;
        let mut requests = 0u64;
        for (i, &port) in self.ports.iter().enumerate() {
            if ctx.cancel.is_cancelled() {
                return ProbeOutcome::cancelled(requests);
            }
            self.pacing.wait(&ctx.cancel).await;
            if ctx.cancel.is_cancelled() {
                return ProbeOutcome::cancelled(requests);
            }
            requests += 1;
            let attempt = timeout(
                self.connect_timeout,
                TcpStream::connect((self.host.as_str(), port)),
            );
            tokio::select! {
                _ = ctx.cancel.cancelled() => return ProbeOutcome::cancelled(requests),
                res = attempt => {
                    // Refused or timed-out ports are no-findings, not errors.
                    if let Ok(Ok(stream)) = res {
                        ctx.findings.add_open_port(port);
                        drop(stream);
                    }
                }
            }
            ctx.progress.emit((i + 1) as f64 / total);
        }
        ProbeOutcome::completed(requests)
    }
}
