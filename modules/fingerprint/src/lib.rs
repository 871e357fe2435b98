//! HTTP fingerprinting: one request to the target root, response headers
//! copied into the findings with case-folded names.

use async_trait::async_trait;
use recon_core::probe::{Probe, ProbeCtx, ProbeOutcome};
use recon_core::target::Target;
use reqwest::header::USER_AGENT;
use reqwest::Client;

pub struct FingerprintProbe {
    client: Client,
    target: Target,
    base_url: String,
}

impl FingerprintProbe {
    pub fn new(client: Client, target: Target) -> Self {
        let base_url = format!("https://{}", target.host());
        FingerprintProbe {
            client,
            target,
            base_url,
        }
    }

    /// Override the probed origin. Tests point this at a local listener.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Probe for FingerprintProbe {
    fn name(&self) -> &'static str {
        "Fingerprint"
    }

    /// Single step: progress jumps straight from 0 to 1.
    async fn run(&self, ctx: &ProbeCtx) -> ProbeOutcome {
        if ctx.cancel.is_cancelled() {
            return ProbeOutcome::cancelled(0);
        }
        let request = self
            .client
            .get(&self.base_url)
            .header(USER_AGENT, self.target.random_ua())
            .send();
        tokio::select! {
            _ = ctx.cancel.cancelled() => return ProbeOutcome::cancelled(1),
            res = request => match res {
                Ok(resp) => {
                    let headers = resp.headers();
                    for name in headers.keys() {
                        let joined = headers
                            .get_all(name)
                            .iter()
                            .filter_map(|v| v.to_str().ok())
                            .collect::<Vec<_>>()
                            .join(", ");
                        ctx.findings.set_header(name.as_str(), joined);
                    }
                    if self.base_url.starts_with("https://") {
                        ctx.findings
                            .set_tls_attr("http_version", format!("{:?}", resp.version()));
                    }
                }
                // Unreachable origin: no findings, still a normal completion.
                Err(e) => log::debug!("fingerprint request failed: {}", e),
            }
        }
        ctx.progress.emit(1.0);
        ProbeOutcome::completed(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_core::aggregator::Findings;
    use recon_core::events::ProgressReporter;
    use recon_core::probe::ProbeStatus;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::{mpsc, oneshot};
    use tokio_util::sync::CancellationToken;

    fn ctx() -> ProbeCtx {
        let (tx, _rx) = mpsc::channel(8);
        ProbeCtx {
            cancel: CancellationToken::new(),
            findings: Arc::new(Findings::new("127.0.0.1")),
            progress: ProgressReporter::new("Fingerprint", tx),
        }
    }

    fn target() -> Target {
        Target::new(
            "127.0.0.1",
            None,
            Duration::from_secs(2),
            vec!["ua-one".to_string(), "ua-two".to_string()],
        )
    }

    /// Serve one canned HTTP/1.1 response and hand back the raw request.
    async fn one_shot_server(response: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (req_tx, req_rx) = oneshot::channel();
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = vec![0u8; 4096];
                let n = stream.read(&mut buf).await.unwrap_or(0);
                let _ = req_tx.send(String::from_utf8_lossy(&buf[..n]).to_string());
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });
        (format!("http://{}", addr), req_rx)
    }

    #[tokio::test]
    async fn copies_headers_case_folded() {
        let (base, req_rx) = one_shot_server(
            "HTTP/1.1 200 OK\r\nServer: testsrv\r\nX-Powered-By: rust\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let probe = FingerprintProbe::new(Client::new(), target()).with_base_url(base);
        let ctx = ctx();
        let outcome = probe.run(&ctx).await;
        assert_eq!(outcome.status, ProbeStatus::Completed);
        assert_eq!(outcome.requests, 1);

        let snap = ctx.findings.snapshot();
        assert_eq!(snap.headers.get("server").map(String::as_str), Some("testsrv"));
        assert_eq!(
            snap.headers.get("x-powered-by").map(String::as_str),
            Some("rust")
        );
        // Plain-http origin: no TLS attributes recorded.
        assert!(snap.tls.is_empty());

        // The outbound UA comes from the configured pool.
        let raw = req_rx.await.unwrap();
        assert!(raw.contains("ua-one") || raw.contains("ua-two"));
    }

    #[tokio::test]
    async fn unreachable_origin_is_a_normal_completion() {
        // Bind-and-drop leaves a port nothing is listening on.
        let port = {
            let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
            l.local_addr().unwrap().port()
        };
        let probe = FingerprintProbe::new(Client::new(), target())
            .with_base_url(format!("http://127.0.0.1:{port}"));
        let ctx = ctx();
        let outcome = probe.run(&ctx).await;
        assert_eq!(outcome.status, ProbeStatus::Completed);
        assert!(ctx.findings.snapshot().headers.is_empty());
    }

    #[tokio::test]
    async fn cancellation_short_circuits() {
        let probe = FingerprintProbe::new(Client::new(), target());
        let ctx = ctx();
        ctx.cancel.cancel();
        let outcome = probe.run(&ctx).await;
        assert_eq!(outcome.status, ProbeStatus::Cancelled);
    }
}
