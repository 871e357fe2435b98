//! Shared outbound HTTP client. Built once per run and cloned into the
//! probes that need it; configuration is fixed at construction.

use crate::target::Target;
use anyhow::Result;
use reqwest::Client;
use std::time::Duration;

/// Build the run-wide client: relaxed certificate verification (recon
/// targets routinely present broken chains), keep-alive pooling, the
/// per-request timeout from the target, and an optional SOCKS5 proxy.
pub fn build_client(target: &Target) -> Result<Client> {
    let mut builder = Client::builder()
        .danger_accept_invalid_certs(true)
        .pool_max_idle_per_host(30)
        .pool_idle_timeout(Duration::from_secs(20))
        .timeout(target.timeout())
        .gzip(true)
        .brotli(true)
        .deflate(true);

    if let Some(proxy) = target.proxy() {
        let addr = if proxy.contains("://") {
            proxy.to_string()
        } else {
            format!("socks5://{proxy}")
        };
        builder = builder.proxy(reqwest::Proxy::all(&addr)?);
    }

    Ok(builder.build()?)
}
