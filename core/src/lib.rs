//! Core engine for single-target recon runs: target configuration, the
//! probe abstraction, the findings aggregator, benchmarking, and the
//! orchestrator that fans probes out and signals completion.

use thiserror::Error;

pub mod aggregator;
pub mod bench;
pub mod events;
pub mod http;
pub mod orchestrator;
pub mod probe;
pub mod target;

pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Fatal startup problems. Everything past startup is a per-step
/// no-finding, never an error that crosses a component boundary.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("target host is required")]
    MissingTarget,
    #[error("user-agent file is required")]
    MissingUaFile,
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}
