//! Thread-safe store for a run's findings. Mutation happens through
//! discrete lock-scoped methods only; the lock is never held across a
//! network call and never handed to callers.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// Snapshot of everything discovered during one run. Owned by `Findings`
/// until the terminal signal; read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub target: String,
    pub timestamp: String,
    pub subdomains: BTreeSet<String>,
    pub open_ports: BTreeSet<u16>,
    pub headers: BTreeMap<String, String>,
    pub directories: Vec<String>,
    pub tls: BTreeMap<String, String>,
}

impl ReconReport {
    fn new(target: &str) -> Self {
        ReconReport {
            target: target.to_string(),
            timestamp: crate::now_rfc3339(),
            subdomains: BTreeSet::new(),
            open_ports: BTreeSet::new(),
            headers: BTreeMap::new(),
            directories: Vec::new(),
            tls: BTreeMap::new(),
        }
    }
}

pub struct Findings {
    inner: Mutex<ReconReport>,
}

impl Findings {
    pub fn new(target: &str) -> Self {
        Findings {
            inner: Mutex::new(ReconReport::new(target)),
        }
    }

    pub fn add_subdomain(&self, fqdn: impl Into<String>) {
        self.inner.lock().unwrap().subdomains.insert(fqdn.into());
    }

    pub fn add_open_port(&self, port: u16) {
        self.inner.lock().unwrap().open_ports.insert(port);
    }

    /// Header names are case-folded so lookups and the JSON snapshot are
    /// consistent regardless of server casing.
    pub fn set_header(&self, name: &str, value: impl Into<String>) {
        self.inner
            .lock()
            .unwrap()
            .headers
            .insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn add_directory(&self, url: impl Into<String>) {
        self.inner.lock().unwrap().directories.push(url.into());
    }

    pub fn set_tls_attr(&self, key: &str, value: impl Into<String>) {
        self.inner
            .lock()
            .unwrap()
            .tls
            .insert(key.to_string(), value.into());
    }

    /// Clone out the current report. Taken after the terminal signal this
    /// contains every probe's writes.
    pub fn snapshot(&self) -> ReconReport {
        self.inner.lock().unwrap().clone()
    }
}
