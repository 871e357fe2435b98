//! Immutable per-run configuration: target host, proxy, timeout, UA pool.

use rand::seq::SliceRandom;
use rand::thread_rng;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Fallback user agent when the supplied pool is empty or unreadable.
pub const SYNTHETIC_UA: &str = concat!("recon/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct Target {
    host: String,
    proxy: Option<String>,
    timeout: Duration,
    user_agents: Vec<String>,
}

impl Target {
    /// Build a target from a raw host string (URLs accepted, scheme and
    /// path stripped). An empty UA list falls back to one synthetic entry.
    pub fn new(
        raw: &str,
        proxy: Option<String>,
        timeout: Duration,
        mut user_agents: Vec<String>,
    ) -> Self {
        if user_agents.is_empty() {
            user_agents.push(SYNTHETIC_UA.to_string());
        }
        Target {
            host: extract_host(raw),
            proxy,
            timeout,
            user_agents,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn user_agents(&self) -> &[String] {
        &self.user_agents
    }

    /// Draw a random UA from the pool.
    pub fn random_ua(&self) -> &str {
        self.user_agents
            .choose(&mut thread_rng())
            .map(String::as_str)
            .unwrap_or(SYNTHETIC_UA)
    }
}

/// Extract a bare hostname from user input. Accepts `example.com`,
/// `https://example.com/path`, or a trailing-dot FQDN.
pub fn extract_host(raw: &str) -> String {
    let trimmed = raw.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    match Url::parse(&candidate) {
        Ok(url) => match url.host_str() {
            Some(h) => h.trim_end_matches('.').to_string(),
            None => strip_slashes(trimmed),
        },
        Err(_) => strip_slashes(trimmed),
    }
}

fn strip_slashes(raw: &str) -> String {
    raw.trim_end_matches('/').to_string()
}

/// Load one UA per non-empty, non-comment line. Unreadable files yield an
/// empty list so `Target::new` applies the synthetic fallback.
pub fn load_user_agents(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(s) => s
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect(),
        Err(e) => {
            log::warn!("could not read UA file {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn extracts_host_from_url() {
        assert_eq!(extract_host("https://example.com/"), "example.com");
        assert_eq!(extract_host("http://example.com/some/path"), "example.com");
        assert_eq!(extract_host("example.com"), "example.com");
        assert_eq!(extract_host("example.com."), "example.com");
    }

    #[test]
    fn ua_pool_skips_blank_and_comment_lines() {
        let mut f = tempfile();
        writeln!(f.1, "Mozilla/5.0 one").unwrap();
        writeln!(f.1, "Mozilla/5.0 two").unwrap();
        writeln!(f.1).unwrap();
        writeln!(f.1, "Mozilla/5.0 three").unwrap();
        f.1.flush().unwrap();
        let uas = load_user_agents(&f.0);
        assert_eq!(uas.len(), 3);
    }

    #[test]
    fn empty_ua_file_falls_back_to_synthetic() {
        let f = tempfile();
        let uas = load_user_agents(&f.0);
        assert!(uas.is_empty());
        let target = Target::new("example.com", None, Duration::from_secs(1), uas);
        assert_eq!(target.user_agents(), [SYNTHETIC_UA.to_string()]);
        assert_eq!(target.random_ua(), SYNTHETIC_UA);
    }

    #[test]
    fn random_ua_draws_from_pool() {
        let pool = vec!["a".to_string(), "b".to_string()];
        let target = Target::new("example.com", None, Duration::from_secs(1), pool.clone());
        for _ in 0..16 {
            assert!(pool.iter().any(|ua| ua == target.random_ua()));
        }
    }

    fn tempfile() -> (std::path::PathBuf, std::fs::File) {
        let path = std::env::temp_dir().join(format!(
            "recon-ua-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        let file = std::fs::File::create(&path).unwrap();
        (path, file)
    }
}
