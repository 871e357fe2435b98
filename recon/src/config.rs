#![allow(dead_code)]
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Optional YAML config merged under the CLI flags.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    pub target: Option<String>,
    pub ua_file: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub proxy: Option<String>,
    pub timeout_ms: Option<u64>,
    pub ports: Option<String>,
    pub wordlist: Option<PathBuf>,
    pub dir_paths: Option<PathBuf>,
    pub dir_workers: Option<usize>,
}

pub fn load_config(path: Option<&Path>) -> Option<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = Path::new("recon.yaml");
            if p.exists() { p.to_path_buf() } else { return None; }
        }
    };
    let s = fs::read_to_string(path).ok()?;
    serde_yaml::from_str(&s).ok()
}
