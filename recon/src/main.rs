use anyhow::Result;
use clap::Parser;
use dir_probe::DirectoryProbe;
use fingerprint::FingerprintProbe;
use port_sweep::PortProbe;
use recon_core::aggregator::Findings;
use recon_core::events::{BenchStatus, BenchmarkRecord, EventStream};
use recon_core::orchestrator::Orchestrator;
use recon_core::probe::Probe;
use recon_core::target::{load_user_agents, Target};
use recon_core::ConfigError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use subdomain_enum::SubdomainProbe;
use tokio_util::sync::CancellationToken;

mod config;
mod logging;
mod report;

#[derive(Debug, Parser)]
#[command(name = "recon", version, about = "Single-target recon with live benchmarking")]
struct Cli {
    /// Target host or URL
    target: Option<String>,
    /// File with one user agent per non-empty, non-comment line (required)
    #[arg(long, value_name = "FILE")]
    ua_file: Option<PathBuf>,
    /// JSON snapshot path; the HTML report lands next to it
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
    /// SOCKS5 proxy address
    #[arg(long)]
    proxy: Option<String>,
    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Ports: comma/range list (e.g., 22,80,443 or 1-1024). Default: 80,443,22.
    #[arg(long)]
    ports: Option<String>,
    /// Subdomain label wordlist file
    #[arg(long, value_name = "FILE")]
    wordlist: Option<PathBuf>,
    /// Directory path list file
    #[arg(long, value_name = "FILE")]
    dir_paths: Option<PathBuf>,
    /// Directory probe worker count
    #[arg(long)]
    dir_workers: Option<usize>,
    /// Optional config file (YAML). If omitted, loads ./recon.yaml if present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
    /// Errors only
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);
    let cfg = config::load_config(cli.config.as_deref()).unwrap_or_default();

    // The only fatal errors: everything past this point is best-effort.
    let raw_target = cli.target.or(cfg.target).ok_or(ConfigError::MissingTarget)?;
    let ua_file = cli.ua_file.or(cfg.ua_file).ok_or(ConfigError::MissingUaFile)?;

    let output = cli
        .output
        .or(cfg.output)
        .unwrap_or_else(|| PathBuf::from("recon.json"));
    let timeout = Duration::from_millis(cli.timeout_ms.or(cfg.timeout_ms).unwrap_or(10_000));
    let ports = match cli.ports.or(cfg.ports) {
        Some(spec) => port_sweep::parse_ports(&spec)?,
        None => port_sweep::default_ports(),
    };
    let labels = cli
        .wordlist
        .or(cfg.wordlist)
        .map(|p| subdomain_enum::load_labels(&p))
        .unwrap_or_else(subdomain_enum::default_labels);
    let dir_paths = cli
        .dir_paths
        .or(cfg.dir_paths)
        .map(|p| dir_probe::load_paths(&p))
        .unwrap_or_else(dir_probe::default_paths);
    let dir_workers = cli
        .dir_workers
        .or(cfg.dir_workers)
        .unwrap_or(dir_probe::DEFAULT_WORKERS);

    let user_agents = load_user_agents(&ua_file);
    let target = Target::new(&raw_target, cli.proxy.or(cfg.proxy), timeout, user_agents);
    log::info!(
        "recon {} -> {} ({} user agents)",
        recon_core::version(),
        target.host(),
        target.user_agents().len()
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(target, ports, labels, dir_paths, dir_workers, output))
}

async fn run(
    target: Target,
    ports: Vec<u16>,
    labels: Vec<String>,
    dir_paths: Vec<String>,
    dir_workers: usize,
    output: PathBuf,
) -> Result<()> {
    let client = recon_core::http::build_client(&target)?;
    let findings = Arc::new(Findings::new(target.host()));
    let cancel = CancellationToken::new();

    // Ctrl-C cancels the run; probes report in as cancelled and the
    // snapshot still gets written.
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        log::warn!("interrupt received, cancelling probes");
        cancel_ctrlc.cancel();
    });

    let probes: Vec<Box<dyn Probe>> = vec![
        Box::new(SubdomainProbe::new(target.host(), labels)),
        Box::new(PortProbe::new(target.host(), ports, target.timeout())),
        Box::new(FingerprintProbe::new(client.clone(), target.clone())),
        Box::new(DirectoryProbe::new(
            client,
            target.clone(),
            dir_paths,
            dir_workers,
        )),
    ];

    let (orch, stream) = Orchestrator::new(Arc::clone(&findings), cancel.clone());
    orch.start(probes);

    let records = consume_events(stream).await;

    let snapshot = findings.snapshot();
    report::write_json(&output, &snapshot)?;
    let html = output.with_extension("html");
    report::write_html(&html, &snapshot, &records)?;
    log::info!(
        "{} subdomains, {} open ports, {} directories; wrote {} and {}",
        snapshot.subdomains.len(),
        snapshot.open_ports.len(),
        snapshot.directories.len(),
        output.display(),
        html.display()
    );
    Ok(())
}

/// Drain progress and benchmark streams until the terminal signal, then
/// sweep up anything still buffered.
async fn consume_events(mut stream: EventStream) -> Vec<BenchmarkRecord> {
    let mut records = Vec::new();
    let mut done = stream.done;
    loop {
        tokio::select! {
            Some(ev) = stream.progress.recv() => {
                log::debug!("[{}] {:.0}%", ev.module, ev.fraction * 100.0);
            }
            Some(rec) = stream.bench.recv() => {
                log_record(&rec);
                records.push(rec);
            }
            res = &mut done => {
                let _ = res;
                break;
            }
        }
    }
    while let Ok(rec) = stream.bench.try_recv() {
        log_record(&rec);
        records.push(rec);
    }
    records
}

fn log_record(rec: &BenchmarkRecord) {
    let status = match rec.status {
        BenchStatus::Done => "done",
        BenchStatus::Cancelled => "cancelled",
        BenchStatus::Failed => "failed",
    };
    log::info!(
        "[{}] {} in {} ms ({:.2} rps, {:+} KB)",
        rec.module,
        status,
        rec.duration_ms,
        rec.rps,
        rec.mem_delta_kb
    );
}
