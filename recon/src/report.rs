//! Run artifacts: the JSON snapshot and an HTML report with a per-probe
//! duration/throughput chart.

use anyhow::Result;
use recon_core::aggregator::ReconReport;
use recon_core::events::BenchmarkRecord;
use std::fs;
use std::path::Path;

pub fn write_json(path: &Path, report: &ReconReport) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(report)?)?;
    Ok(())
}

pub fn write_html(path: &Path, report: &ReconReport, records: &[BenchmarkRecord]) -> Result<()> {
    fs::write(path, render_html(report, records))?;
    Ok(())
}

pub fn render_html(report: &ReconReport, records: &[BenchmarkRecord]) -> String {
    let mut s = String::new();
    s.push_str("<!DOCTYPE html><html><head><title>Recon Report</title>\n");
    s.push_str("<style>body{font:14px monospace;background:#000;color:#0f0;padding:20px;}\n");
    s.push_str("table,th,td{border:1px solid #0f0;border-collapse:collapse;padding:8px;}\n");
    s.push_str("canvas{border:1px solid #0f0;}</style>\n");
    s.push_str("<script src=\"https://cdn.jsdelivr.net/npm/chart.js\"></script>\n");
    s.push_str("</head><body>\n");
    s.push_str(&format!("<h1>Recon Report</h1>\n<p><b>Target:</b> {} | <b>Time:</b> {}</p>\n",
        escape(&report.target), escape(&report.timestamp)));

    s.push_str("<h2>Performance Benchmark</h2>\n");
    s.push_str("<canvas id=\"benchChart\" width=\"800\" height=\"400\"></canvas>\n<script>\n");
    let labels = records
        .iter()
        .map(|r| format!("\"{}\"", r.module))
        .collect::<Vec<_>>()
        .join(",");
    let durations = records
        .iter()
        .map(|r| r.duration_ms.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let rps = records
        .iter()
        .map(|r| format!("{:.2}", r.rps))
        .collect::<Vec<_>>()
        .join(",");
    s.push_str("const ctx = document.getElementById('benchChart').getContext('2d');\n");
    s.push_str("new Chart(ctx, { type: 'bar', data: {\n");
    s.push_str(&format!("  labels: [{labels}],\n"));
    s.push_str("  datasets: [\n");
    s.push_str(&format!(
        "    {{ label: 'Duration (ms)', data: [{durations}], backgroundColor: '#0f0' }},\n"
    ));
    s.push_str(&format!(
        "    {{ label: 'RPS', data: [{rps}], backgroundColor: '#0ff', yAxisID: 'y1' }}\n"
    ));
    s.push_str("  ]\n}, options: { scales: { y1: { position: 'right' } } } });\n</script>\n");

    s.push_str("<h2>Subdomains</h2>\n<ul>\n");
    for sub in &report.subdomains {
        s.push_str(&format!("<li>{}</li>\n", escape(sub)));
    }
    s.push_str("</ul>\n<h2>Open Ports</h2>\n<ul>\n");
    for port in &report.open_ports {
        s.push_str(&format!("<li>{port}</li>\n"));
    }
    s.push_str("</ul>\n<h2>Headers</h2>\n<table>\n");
    for (name, value) in &report.headers {
        s.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            escape(name),
            escape(value)
        ));
    }
    s.push_str("</table>\n<h2>Directories</h2>\n<ul>\n");
    for dir in &report.directories {
        s.push_str(&format!("<li>{}</li>\n", escape(dir)));
    }
    s.push_str("</ul>\n<h2>TLS</h2>\n<table>\n");
    for (key, value) in &report.tls {
        s.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            escape(key),
            escape(value)
        ));
    }
    s.push_str("</table>\n</body></html>\n");
    s
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
