//! SketchML CLI Module
//!
//! Command-line interface for serving the playground backend and for
//! one-shot offline fits.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::data::{FitResult, Metrics, TrainingRequest};
use crate::session::SessionEngine;

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "sketchml")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interactive 2-D model playground backend")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP/WebSocket server (default)
    Serve {
        /// Bind address, overrides API_HOST
        #[arg(long)]
        host: Option<String>,

        /// Port, overrides PORT and API_PORT
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Fit one training request offline and print the result
    Fit {
        /// JSON file holding a training request
        file: PathBuf,

        /// Print the raw JSON payload only
        #[arg(long)]
        json: bool,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_serve(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    let mut config = ServerConfig::default();
    if let Some(host) = host {
        config = config.with_host(host);
    }
    if let Some(port) = port {
        config = config.with_port(port);
    }

    let base = format!("{}:{}", config.host, config.port);
    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "SketchML".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Train  ", &format!("ws://{}/ws/<session>", base)));
    line_box(&kv("Predict", &format!("http://{}/predict/<session>", base)));
    line_box(&kv("Health ", &format!("http://{}/health", base)));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    run_server(config).await
}

/// Read a training request from disk
pub fn load_request(path: &Path) -> anyhow::Result<TrainingRequest> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    let request = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("Invalid training request in {}: {}", path.display(), e))?;
    Ok(request)
}

/// Fit a request with a throwaway session
pub fn run_fit(request: &TrainingRequest) -> anyhow::Result<FitResult> {
    let engine = SessionEngine::default();
    Ok(engine.retrain("cli", request)?)
}

pub fn cmd_fit(file: &Path, json_only: bool) -> anyhow::Result<()> {
    let request = load_request(file)?;

    if json_only {
        let result = run_fit(&request)?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    section("Fit");
    println!("  {:<12} {}", muted("Algorithm"), request.algorithm.white());
    println!("  {:<12} {}", muted("Points"), request.points.len());

    step_run("Training");
    let start = Instant::now();
    let result = match run_fit(&request) {
        Ok(result) => result,
        Err(err) => {
            println!("{}", "failed".red());
            return Err(err);
        }
    };
    step_done(&format!("{:.1} ms", start.elapsed().as_secs_f64() * 1000.0));

    section("Metrics");
    print_metrics(&result.metrics);

    section("Parameters");
    println!("  {}", serde_json::to_string(&result.parameters)?);
    println!();
    Ok(())
}

fn print_metrics(metrics: &Metrics) {
    match metrics {
        Metrics::Regression { mse, r_squared } => {
            println!("  {:<12} {:.6}", muted("MSE"), mse);
            println!("  {:<12} {:.6}", muted("R²"), r_squared);
        }
        Metrics::Classification { accuracy, confusion_matrix } => {
            println!("  {:<12} {}", muted("Accuracy"), ok(&format!("{:.4}", accuracy)));
            for row in confusion_matrix {
                let cells: Vec<String> = row.iter().map(|c| format!("{:>4}", c)).collect();
                println!("  {:<12} {}", "", cells.join(" "));
            }
        }
        Metrics::Clustering { inertia } => {
            println!("  {:<12} {:.6}", muted("Inertia"), inertia);
        }
    }
}
