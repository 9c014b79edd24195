//! Command-line interface for serving and the training jobs

use clap::{Parser, Subcommand};
use colored::*;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use crate::jobs::{self, JobConfig, SweepConfig};
use crate::server::{run_server, ServerConfig};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) {
    println!("  {:<22} {}", muted(key), val.white());
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
    let _ = std::io::stdout().flush();
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "winequality")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Wine quality prediction service and training jobs")]
#[command(long_about = None)]
pub struct Cli {
    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve predictions over HTTP
    Serve {
        /// Bind address [env: API_HOST, default 0.0.0.0]
        #[arg(long)]
        host: Option<String>,

        /// Bind port [env: API_PORT, default 5000]
        #[arg(short, long)]
        port: Option<u16>,

        /// Model artifact to load [env: MODEL_PATH]
        #[arg(short, long)]
        model: Option<PathBuf>,
    },

    /// Grid-search ridge regression and record the best model
    Tune {
        /// Dataset CSV [env: DATA_PATH, default winequality.csv]
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Experiment tracking directory [env: TRACKING_DIR, default mlruns]
        #[arg(long)]
        tracking_dir: Option<PathBuf>,

        /// Also write the winning artifact here, e.g. for serving
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fit standardized linear regression variants, one run each
    Sweep {
        /// Dataset CSV [env: DATA_PATH, default winequality.csv]
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Experiment tracking directory [env: TRACKING_DIR, default mlruns]
        #[arg(long)]
        tracking_dir: Option<PathBuf>,
    },
}

fn job_config(base: JobConfig, data: Option<PathBuf>, tracking_dir: Option<PathBuf>) -> JobConfig {
    let config = match data {
        Some(path) => base.with_data_path(path),
        None => base,
    };
    match tracking_dir {
        Some(dir) => config.with_tracking_dir(dir),
        None => config,
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_serve(
    host: Option<String>,
    port: Option<u16>,
    model: Option<PathBuf>,
) -> anyhow::Result<()> {
    let defaults = ServerConfig::default();
    let config = ServerConfig {
        host: host.unwrap_or(defaults.host),
        port: port.unwrap_or(defaults.port),
        model_path: model.unwrap_or(defaults.model_path),
    };
    run_server(config).await
}

pub fn cmd_tune(
    data: Option<PathBuf>,
    tracking_dir: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = job_config(JobConfig::tune(), data, tracking_dir);

    section("Tune");
    step_run(&format!("Searching ridge grid on {}", config.data_path.display()));
    let start = Instant::now();
    let report = jobs::run_grid_search(&config)?;
    step_done(&format!(
        "{} candidates, {} train / {} test rows in {:.2?}",
        report.n_candidates,
        report.n_train,
        report.n_test,
        start.elapsed()
    ));

    let params = report.best_params;
    println!();
    kv(
        "Best Parameters",
        &format!(
            "alpha={} fit_intercept={} solver={}",
            params.alpha, params.fit_intercept, params.solver
        ),
    );
    kv("Best CV Score (MSE)", &format!("{:.6}", report.best_cv_mse));
    kv("Test MSE", &format!("{:.6}", report.test_mse));
    kv("Test R2", &format!("{:.6}", report.test_r2));
    kv("Run", &report.run_id);

    if let Some(path) = output {
        report.artifact.save(&path)?;
        step_ok(&format!("Wrote serving artifact → {}", path.display()));
    }
    println!();
    Ok(())
}

pub fn cmd_sweep(data: Option<PathBuf>, tracking_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let config = job_config(JobConfig::sweep(), data, tracking_dir);
    jobs::run_linear_sweep(&config, &SweepConfig::standard())?;
    Ok(())
}
