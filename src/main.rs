//! Wine quality - main entry point
//!
//! Serves predictions by default; `tune` and `sweep` run the offline
//! training jobs.

use clap::Parser;
use winequality::cli::{cmd_serve, cmd_sweep, cmd_tune, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // logs go to stderr so stdout carries only the job summaries
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "winequality=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { host, port, model }) => {
            cmd_serve(host, port, model).await?;
        }
        Some(Commands::Tune { data, tracking_dir, output }) => {
            tokio::task::spawn_blocking(move || cmd_tune(data, tracking_dir, output)).await??;
        }
        Some(Commands::Sweep { data, tracking_dir }) => {
            tokio::task::spawn_blocking(move || cmd_sweep(data, tracking_dir)).await??;
        }
        None => {
            cmd_serve(None, None, None).await?;
        }
    }

    Ok(())
}
