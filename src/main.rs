mod api;
mod app;
mod cache;
mod commands;
mod config;
mod db;
mod diff;
mod outcome;
mod render;
mod repository;
mod session;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "storyteller")]
#[command(about = "Share and browse location-tagged stories from the terminal")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/storyteller/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Story service base URL, overriding the config file
  #[arg(long)]
  base_url: Option<String>,

  #[command(subcommand)]
  command: commands::Command,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Override base URL if specified on command line
  if let Some(base_url) = args.base_url {
    config.api.base_url = base_url;
  }

  let _guard = init_logging(&config.data_dir()?)?;

  let app = app::App::new(config)?;
  let ok = app.run(args.command).await?;

  Ok(if ok {
    ExitCode::SUCCESS
  } else {
    ExitCode::FAILURE
  })
}

/// Log to a daily file under the data directory; stdout is for command output.
///
/// Filter with `STORYTELLER_LOG` (e.g. `STORYTELLER_LOG=storyteller=debug`).
fn init_logging(data_dir: &Path) -> Result<WorkerGuard> {
  let log_dir = data_dir.join("logs");
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let appender = tracing_appender::rolling::daily(&log_dir, "storyteller.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter =
    EnvFilter::try_from_env("STORYTELLER_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}
