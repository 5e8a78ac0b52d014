//! `fuelog`: command-line front end for the fuel log.
//!
//! # Usage
//!
//! ```text
//! fuelog vehicle add "Civic"
//! fuelog fill add <VEHICLE> --odometer 10300 --price 3.49 --quantity 9.8
//! fuelog stats <VEHICLE>
//! ```
//!
//! Configuration is read from `fuelog.toml` (or `--config`) and `FUELOG_*`
//! environment variables.

mod commands;
mod render;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use fuelog_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use commands::Command;
use settings::CliConfig;

#[derive(Parser, Debug)]
#[command(name = "fuelog", author, version, about = "Personal vehicle fill-up log")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "fuelog.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so command output stays pipeable.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let cfg = CliConfig::load(&cli.config)?;

  let store_path = cfg.resolved_store_path();
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  tracing::debug!(path = %store_path.display(), "opened store");

  commands::run(&store, cli.command).await
}
