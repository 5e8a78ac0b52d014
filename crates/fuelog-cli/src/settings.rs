//! Layered configuration: optional TOML file, then `FUELOG_*` environment
//! variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

/// Where the store lives unless configured otherwise.
pub const DEFAULT_STORE_PATH: &str = "~/.local/share/fuelog/fuelog.db";

/// Runtime configuration, deserialised from `fuelog.toml` and the
/// environment.
#[derive(Debug, Deserialize, Clone)]
pub struct CliConfig {
  pub store_path: PathBuf,
}

impl CliConfig {
  /// Load from `path` (which need not exist) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("store_path", DEFAULT_STORE_PATH)
      .context("failed to set configuration defaults")?
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("FUELOG"))
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    settings
      .try_deserialize()
      .context("failed to deserialise CliConfig")
  }

  /// The store path with a leading `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
