//! Process settings (environment) and engine tuning (TOML file).

use std::path::{Path, PathBuf};

use anyhow::Context;
use context_engine::TierPolicy;
use risk_engine::{AssessConfig, Config, MemoryStore, ScoringConfig, Snapshot};
use serde::Deserialize;
use tracing::{info, warn};

const DEFAULT_PORT: u16 = 5005;

#[derive(Debug, Clone, Default)]
pub struct Settings {
  pub port: u16,
  /// TOML tuning file (`RISK_CONFIG`).
  pub config_path: Option<PathBuf>,
  /// JSON snapshot of events and file counters (`RISK_SNAPSHOT`).
  pub snapshot_path: Option<PathBuf>,
  /// Retrieval service base URL (`RETRIEVER_URL`). Unset disables retrieval.
  pub retriever_url: Option<String>,
  /// Overrides `context.retrieval_timeout_ms` (`RETRIEVER_TIMEOUT_MS`).
  pub retriever_timeout_ms: Option<u64>,
}

impl Settings {
  pub fn from_env() -> anyhow::Result<Self> {
    let port = match std::env::var("PORT") {
      Ok(p) => p.parse::<u16>().with_context(|| format!("PORT must be a valid u16, got {p:?}"))?,
      Err(_) => DEFAULT_PORT,
    };
    let retriever_timeout_ms = match std::env::var("RETRIEVER_TIMEOUT_MS") {
      Ok(v) => Some(v.parse::<u64>().context("RETRIEVER_TIMEOUT_MS must be an integer")?),
      Err(_) => None,
    };

    Ok(Self {
      port,
      config_path: std::env::var_os("RISK_CONFIG").map(PathBuf::from),
      snapshot_path: std::env::var_os("RISK_SNAPSHOT").map(PathBuf::from),
      retriever_url: std::env::var("RETRIEVER_URL").ok().filter(|u| !u.trim().is_empty()),
      retriever_timeout_ms,
    })
  }
}

/// Tuning file layout. Every section and key is optional.
///
/// ```toml
/// [scoring]
/// half_life_days = 14.0
///
/// [assess]
/// block_threshold = 0.8
///
/// [context]
/// retrieval_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
  pub scoring: ScoringConfig,
  pub assess: AssessConfig,
  pub context: TierPolicy,
}

impl FileConfig {
  pub fn parse(text: &str) -> anyhow::Result<Self> {
    Ok(toml::from_str(text)?)
  }

  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Self::parse(&text).with_context(|| format!("parsing {}", path.display()))
  }

  pub fn engine_config(&self) -> Config {
    Config {
      scoring: self.scoring.clone(),
      assess: self.assess.clone(),
    }
  }
}

/// Load the store from a snapshot file. Invalid events are skipped and logged.
pub fn load_snapshot(path: &Path) -> anyhow::Result<MemoryStore> {
  let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
  let snapshot: Snapshot =
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;

  let (store, skipped) = MemoryStore::from_snapshot(&snapshot);
  for (index, err) in &skipped {
    warn!(index, error = %err, "snapshot event skipped");
  }
  info!(
    path = %path.display(),
    events = store.event_count(),
    file_meta = store.file_meta_count(),
    skipped = skipped.len(),
    "snapshot loaded"
  );
  Ok(store)
}
