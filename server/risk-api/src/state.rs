//! Shared application state, wired from settings at startup.

use std::sync::Arc;
use std::time::Duration;

use context_engine::{ContextRouter, DecisionLog, Retriever, RiskService, UnavailableRetriever};
use risk_engine::{Engine, MemoryStore};
use tracing::{info, warn};

use crate::config::{load_snapshot, FileConfig, Settings};
use crate::retriever::HttpRetriever;

/// Decisions kept in memory for `/agent-stats`.
const DECISION_LOG_CAPACITY: usize = 10_000;

pub struct AppState {
  pub service: RiskService,
  pub decisions: Arc<DecisionLog>,
}

impl AppState {
  /// `decisions` must be the sink `service` publishes to.
  pub fn new(service: RiskService, decisions: Arc<DecisionLog>) -> Self {
    Self { service, decisions }
  }

  pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
    let mut file_config = match &settings.config_path {
      Some(path) => FileConfig::load(path)?,
      None => FileConfig::default(),
    };
    if let Some(ms) = settings.retriever_timeout_ms {
      file_config.context.retrieval_timeout_ms = ms;
    }

    let store = Arc::new(match &settings.snapshot_path {
      Some(path) => load_snapshot(path)?,
      None => {
        warn!("RISK_SNAPSHOT not set; starting with an empty store");
        MemoryStore::new()
      }
    });

    let retriever: Arc<dyn Retriever> = match &settings.retriever_url {
      Some(url) => {
        // Client timeout sits just above the per-file budget so the router's timer fires first.
        let budget = Duration::from_millis(file_config.context.retrieval_timeout_ms) + Duration::from_secs(1);
        let http = HttpRetriever::new(url, budget)?;
        info!(endpoint = %http.endpoint(), "retrieval enabled");
        Arc::new(http)
      }
      None => {
        warn!("RETRIEVER_URL not set; retrieval tiers will use fallback context");
        Arc::new(UnavailableRetriever)
      }
    };

    let decisions = Arc::new(DecisionLog::new(DECISION_LOG_CAPACITY));
    let service = RiskService::new(
      Engine::new(file_config.engine_config()),
      ContextRouter::new(retriever, file_config.context),
      store.clone(),
      store,
      decisions.clone(),
    );
    Ok(Self::new(service, decisions))
  }
}
