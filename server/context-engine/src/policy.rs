//! Per-tier retrieval policy: how much history each tier is allowed to pull.

use std::time::Duration;

use risk_engine::Tier;
use serde::{Deserialize, Serialize};

use crate::retrieval::RetrievalFilter;

/// One retrieval tier's query shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierQuery {
  /// Document types to search; `None` searches everything.
  #[serde(default)]
  pub types: Option<Vec<String>>,
  /// Max documents requested from the retriever.
  pub limit: usize,
  /// Max documents formatted into the context block.
  pub max_snippets: usize,
}

impl TierQuery {
  fn scoped(types: &[&str], limit: usize, max_snippets: usize) -> Self {
    Self {
      types: Some(types.iter().map(|t| t.to_string()).collect()),
      limit,
      max_snippets,
    }
  }

  pub fn filter(&self) -> RetrievalFilter {
    RetrievalFilter {
      types: self.types.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierPolicy {
  /// Recent event summaries shown for the `normal` tier.
  pub recent_events: usize,
  pub need_context: TierQuery,
  pub deep_context: TierQuery,
  pub advanced: TierQuery,
  /// Per-file budget for one retrieval call.
  pub retrieval_timeout_ms: u64,
  /// Files scoring strictly above this are listed as critical in the advisory.
  pub critical_score: f64,
  /// Single-file assessments scoring strictly above this attach retrieval evidence.
  pub evidence_score: f64,
}

impl Default for TierPolicy {
  fn default() -> Self {
    Self {
      recent_events: 2,
      need_context: TierQuery::scoped(&["workflow_crash", "reverted_pr"], 6, 6),
      deep_context: TierQuery::scoped(&["workflow_crash", "reverted_pr", "rejected_pr", "issue"], 12, 8),
      advanced: TierQuery {
        types: None,
        limit: 25,
        max_snippets: 10,
      },
      retrieval_timeout_ms: 10_000,
      critical_score: 0.6,
      evidence_score: 0.5,
    }
  }
}

impl TierPolicy {
  /// Query shape for tiers that retrieve; `None` for the local-only tiers.
  pub fn query_for(&self, tier: Tier) -> Option<&TierQuery> {
    match tier {
      Tier::Ignorable | Tier::Normal => None,
      Tier::NeedContext => Some(&self.need_context),
      Tier::DeepContext => Some(&self.deep_context),
      Tier::AdvancedContextRetrieval => Some(&self.advanced),
    }
  }

  pub fn retrieval_timeout(&self) -> Duration {
    Duration::from_millis(self.retrieval_timeout_ms)
  }
}
