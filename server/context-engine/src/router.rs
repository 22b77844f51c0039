//! Tier-driven context building.
//!
//! `ignorable` and `normal` are answered locally. Higher tiers issue one
//! retrieval query each, scoped and sized by the [`TierPolicy`]. Any retrieval
//! failure or timeout degrades that file to [`FALLBACK_CONTEXT`]; it never
//! fails the request or affects sibling files.

use std::sync::Arc;

use futures::future::join_all;
use risk_engine::{FileRiskResult, RiskEvent, Tier};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ContextError;
use crate::policy::{TierPolicy, TierQuery};
use crate::retrieval::{RetrievalResult, Retriever};

pub const FALLBACK_CONTEXT: &str = "Risk detected, but historical context is unavailable.";

const NO_DOCUMENTS: &str = "No context found.";

/// What a retrieval-backed context was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSources {
  /// Document types queried; empty when the query was unscoped.
  pub types: Vec<String>,
  /// Documents included in the context text.
  pub documents: usize,
  /// Index ids of the included documents, when the backend reports them.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRecord {
  pub file_path: String,
  pub risk_score: f64,
  pub tier: Tier,
  pub context: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sources: Option<ContextSources>,
}

impl ContextRecord {
  fn new(file: &str, result: &FileRiskResult, context: String, sources: Option<ContextSources>) -> Self {
    Self {
      file_path: file.to_string(),
      risk_score: result.final_risk_score,
      tier: result.tier,
      context,
      sources,
    }
  }

  pub fn is_fallback(&self) -> bool {
    self.context == FALLBACK_CONTEXT
  }
}

/// A scored file plus the history it was scored from.
#[derive(Debug, Clone)]
pub struct ScoredFile {
  pub result: FileRiskResult,
  pub events: Vec<RiskEvent>,
}

pub struct ContextRouter {
  retriever: Arc<dyn Retriever>,
  policy: TierPolicy,
}

impl ContextRouter {
  pub fn new(retriever: Arc<dyn Retriever>, policy: TierPolicy) -> Self {
    Self { retriever, policy }
  }

  pub fn policy(&self) -> &TierPolicy {
    &self.policy
  }

  /// Build the context for one file. Never fails.
  pub async fn build_context(
    &self,
    repo: &str,
    file: &str,
    result: &FileRiskResult,
    events: &[RiskEvent],
    change: &str,
  ) -> ContextRecord {
    self.build_context_as(repo, file, result, events, change, result.tier).await
  }

  /// Like [`build_context`](Self::build_context) but picks the strategy for
  /// `strategy` instead of the file's own tier. The record still reports the
  /// scored tier.
  pub async fn build_context_as(
    &self,
    repo: &str,
    file: &str,
    result: &FileRiskResult,
    events: &[RiskEvent],
    change: &str,
    strategy: Tier,
  ) -> ContextRecord {
    match self.try_build(repo, file, result, events, change, strategy).await {
      Ok(record) => record,
      Err(e) => {
        warn!(repo = %repo, file = %file, tier = %result.tier, reason = %e, "context fallback");
        ContextRecord::new(file, result, FALLBACK_CONTEXT.to_string(), None)
      }
    }
  }

  /// Build contexts for many files concurrently. Output order matches input.
  pub async fn build_contexts(&self, repo: &str, files: &[ScoredFile], change: &str) -> Vec<ContextRecord> {
    join_all(
      files
        .iter()
        .map(|f| self.build_context(repo, &f.result.file_path, &f.result, &f.events, change)),
    )
    .await
  }

  async fn try_build(
    &self,
    repo: &str,
    file: &str,
    result: &FileRiskResult,
    events: &[RiskEvent],
    change: &str,
    strategy: Tier,
  ) -> Result<ContextRecord, ContextError> {
    let query = match self.policy.query_for(strategy) {
      Some(q) => q,
      None if strategy == Tier::Ignorable => {
        let text = format!("No significant risk signals detected for {}.", file);
        return Ok(ContextRecord::new(file, result, text, None));
      }
      None => {
        let text = normal_context(result, events, self.policy.recent_events);
        return Ok(ContextRecord::new(file, result, text, None));
      }
    };

    let copy = TierCopy::for_tier(strategy);
    let text = format!("{} for {}. Change: {}", copy.query, file, change);
    let found = self.retrieve(repo, &text, query).await?;
    debug!(repo = %repo, file = %file, tier = %strategy, documents = found.documents.len(), "retrieved history");

    let shown: Vec<&str> = found.documents.iter().take(query.max_snippets).map(String::as_str).collect();
    let body = if shown.is_empty() {
      NO_DOCUMENTS.to_string()
    } else {
      shown.join("\n\n")
    };

    let context = format!("{}\n\n{}:\n{}", copy.headline, copy.section, body);
    let sources = ContextSources {
      types: query.types.clone().unwrap_or_default(),
      documents: shown.len(),
      ids: found.ids.iter().take(shown.len()).cloned().collect(),
    };
    Ok(ContextRecord::new(file, result, context, Some(sources)))
  }

  async fn retrieve(&self, repo: &str, text: &str, query: &TierQuery) -> Result<RetrievalResult, ContextError> {
    let timeout = self.policy.retrieval_timeout();
    let filter = query.filter();
    let call = self.retriever.query(repo, text, &filter, query.limit);
    match tokio::time::timeout(timeout, call).await {
      Ok(result) => result,
      Err(_) => Err(ContextError::Timeout(timeout)),
    }
  }
}

/// Fixed wording per retrieval tier.
struct TierCopy {
  query: &'static str,
  headline: &'static str,
  section: &'static str,
}

impl TierCopy {
  fn for_tier(tier: Tier) -> Self {
    match tier {
      Tier::AdvancedContextRetrieval => Self {
        query: "Deep historical analysis",
        headline: "High confidence risk.\n\nThis file has long-term instability correlated with failures.",
        section: "Evidence",
      },
      Tier::DeepContext => Self {
        query: "Historical risk patterns",
        headline: "Persistent instability detected.",
        section: "Signals",
      },
      _ => Self {
        query: "Recent issues related to",
        headline: "Risk detected due to instability.",
        section: "Relevant history",
      },
    }
  }
}

fn normal_context(result: &FileRiskResult, events: &[RiskEvent], recent: usize) -> String {
  let mut ordered: Vec<&RiskEvent> = events.iter().collect();
  ordered.sort_by_key(|e| e.created_at);
  let recent_lines: Vec<String> = ordered[ordered.len().saturating_sub(recent)..]
    .iter()
    .map(|e| format!("- {}", e.summary.as_deref().unwrap_or("no summary")))
    .collect();

  let dominant = result
    .signals
    .dominant_event_type
    .map(|t| t.as_str())
    .unwrap_or("none");

  format!(
    "Minor risk signals detected.\n\nDominant signal:\n- {}\n\nRecent events:\n{}",
    dominant,
    recent_lines.join("\n")
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::retrieval::RetrievalFilter;
  use async_trait::async_trait;
  use chrono::{Duration, TimeZone, Utc};
  use risk_engine::EventType;
  use std::sync::Mutex;

  /// Records every query and answers with fixed documents.
  #[derive(Default)]
  struct Recording {
    docs: Vec<String>,
    calls: Mutex<Vec<(String, RetrievalFilter, usize)>>,
  }

  #[async_trait]
  impl Retriever for Recording {
    async fn query(
      &self,
      _repo: &str,
      text: &str,
      filter: &RetrievalFilter,
      limit: usize,
    ) -> Result<RetrievalResult, ContextError> {
      self.calls.lock().unwrap().push((text.to_string(), filter.clone(), limit));
      Ok(RetrievalResult {
        documents: self.docs.iter().take(limit).cloned().collect(),
        ids: (0..self.docs.len().min(limit)).map(|i| format!("id-{i}")).collect(),
      })
    }
  }

  fn result(tier: Tier, score: f64) -> FileRiskResult {
    FileRiskResult {
      final_risk_score: score,
      tier,
      ..FileRiskResult::zero("src/a.ts")
    }
  }

  fn router(docs: usize) -> (Arc<Recording>, ContextRouter) {
    let r = Arc::new(Recording {
      docs: (0..docs).map(|i| format!("doc-{i}")).collect(),
      ..Default::default()
    });
    (r.clone(), ContextRouter::new(r, TierPolicy::default()))
  }

  #[tokio::test]
  async fn ignorable_makes_no_calls() {
    let (rec, router) = router(3);
    let out = router
      .build_context("acme/app", "src/a.ts", &result(Tier::Ignorable, 0.05), &[], "tweak")
      .await;
    assert_eq!(out.context, "No significant risk signals detected for src/a.ts.");
    assert!(rec.calls.lock().unwrap().is_empty());
    assert!(out.sources.is_none());
  }

  #[tokio::test]
  async fn normal_lists_recent_summaries_without_calls() {
    let (rec, router) = router(3);
    let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let events: Vec<RiskEvent> = (0..4)
      .map(|i| {
        let mut e = RiskEvent::new("acme/app", "src/a.ts", EventType::RevertedPr, 0.3, base + Duration::days(i));
        e.summary = Some(format!("event {i}"));
        e
      })
      .collect();
    let mut r = result(Tier::Normal, 0.2);
    r.signals.dominant_event_type = Some(EventType::RevertedPr);

    let out = router.build_context("acme/app", "src/a.ts", &r, &events, "tweak").await;
    assert!(out.context.contains("- reverted_pr"));
    assert!(out.context.contains("- event 2\n- event 3"));
    assert!(!out.context.contains("event 1"));
    assert!(rec.calls.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn need_context_scopes_query() {
    let (rec, router) = router(10);
    let out = router
      .build_context("acme/app", "src/a.ts", &result(Tier::NeedContext, 0.35), &[], "retry logic")
      .await;
    let calls = rec.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "Recent issues related to src/a.ts. Change: retry logic");
    assert_eq!(calls[0].1, RetrievalFilter::types(["workflow_crash", "reverted_pr"]));
    assert_eq!(calls[0].2, 6);
    assert!(out.context.starts_with("Risk detected due to instability."));
    assert_eq!(out.sources.as_ref().unwrap().documents, 6);
  }

  #[tokio::test]
  async fn advanced_is_unscoped_and_capped_at_ten() {
    let (rec, router) = router(30);
    let out = router
      .build_context("acme/app", "src/a.ts", &result(Tier::AdvancedContextRetrieval, 0.8), &[], "rewrite")
      .await;
    let calls = rec.calls.lock().unwrap();
    assert!(calls[0].1.is_unscoped());
    assert_eq!(calls[0].2, 25);
    assert!(out.context.contains("Evidence:\ndoc-0"));
    assert!(out.context.contains("doc-9"));
    assert!(!out.context.contains("doc-10"));
    let sources = out.sources.unwrap();
    assert_eq!(sources.documents, 10);
    assert_eq!(sources.ids.len(), 10);
    assert!(sources.types.is_empty());
  }

  #[tokio::test]
  async fn empty_retrieval_is_not_a_failure() {
    let (_, router) = router(0);
    let out = router
      .build_context("acme/app", "src/a.ts", &result(Tier::DeepContext, 0.55), &[], "x")
      .await;
    assert!(!out.is_fallback());
    assert!(out.context.ends_with("Signals:\nNo context found."));
  }
}
