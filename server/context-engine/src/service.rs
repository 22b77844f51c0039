//! Request orchestration: score, route, fan in, fire side effects.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use risk_engine::{
  ChangeDecision, Engine, EventSource, FileError, FileMetaLookup, FileRiskResult, RiskAssessment, Tier,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::advisory::compose_advisory;
use crate::router::{ContextRecord, ContextRouter, ScoredFile};
use crate::sink::{DecisionEvent, DecisionSink};

/// How much work `analyze` does per request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
  /// Scores and tiers only; the router is never called.
  #[default]
  Score,
  /// Scores plus per-file context records and the aggregate advisory.
  Full,
}

#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
  pub repo: String,
  pub count: usize,
  pub results: Vec<FileRiskResult>,
  pub errors: Vec<FileError>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub records: Option<Vec<ContextRecord>>,
  /// Aggregate advisory text.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub context: Option<String>,
}

/// Path/historical assessment of one file, with retrieved evidence when the
/// assessment is high enough to warrant it.
#[derive(Debug, Clone, Serialize)]
pub struct FileAnalysis {
  pub file_path: String,
  #[serde(flatten)]
  pub assessment: RiskAssessment,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub context: Option<ContextRecord>,
}

/// A decision plus the identity it was published under.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionOutcome {
  pub id: Uuid,
  pub created_at: DateTime<Utc>,
  #[serde(flatten)]
  pub decision: ChangeDecision,
}

pub struct RiskService {
  engine: Engine,
  router: ContextRouter,
  events: Arc<dyn EventSource>,
  file_meta: Arc<dyn FileMetaLookup>,
  sink: Arc<dyn DecisionSink>,
}

impl RiskService {
  pub fn new(
    engine: Engine,
    router: ContextRouter,
    events: Arc<dyn EventSource>,
    file_meta: Arc<dyn FileMetaLookup>,
    sink: Arc<dyn DecisionSink>,
  ) -> Self {
    Self {
      engine,
      router,
      events,
      file_meta,
      sink,
    }
  }

  pub fn engine(&self) -> &Engine {
    &self.engine
  }

  pub async fn analyze(
    &self,
    repo: &str,
    files: &[String],
    change: &str,
    mode: Mode,
    now: DateTime<Utc>,
  ) -> Analysis {
    let scored = self.engine.score_files(repo, files, self.events.as_ref(), now);

    let (records, context) = match mode {
      Mode::Score => (None, None),
      Mode::Full => {
        let inputs: Vec<ScoredFile> = scored
          .results
          .iter()
          .zip(&scored.histories)
          .map(|(result, events)| ScoredFile {
            result: result.clone(),
            events: events.clone(),
          })
          .collect();
        let records = self.router.build_contexts(repo, &inputs, change).await;
        let advisory = compose_advisory(&records, change, self.router.policy().critical_score);
        (Some(records), Some(advisory))
      }
    };

    info!(
      repo = %repo,
      mode = ?mode,
      scored = scored.results.len(),
      errors = scored.errors.len(),
      "risk analysis complete"
    );

    Analysis {
      repo: repo.to_string(),
      count: scored.results.len(),
      results: scored.results,
      errors: scored.errors,
      records,
      context,
    }
  }

  /// Assess one file. Above the policy's evidence score the file's history is
  /// retrieved (at least at `need_context` depth) and the returned document
  /// ids become `evidence_ids`.
  pub async fn analyze_file(&self, repo: &str, file: &str, change: &str, now: DateTime<Utc>) -> FileAnalysis {
    let assessment = self
      .engine
      .assess(repo, &[file.to_string()], self.file_meta.as_ref());

    let mut analysis = FileAnalysis {
      file_path: file.to_string(),
      assessment,
      context: None,
    };
    if analysis.assessment.risk_score <= self.router.policy().evidence_score {
      return analysis;
    }

    let events = self.events.events(repo, file);
    let result = match self.engine.score_file(file, &events, now) {
      Ok(r) => r,
      Err(e) => {
        warn!(repo = %repo, file = %file, error = %e, "evidence skipped: invalid event history");
        return analysis;
      }
    };

    let strategy = result.tier.max(Tier::NeedContext);
    let record = self
      .router
      .build_context_as(repo, file, &result, &events, change, strategy)
      .await;
    analysis.assessment.evidence_ids = record
      .sources
      .as_ref()
      .map(|s| s.ids.clone())
      .filter(|ids| !ids.is_empty());
    analysis.context = Some(record);
    analysis
  }

  /// Decide on a change and fire side effects. Sink failures are logged and
  /// never change the returned decision.
  pub async fn decide(
    &self,
    repo_id: &str,
    agent: Option<&str>,
    changed_files: &[String],
    now: DateTime<Utc>,
  ) -> DecisionOutcome {
    let decision = self.engine.decide(
      repo_id,
      agent,
      changed_files,
      self.events.as_ref(),
      self.file_meta.as_ref(),
      now,
    );
    let event = DecisionEvent::new(&decision, now);

    if let Err(e) = self.sink.publish(&event).await {
      warn!(id = %event.id, repo = %repo_id, error = %e, "decision publish failed");
    }
    if decision.notify {
      if let Err(e) = self.sink.notify(&event).await {
        warn!(id = %event.id, repo = %repo_id, error = %e, "decision notify failed");
      }
    }

    DecisionOutcome {
      id: event.id,
      created_at: event.created_at,
      decision,
    }
  }
}
