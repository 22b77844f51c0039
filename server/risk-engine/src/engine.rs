//! Stateless engine facade: holds configuration and dispatches to the scorers.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::Config;
use crate::decision;
use crate::error::EngineError;
use crate::risk;
use crate::score;
use crate::store::{EventSource, FileMetaLookup};
use crate::types::*;

/// The risk engine. Holds only configuration; every call is pure.
#[derive(Debug, Clone, Default)]
pub struct Engine {
  config: Config,
}

/// Per-file results for a batch; invalid files are reported, not fatal.
#[derive(Debug, Clone, Default)]
pub struct ScoredFiles {
  pub results: Vec<FileRiskResult>,
  /// Event history each result was scored from, index-aligned with `results`.
  pub histories: Vec<Vec<RiskEvent>>,
  pub errors: Vec<FileError>,
}

impl Engine {
  pub fn new(config: Config) -> Self {
    Self { config }
  }

  pub fn with_defaults() -> Self {
    Self::new(Config::default())
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Score one file's event history at `now`.
  pub fn score_file(
    &self,
    file_path: &str,
    events: &[RiskEvent],
    now: DateTime<Utc>,
  ) -> Result<FileRiskResult, EngineError> {
    let result = score::score_file(file_path, events, now, &self.config.scoring)?;
    debug!(
      file = %file_path,
      events = events.len(),
      score = result.final_risk_score,
      tier = %result.tier,
      "scored file"
    );
    Ok(result)
  }

  /// Score each file from the event source. A file with an invalid event is
  /// listed in `errors` and the rest still score.
  pub fn score_files(
    &self,
    repo: &str,
    files: &[String],
    source: &dyn EventSource,
    now: DateTime<Utc>,
  ) -> ScoredFiles {
    let mut out = ScoredFiles::default();
    for file in files {
      let events = source.events(repo, file);
      match self.score_file(file, &events, now) {
        Ok(r) => {
          out.results.push(r);
          out.histories.push(events);
        }
        Err(e) => {
          warn!(repo = %repo, file = %file, error = %e, "file skipped: invalid event history");
          out.errors.push(FileError {
            file_path: file.clone(),
            message: e.to_string(),
          });
        }
      }
    }
    out
  }

  /// Path/historical assessment for a submitted change.
  pub fn assess(
    &self,
    repo_id: &str,
    changed_files: &[String],
    lookup: &dyn FileMetaLookup,
  ) -> RiskAssessment {
    risk::assess(repo_id, changed_files, lookup, &self.config.assess)
  }

  /// Score and assess every changed file, then fan in to one decision.
  pub fn decide(
    &self,
    repo_id: &str,
    agent: Option<&str>,
    changed_files: &[String],
    source: &dyn EventSource,
    lookup: &dyn FileMetaLookup,
    now: DateTime<Utc>,
  ) -> ChangeDecision {
    let assessment = self.assess(repo_id, changed_files, lookup);
    let scored = self.score_files(repo_id, changed_files, source, now);
    decision::aggregate(
      repo_id,
      agent,
      changed_files,
      assessment,
      scored.results,
      scored.errors,
      &self.config.assess,
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryStore;
  use chrono::{Duration, TimeZone};

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
  }

  fn store() -> MemoryStore {
    let mut s = MemoryStore::new();
    for i in 0..6 {
      let mut e = RiskEvent::new(
        "repo-1",
        "src/auth/login.ts",
        EventType::WorkflowCrash,
        if i % 2 == 0 { 0.9 } else { 0.2 },
        now() - Duration::days(i),
      );
      e.affected_files = vec!["src/auth/login.ts".into(), "src/auth/session.ts".into()];
      s.record_event(e);
    }
    let mut broken = RiskEvent::new("repo-1", "src/broken.ts", EventType::RevertedPr, 0.5, now());
    broken.created_at = None;
    s.record_event(broken);
    s.upsert_file_meta(
      "repo-1",
      "src/auth/login.ts",
      FileMeta {
        ci_failures: 5,
        reverted_prs: 3,
        change_frequency: 12,
      },
    );
    s
  }

  #[test]
  fn invalid_file_does_not_abort_batch() {
    let engine = Engine::with_defaults();
    let s = store();
    let files = vec!["src/auth/login.ts".to_string(), "src/broken.ts".to_string(), "src/new.ts".to_string()];
    let scored = engine.score_files("repo-1", &files, &s, now());
    assert_eq!(scored.results.len(), 2);
    assert_eq!(scored.errors.len(), 1);
    assert_eq!(scored.errors[0].file_path, "src/broken.ts");
    assert!(scored.errors[0].message.contains("created_at"));
    assert_eq!(scored.results[1].tier, Tier::Ignorable);
    assert_eq!(scored.histories.len(), 2);
    assert_eq!(scored.histories[0].len(), 6);
    assert!(scored.histories[1].is_empty());
  }

  #[test]
  fn decide_blocks_hot_auth_file() {
    let engine = Engine::with_defaults();
    let s = store();
    let d = engine.decide(
      "repo-1",
      Some("cursor"),
      &["src/auth/login.ts".to_string()],
      &s,
      &s,
      now(),
    );
    // 0.4 path + 0.2 + 0.25 + 0.15 history = 1.0
    assert_eq!(d.risk_score, 1.0);
    assert_eq!(d.decision, Decision::Block);
    assert!(d.notify);
    assert_eq!(d.reasons[0], "Critical path: auth/");
    assert!(d.reasons.iter().any(|r| r.starts_with("Historical risk")));
    assert_eq!(d.files.len(), 1);
  }
}
