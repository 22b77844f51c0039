//! Fan-in of per-file results into one request-level decision.
//!
//! No scoring happens here: the decision and score come from the path/historical
//! assessment, and file-history results only contribute reasons.

use crate::config::AssessConfig;
use crate::risk::NO_SIGNALS_REASON;
use crate::types::{ChangeDecision, Decision, FileError, FileRiskResult, RiskAssessment};

/// Whether a decision should fire downstream notifications.
pub fn should_notify(decision: Decision, risk_score: f64, config: &AssessConfig) -> bool {
  match decision {
    Decision::Block => true,
    Decision::Warn => risk_score > config.notify_warn_above,
    Decision::Allow => false,
  }
}

/// Reason line for a file whose history warrants retrieval.
fn history_reason(result: &FileRiskResult) -> Option<String> {
  result.tier.needs_retrieval().then(|| {
    format!(
      "Historical risk {} for {} (score {})",
      result.tier, result.file_path, result.final_risk_score
    )
  })
}

pub fn aggregate(
  repo_id: &str,
  agent: Option<&str>,
  changed_files: &[String],
  assessment: RiskAssessment,
  files: Vec<FileRiskResult>,
  errors: Vec<FileError>,
  config: &AssessConfig,
) -> ChangeDecision {
  let history: Vec<String> = files.iter().filter_map(history_reason).collect();

  let mut reasons = assessment.reasons;
  if !history.is_empty() && reasons.len() == 1 && reasons[0] == NO_SIGNALS_REASON {
    reasons.clear();
  }
  reasons.extend(history);

  ChangeDecision {
    repo_id: repo_id.to_string(),
    agent: agent.map(str::to_string),
    changed_files: changed_files.to_vec(),
    decision: assessment.decision,
    risk_score: assessment.risk_score,
    reasons,
    files,
    errors,
    notify: should_notify(assessment.decision, assessment.risk_score, config),
  }
}
