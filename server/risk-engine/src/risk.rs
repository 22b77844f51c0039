//! Change-submission risk: static path patterns plus historical file counters.

use crate::config::AssessConfig;
use crate::store::FileMetaLookup;
use crate::types::{Decision, FileMeta, RiskAssessment};

pub const NO_SIGNALS_REASON: &str = "No risk signals detected";

/// Path-pattern contribution for one file.
///
/// Critical paths are checked first and the first hit ends the check; the
/// sensitive-filename list only applies to files outside every critical path.
/// Within each list the first hit wins.
pub fn path_risk(file_path: &str, config: &AssessConfig) -> (f64, Option<String>) {
  let p = file_path.to_lowercase();

  if let Some(critical) = config.critical_paths.iter().find(|c| p.contains(c.as_str())) {
    return (config.critical_path_score, Some(format!("Critical path: {}", critical)));
  }
  if let Some(sensitive) = config.sensitive_patterns.iter().find(|s| p.contains(s.as_str())) {
    return (config.sensitive_score, Some(format!("Sensitive file pattern: {}", sensitive)));
  }

  (0.0, None)
}

/// Historical contribution; every exceeded threshold adds its bonus.
pub fn historical_risk(meta: &FileMeta, config: &AssessConfig) -> (f64, Vec<String>) {
  let mut score = 0.0;
  let mut reasons = Vec::new();

  if meta.ci_failures > config.ci_failure_threshold {
    score += config.ci_failure_bonus;
    reasons.push(format!("High CI failure count: {}", meta.ci_failures));
  }
  if meta.reverted_prs > config.reverted_pr_threshold {
    score += config.reverted_pr_bonus;
    reasons.push(format!("Multiple reverted PRs: {}", meta.reverted_prs));
  }
  if meta.change_frequency > config.change_frequency_threshold {
    score += config.change_frequency_bonus;
    reasons.push(format!("High change frequency: {}/week", meta.change_frequency));
  }

  (score, reasons)
}

pub fn score_to_decision(score: f64, config: &AssessConfig) -> Decision {
  if score >= config.block_threshold {
    Decision::Block
  } else if score >= config.warn_threshold {
    Decision::Warn
  } else {
    Decision::Allow
  }
}

/// Assess a set of changed files. Contributions are summed over files, then
/// averaged by file count and clamped to [0, 1].
pub fn assess(
  repo_id: &str,
  changed_files: &[String],
  lookup: &dyn FileMetaLookup,
  config: &AssessConfig,
) -> RiskAssessment {
  let mut total = 0.0;
  let mut reasons = Vec::new();

  for file in changed_files {
    let (score, path_reason) = path_risk(file, config);
    total += score;
    reasons.extend(path_reason);

    if let Some(meta) = lookup.file_meta(repo_id, file) {
      let (score, history_reasons) = historical_risk(&meta, config);
      total += score;
      reasons.extend(history_reasons);
    }
  }

  let normalized = (total / changed_files.len().max(1) as f64).clamp(0.0, 1.0);
  let decision = score_to_decision(normalized, config);

  if reasons.is_empty() {
    reasons.push(NO_SIGNALS_REASON.to_string());
  }

  RiskAssessment {
    risk_score: round2(normalized),
    decision,
    reasons,
    evidence_ids: None,
  }
}

fn round2(v: f64) -> f64 {
  (v * 100.0).round() / 100.0
}
