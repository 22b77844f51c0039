//! Engine configuration with sane defaults.
//!
//! Every struct is `serde(default)`, so a partial config file only overrides
//! the keys it names.

use serde::{Deserialize, Serialize};

use crate::types::EventType;

/// Full engine configuration: file-history scoring plus path assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub scoring: ScoringConfig,
  pub assess: AssessConfig,
}

/// Weights of the five scoring components. Defaults sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentWeights {
  pub recency: f64,
  pub frequency: f64,
  pub entropy: f64,
  pub correlation: f64,
  pub instability: f64,
}

impl Default for ComponentWeights {
  fn default() -> Self {
    Self {
      recency: 0.35,
      frequency: 0.2,
      entropy: 0.15,
      correlation: 0.15,
      instability: 0.15,
    }
  }
}

/// Fixed per-type weight applied on top of recency decay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventTypeWeights {
  pub workflow_crash: f64,
  pub reverted_pr: f64,
  pub rejected_pr: f64,
  pub architecture: f64,
}

impl EventTypeWeights {
  pub fn weight(&self, event_type: EventType) -> f64 {
    match event_type {
      EventType::WorkflowCrash => self.workflow_crash,
      EventType::RevertedPr => self.reverted_pr,
      EventType::RejectedPr => self.rejected_pr,
      EventType::Architecture => self.architecture,
    }
  }
}

impl Default for EventTypeWeights {
  fn default() -> Self {
    Self {
      workflow_crash: 1.0,
      reverted_pr: 0.75,
      rejected_pr: 0.4,
      architecture: 0.2,
    }
  }
}

/// Inclusive lower bounds of each tier above `ignorable`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
  pub normal: f64,
  pub need_context: f64,
  pub deep_context: f64,
  pub advanced: f64,
}

impl Default for TierThresholds {
  fn default() -> Self {
    Self {
      normal: 0.15,
      need_context: 0.3,
      deep_context: 0.5,
      advanced: 0.7,
    }
  }
}

/// Tunables for the per-file history scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
  pub weights: ComponentWeights,
  pub event_type_weights: EventTypeWeights,
  /// Days after which an event's recency weight halves.
  pub half_life_days: f64,
  /// Event count at which the frequency component saturates at 1.0.
  pub frequency_saturation: f64,
  /// Ascending lower bounds of severity bands 2..=4 (band 1 is everything below).
  pub severity_bands: [f64; 3],
  pub tiers: TierThresholds,
  /// Max keywords reported in signals.
  pub top_keywords: usize,
}

impl Default for ScoringConfig {
  fn default() -> Self {
    Self {
      weights: ComponentWeights::default(),
      event_type_weights: EventTypeWeights::default(),
      half_life_days: 30.0,
      frequency_saturation: 20.0,
      severity_bands: [0.3, 0.6, 0.8],
      tiers: TierThresholds::default(),
      top_keywords: 5,
    }
  }
}

/// Tunables for the change-submission path/historical classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessConfig {
  /// Directory substrings marking critical code paths.
  pub critical_paths: Vec<String>,
  pub critical_path_score: f64,
  /// Filename substrings marking sensitive files.
  pub sensitive_patterns: Vec<String>,
  pub sensitive_score: f64,
  /// CI failures strictly above this count add `ci_failure_bonus`.
  pub ci_failure_threshold: u32,
  pub ci_failure_bonus: f64,
  /// Reverted PRs strictly above this count add `reverted_pr_bonus`.
  pub reverted_pr_threshold: u32,
  pub reverted_pr_bonus: f64,
  /// Weekly changes strictly above this count add `change_frequency_bonus`.
  pub change_frequency_threshold: u32,
  pub change_frequency_bonus: f64,
  /// Scores at or above this block.
  pub block_threshold: f64,
  /// Scores at or above this (and below block) warn.
  pub warn_threshold: f64,
  /// Warn-level scores strictly above this still trigger notifications.
  pub notify_warn_above: f64,
}

impl Default for AssessConfig {
  fn default() -> Self {
    Self {
      critical_paths: ["auth/", "security/", "payments/", "infra/", "secrets/"]
        .iter()
        .map(|s| s.to_string())
        .collect(),
      critical_path_score: 0.4,
      sensitive_patterns: [".env", "config.prod", "credentials", "private"]
        .iter()
        .map(|s| s.to_string())
        .collect(),
      sensitive_score: 0.5,
      ci_failure_threshold: 3,
      ci_failure_bonus: 0.2,
      reverted_pr_threshold: 2,
      reverted_pr_bonus: 0.25,
      change_frequency_threshold: 10,
      change_frequency_bonus: 0.15,
      block_threshold: 0.7,
      warn_threshold: 0.3,
      notify_warn_above: 0.6,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_component_weights_sum_to_one() {
    let w = ComponentWeights::default();
    let sum = w.recency + w.frequency + w.entropy + w.correlation + w.instability;
    assert!((sum - 1.0).abs() < 1e-12);
  }

  #[test]
  fn partial_json_overrides_only_named_keys() {
    let cfg: Config =
      serde_json::from_str(r#"{"scoring":{"half_life_days":7.0},"assess":{"warn_threshold":0.25}}"#)
        .unwrap();
    assert_eq!(cfg.scoring.half_life_days, 7.0);
    assert_eq!(cfg.scoring.frequency_saturation, 20.0);
    assert_eq!(cfg.assess.warn_threshold, 0.25);
    assert_eq!(cfg.assess.block_threshold, 0.7);
    assert_eq!(cfg.assess.critical_paths.len(), 5);
  }
}
