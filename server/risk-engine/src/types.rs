//! Core types for the risk engine (JSON contracts + internal models).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TierThresholds;

// ---------------------------------------------------------------------------
// Inbound types (JSON contract: what the caller sends)
// ---------------------------------------------------------------------------

/// One raw event record as stored upstream. Unknown fields are silently ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEvent {
  pub repo: String,
  pub file_path: String,
  #[serde(default)]
  pub affected_files: Option<Vec<String>>,
  pub event_type: String,
  #[serde(default)]
  pub event_source_id: Option<String>,
  pub severity_score: f64,
  #[serde(default)]
  pub severity_label: Option<String>,
  #[serde(default)]
  pub risk_category: Option<String>,
  #[serde(default)]
  pub keywords: Option<Vec<String>>,
  #[serde(default)]
  pub summary: Option<String>,
  #[serde(default)]
  pub created_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Event model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
  WorkflowCrash,
  RevertedPr,
  RejectedPr,
  Architecture,
}

impl EventType {
  pub fn parse(s: &str) -> Option<Self> {
    match s.to_ascii_lowercase().as_str() {
      "workflow_crash" => Some(Self::WorkflowCrash),
      "reverted_pr" => Some(Self::RevertedPr),
      "rejected_pr" => Some(Self::RejectedPr),
      "architecture" => Some(Self::Architecture),
      _ => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::WorkflowCrash => "workflow_crash",
      Self::RevertedPr => "reverted_pr",
      Self::RejectedPr => "rejected_pr",
      Self::Architecture => "architecture",
    }
  }
}

/// Upstream categorical severity. Carried for display; never used in scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLabel {
  Low,
  Medium,
  High,
  Critical,
}

impl SeverityLabel {
  pub fn parse(s: &str) -> Option<Self> {
    match s.to_ascii_lowercase().as_str() {
      "low" => Some(Self::Low),
      "medium" => Some(Self::Medium),
      "high" => Some(Self::High),
      "critical" => Some(Self::Critical),
      _ => None,
    }
  }
}

/// Canonical per-file incident record consumed by the scorer.
///
/// `created_at` is optional only so that a record lacking it can be represented;
/// the scorer rejects such records instead of defaulting them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEvent {
  pub repo: String,
  pub file_path: String,
  #[serde(default)]
  pub affected_files: Vec<String>,
  pub event_type: EventType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub event_source_id: Option<String>,
  pub severity_score: f64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub severity_label: Option<SeverityLabel>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub risk_category: Option<String>,
  #[serde(default)]
  pub keywords: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub summary: Option<String>,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

impl RiskEvent {
  /// Minimal event with the required fields set; optional metadata left empty.
  pub fn new(
    repo: impl Into<String>,
    file_path: impl Into<String>,
    event_type: EventType,
    severity_score: f64,
    created_at: DateTime<Utc>,
  ) -> Self {
    Self {
      repo: repo.into(),
      file_path: file_path.into(),
      affected_files: Vec::new(),
      event_type,
      event_source_id: None,
      severity_score,
      severity_label: None,
      risk_category: None,
      keywords: Vec::new(),
      summary: None,
      created_at: Some(created_at),
    }
  }
}

/// Historical counters for one (repo, file). Owned by the ingestion side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
  #[serde(default)]
  pub ci_failures: u32,
  #[serde(default)]
  pub reverted_prs: u32,
  #[serde(default)]
  pub change_frequency: u32,
}

/// FileMeta keyed by repo + path, as found in snapshots and CLI input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetaRecord {
  #[serde(default)]
  pub repo_id: String,
  pub file_path: String,
  #[serde(flatten)]
  pub meta: FileMeta,
}

// ---------------------------------------------------------------------------
// Scorer output
// ---------------------------------------------------------------------------

/// Discrete risk bucket driving retrieval cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
  Ignorable,
  Normal,
  NeedContext,
  DeepContext,
  AdvancedContextRetrieval,
}

impl Tier {
  /// Map a raw (unrounded) score onto a tier. Lower bounds are inclusive.
  pub fn from_score(score: f64, t: &TierThresholds) -> Self {
    if score < t.normal {
      Self::Ignorable
    } else if score < t.need_context {
      Self::Normal
    } else if score < t.deep_context {
      Self::NeedContext
    } else if score < t.advanced {
      Self::DeepContext
    } else {
      Self::AdvancedContextRetrieval
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Ignorable => "ignorable",
      Self::Normal => "normal",
      Self::NeedContext => "need_context",
      Self::DeepContext => "deep_context",
      Self::AdvancedContextRetrieval => "advanced_context_retrieval",
    }
  }

  /// Tiers at or above `need_context` consult the retrieval collaborator.
  pub fn needs_retrieval(self) -> bool {
    self >= Self::NeedContext
  }
}

impl std::fmt::Display for Tier {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskComponents {
  pub recency_weighted_risk: f64,
  pub frequency_score: f64,
  pub severity_entropy: f64,
  pub correlation_score: f64,
  pub instability_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskSignals {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub dominant_event_type: Option<EventType>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub dominant_risk_category: Option<String>,
  pub top_keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRiskResult {
  pub file_path: String,
  pub final_risk_score: f64,
  pub tier: Tier,
  pub components: RiskComponents,
  pub signals: RiskSignals,
}

impl FileRiskResult {
  pub fn zero(file_path: impl Into<String>) -> Self {
    Self {
      file_path: file_path.into(),
      final_risk_score: 0.0,
      tier: Tier::Ignorable,
      components: RiskComponents::default(),
      signals: RiskSignals::default(),
    }
  }
}

// ---------------------------------------------------------------------------
// Path / historical assessment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
  Allow,
  Warn,
  Block,
}

impl Decision {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Allow => "allow",
      Self::Warn => "warn",
      Self::Block => "block",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
  pub risk_score: f64,
  pub decision: Decision,
  pub reasons: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub evidence_ids: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Request-level decision
// ---------------------------------------------------------------------------

/// A file whose events could not be scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileError {
  pub file_path: String,
  pub message: String,
}

/// One decision for a submitted change, fanned in from per-file results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeDecision {
  pub repo_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub agent: Option<String>,
  pub changed_files: Vec<String>,
  pub decision: Decision,
  pub risk_score: f64,
  pub reasons: Vec<String>,
  pub files: Vec<FileRiskResult>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub errors: Vec<FileError>,
  /// Whether downstream notification side effects should fire.
  pub notify: bool,
}

// ---------------------------------------------------------------------------
// CLI stream wrappers
// ---------------------------------------------------------------------------

/// Structured error output for invalid input.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
      field: None,
    }
  }

  pub fn with_field(mut self, field: impl Into<String>) -> Self {
    self.field = Some(field.into());
    self
  }
}
