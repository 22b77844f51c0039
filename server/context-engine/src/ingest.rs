//! Turn raw repository incidents into risk events via an upstream analyzer.
//!
//! The analyzer (an LLM classification step in production) returns loosely
//! typed JSON. Each result is schema-checked here; a bad result, a rate limit
//! or any other generation failure skips that one incident and the batch
//! carries on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use risk_engine::normalize::normalize_path;
use risk_engine::types::SeverityLabel;
use risk_engine::{EventType, RiskEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::IngestError;

/// One raw incident (crash, reverted PR, ...) awaiting classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
  pub id: String,
  pub event_type: EventType,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
  /// Source payload handed to the analyzer untouched.
  #[serde(default)]
  pub payload: Value,
}

/// Structured analyzer output for one incident.
#[derive(Debug, Clone, Deserialize)]
pub struct IncidentAnalysis {
  pub main_cause_file: String,
  #[serde(default)]
  pub cause_files: Vec<String>,
  pub critical_score: f64,
  pub critical_label: String,
  pub short_explanation: String,
  #[serde(default)]
  pub keywords: Vec<String>,
  #[serde(default)]
  pub risk_category: Option<String>,
}

impl IncidentAnalysis {
  pub fn parse(value: Value) -> Result<Self, IngestError> {
    let analysis: Self = serde_json::from_value(value)?;
    if analysis.main_cause_file.trim().is_empty() {
      return Err(IngestError::schema("main_cause_file", "must not be empty"));
    }
    if !analysis.critical_score.is_finite() || !(0.0..=1.0).contains(&analysis.critical_score) {
      return Err(IngestError::schema("critical_score", "must be within [0, 1]"));
    }
    if SeverityLabel::parse(&analysis.critical_label).is_none() {
      return Err(IngestError::schema("critical_label", "expected low|medium|high|critical"));
    }
    Ok(analysis)
  }
}

#[async_trait]
pub trait IncidentAnalyzer: Send + Sync {
  async fn analyze(&self, repo: &str, incident: &Incident) -> Result<Value, IngestError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedIncident {
  pub incident_id: String,
  pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
  pub events: Vec<RiskEvent>,
  pub skipped: Vec<SkippedIncident>,
}

/// Classify incidents one at a time, buffering the events that validate.
pub async fn build_event_buffer(
  repo: &str,
  incidents: &[Incident],
  analyzer: &dyn IncidentAnalyzer,
) -> IngestReport {
  let mut report = IngestReport::default();

  for incident in incidents {
    match analyze_one(repo, incident, analyzer).await {
      Ok(event) => report.events.push(event),
      Err(e) => {
        match &e {
          IngestError::RateLimited(_) => {
            warn!(repo = %repo, incident = %incident.id, error = %e, "rate limited; incident skipped")
          }
          _ => warn!(repo = %repo, incident = %incident.id, error = %e, "incident skipped"),
        }
        report.skipped.push(SkippedIncident {
          incident_id: incident.id.clone(),
          reason: e.to_string(),
        });
      }
    }
  }

  info!(
    repo = %repo,
    events = report.events.len(),
    skipped = report.skipped.len(),
    "incident batch processed"
  );
  report
}

async fn analyze_one(
  repo: &str,
  incident: &Incident,
  analyzer: &dyn IncidentAnalyzer,
) -> Result<RiskEvent, IngestError> {
  let created_at = incident
    .created_at
    .ok_or_else(|| IngestError::schema("created_at", "incident has no timestamp"))?;

  let analysis = IncidentAnalysis::parse(analyzer.analyze(repo, incident).await?)?;

  Ok(RiskEvent {
    repo: repo.to_string(),
    file_path: normalize_path(&analysis.main_cause_file),
    affected_files: analysis.cause_files.iter().map(|f| normalize_path(f)).collect(),
    event_type: incident.event_type,
    event_source_id: Some(incident.id.clone()),
    severity_score: analysis.critical_score,
    severity_label: SeverityLabel::parse(&analysis.critical_label),
    risk_category: analysis.risk_category,
    keywords: analysis.keywords,
    summary: Some(analysis.short_explanation),
    created_at: Some(created_at),
  })
}
