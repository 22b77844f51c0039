//! Decision side effects: persist/publish every decision, notify on the risky ones.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use risk_engine::{ChangeDecision, Decision};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::SinkError;
use crate::stats::{agent_stats, AgentStats};

/// Published record of one request-level decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionEvent {
  pub id: Uuid,
  pub repo_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub agent: Option<String>,
  pub decision: Decision,
  pub risk_score: f64,
  pub reasons: Vec<String>,
  pub changed_files: Vec<String>,
  pub created_at: DateTime<Utc>,
}

impl DecisionEvent {
  pub fn new(decision: &ChangeDecision, created_at: DateTime<Utc>) -> Self {
    Self {
      id: Uuid::new_v4(),
      repo_id: decision.repo_id.clone(),
      agent: decision.agent.clone(),
      decision: decision.decision,
      risk_score: decision.risk_score,
      reasons: decision.reasons.clone(),
      changed_files: decision.changed_files.clone(),
      created_at,
    }
  }
}

#[async_trait]
pub trait DecisionSink: Send + Sync {
  /// Record the decision. Called for every decision.
  async fn publish(&self, event: &DecisionEvent) -> Result<(), SinkError>;

  /// Alert downstream channels. Called only when the decision asks for it.
  async fn notify(&self, event: &DecisionEvent) -> Result<(), SinkError>;
}

/// Sink that writes decisions to the log stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl DecisionSink for LogSink {
  async fn publish(&self, event: &DecisionEvent) -> Result<(), SinkError> {
    info!(
      id = %event.id,
      repo = %event.repo_id,
      agent = event.agent.as_deref().unwrap_or("-"),
      decision = event.decision.as_str(),
      score = event.risk_score,
      files = event.changed_files.len(),
      "decision recorded"
    );
    Ok(())
  }

  async fn notify(&self, event: &DecisionEvent) -> Result<(), SinkError> {
    warn!(
      id = %event.id,
      repo = %event.repo_id,
      decision = event.decision.as_str(),
      score = event.risk_score,
      reasons = ?event.reasons,
      "risky change flagged"
    );
    Ok(())
  }
}

/// Logs like [`LogSink`] and keeps the most recent decisions in memory for
/// per-agent statistics. The oldest entries are dropped past `capacity`.
#[derive(Debug)]
pub struct DecisionLog {
  capacity: usize,
  events: Mutex<VecDeque<DecisionEvent>>,
}

impl DecisionLog {
  pub fn new(capacity: usize) -> Self {
    Self {
      capacity: capacity.max(1),
      events: Mutex::new(VecDeque::new()),
    }
  }

  pub fn len(&self) -> usize {
    self.events.lock().map(|e| e.len()).unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn agent_stats(&self, agent: &str) -> AgentStats {
    let events: Vec<DecisionEvent> = match self.events.lock() {
      Ok(e) => e.iter().cloned().collect(),
      Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
    };
    agent_stats(&events, agent)
  }
}

#[async_trait]
impl DecisionSink for DecisionLog {
  async fn publish(&self, event: &DecisionEvent) -> Result<(), SinkError> {
    LogSink.publish(event).await?;
    let mut events = self
      .events
      .lock()
      .map_err(|_| SinkError("decision log lock poisoned".into()))?;
    if events.len() == self.capacity {
      events.pop_front();
    }
    events.push_back(event.clone());
    Ok(())
  }

  async fn notify(&self, event: &DecisionEvent) -> Result<(), SinkError> {
    LogSink.notify(event).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn event(agent: &str, decision: Decision) -> DecisionEvent {
    DecisionEvent {
      id: Uuid::new_v4(),
      repo_id: "acme/app".into(),
      agent: Some(agent.into()),
      decision,
      risk_score: 0.5,
      reasons: vec!["Critical path: auth/".into()],
      changed_files: vec!["src/auth/login.ts".into()],
      created_at: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
    }
  }

  #[tokio::test]
  async fn log_keeps_only_the_newest_entries() {
    let log = DecisionLog::new(2);
    log.publish(&event("cursor", Decision::Allow)).await.unwrap();
    log.publish(&event("cursor", Decision::Warn)).await.unwrap();
    log.publish(&event("cursor", Decision::Block)).await.unwrap();

    assert_eq!(log.len(), 2);
    let stats = log.agent_stats("cursor");
    assert_eq!(stats.total_assessments, 2);
    assert_eq!(stats.allowed, 0);
    assert_eq!(stats.risk_rate, 1.0);
  }
}
