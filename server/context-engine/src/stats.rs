//! Per-agent decision statistics folded from published decision events.

use risk_engine::Decision;
use serde::Serialize;

use crate::sink::DecisionEvent;

/// Recent decisions included in [`AgentStats::recent_activity`].
pub const RECENT_ACTIVITY: usize = 5;

const DANGEROUS_BLOCKS: usize = 5;
const SUSPICIOUS_WARNS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
  Normal,
  Suspicious,
  Dangerous,
}

impl RiskLevel {
  /// More than 5 blocks is dangerous; otherwise more than 10 warnings is suspicious.
  pub fn classify(blocked: usize, warned: usize) -> Self {
    if blocked > DANGEROUS_BLOCKS {
      Self::Dangerous
    } else if warned > SUSPICIOUS_WARNS {
      Self::Suspicious
    } else {
      Self::Normal
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentStats {
  pub agent: String,
  pub total_assessments: usize,
  pub allowed: usize,
  pub warned: usize,
  pub blocked: usize,
  /// `(warned + blocked) / total`, 0 with no history.
  pub risk_rate: f64,
  pub risk_level: RiskLevel,
  /// Newest first.
  pub recent_activity: Vec<DecisionEvent>,
}

/// Fold the decisions made for `agent`. `events` may hold any mix of agents.
pub fn agent_stats(events: &[DecisionEvent], agent: &str) -> AgentStats {
  let mut mine: Vec<&DecisionEvent> = events
    .iter()
    .filter(|e| e.agent.as_deref() == Some(agent))
    .collect();

  let (mut allowed, mut warned, mut blocked) = (0, 0, 0);
  for e in &mine {
    match e.decision {
      Decision::Allow => allowed += 1,
      Decision::Warn => warned += 1,
      Decision::Block => blocked += 1,
    }
  }

  let total = mine.len();
  let risk_rate = if total == 0 {
    0.0
  } else {
    (warned + blocked) as f64 / total as f64
  };

  mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));

  AgentStats {
    agent: agent.to_string(),
    total_assessments: total,
    allowed,
    warned,
    blocked,
    risk_rate,
    risk_level: RiskLevel::classify(blocked, warned),
    recent_activity: mine.into_iter().take(RECENT_ACTIVITY).cloned().collect(),
  }
}
