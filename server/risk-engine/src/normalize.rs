//! Normalize inbound event records into canonical RiskEvent models.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use crate::error::EngineError;
use crate::types::*;

/// Parse and validate an InboundEvent into a RiskEvent.
///
/// A missing `created_at` is carried through as `None`; the scorer rejects it.
/// A present but unparseable one fails here.
pub fn normalize(raw: &InboundEvent) -> Result<RiskEvent, EngineError> {
  if raw.repo.trim().is_empty() {
    return Err(EngineError::validation("repo", "must not be empty"));
  }
  let file_path = normalize_path(&raw.file_path);
  if file_path.is_empty() {
    return Err(EngineError::validation("file_path", "must not be empty"));
  }

  let event_type = EventType::parse(&raw.event_type).ok_or_else(|| {
    EngineError::validation(
      "event_type",
      "expected workflow_crash|reverted_pr|rejected_pr|architecture",
    )
  })?;

  if !raw.severity_score.is_finite() || !(0.0..=1.0).contains(&raw.severity_score) {
    return Err(EngineError::validation("severity_score", "must be within [0, 1]"));
  }

  let severity_label = match &raw.severity_label {
    Some(l) => Some(
      SeverityLabel::parse(l)
        .ok_or_else(|| EngineError::validation("severity_label", "expected low|medium|high|critical"))?,
    ),
    None => None,
  };

  let created_at = match &raw.created_at {
    Some(ts) => Some(parse_timestamp(ts).ok_or_else(|| {
      EngineError::validation("created_at", &format!("invalid timestamp: {}", ts))
    })?),
    None => None,
  };

  let affected_files = raw
    .affected_files
    .as_deref()
    .unwrap_or_default()
    .iter()
    .map(|f| normalize_path(f))
    .filter(|f| !f.is_empty())
    .collect();

  let keywords = raw
    .keywords
    .as_deref()
    .unwrap_or_default()
    .iter()
    .map(|k| k.trim().to_string())
    .filter(|k| !k.is_empty())
    .collect();

  Ok(RiskEvent {
    repo: raw.repo.trim().to_string(),
    file_path,
    affected_files,
    event_type,
    event_source_id: raw.event_source_id.clone(),
    severity_score: raw.severity_score,
    severity_label,
    risk_category: raw
      .risk_category
      .as_ref()
      .map(|c| c.trim().to_string())
      .filter(|c| !c.is_empty()),
    keywords,
    summary: raw.summary.clone(),
    created_at,
  })
}

/// Normalize a batch, skipping records that fail validation.
///
/// Returns the valid events plus `(index, error)` for every skipped record.
pub fn normalize_batch(raws: &[InboundEvent]) -> (Vec<RiskEvent>, Vec<(usize, EngineError)>) {
  let mut events = Vec::with_capacity(raws.len());
  let mut skipped = Vec::new();
  for (i, raw) in raws.iter().enumerate() {
    match normalize(raw) {
      Ok(e) => events.push(e),
      Err(e) => {
        warn!(index = i, repo = %raw.repo, file = %raw.file_path, error = %e, "skipping invalid event");
        skipped.push((i, e));
      }
    }
  }
  (events, skipped)
}

/// RFC 3339, or a naive `YYYY-MM-DD HH:MM:SS[.f]` read as UTC (database text form).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  let s = s.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    .map(|naive| naive.and_utc())
}

/// Normalize a file path for stable lookup:
/// - backslash -> forward slash
/// - collapse repeated slashes
/// - strip leading ./
///
/// Case is preserved; paths are store keys.
pub fn normalize_path(p: &str) -> String {
  let s = p.trim().replace('\\', "/");
  let mut out = String::with_capacity(s.len());
  let mut prev_slash = false;
  for ch in s.chars() {
    if ch == '/' {
      if !prev_slash {
        out.push('/');
      }
      prev_slash = true;
    } else {
      prev_slash = false;
      out.push(ch);
    }
  }
  out.strip_prefix("./").unwrap_or(&out).to_string()
}
