//! Storage seams: read-by-key interfaces the scorer depends on, plus an
//! in-memory implementation built from a JSON snapshot.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::EngineError;
use crate::normalize::{normalize_batch, normalize_path};
use crate::types::{FileMeta, FileMetaRecord, InboundEvent, RiskEvent};

/// Ordered event history per (repo, file).
pub trait EventSource: Send + Sync {
  /// Events for one file, oldest first. Unknown keys yield an empty list.
  fn events(&self, repo: &str, file_path: &str) -> Vec<RiskEvent>;
}

/// Historical counters per (repo, file).
pub trait FileMetaLookup: Send + Sync {
  fn file_meta(&self, repo_id: &str, file_path: &str) -> Option<FileMeta>;
}

impl<F> FileMetaLookup for F
where
  F: Fn(&str, &str) -> Option<FileMeta> + Send + Sync,
{
  fn file_meta(&self, repo_id: &str, file_path: &str) -> Option<FileMeta> {
    self(repo_id, file_path)
  }
}

/// Serialized store contents: raw upstream events plus file counters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
  #[serde(default)]
  pub events: Vec<InboundEvent>,
  #[serde(default)]
  pub file_meta: Vec<FileMetaRecord>,
}

type Key = (String, String);

fn key(repo: &str, file_path: &str) -> Key {
  (repo.to_string(), normalize_path(file_path))
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  events: HashMap<Key, Vec<RiskEvent>>,
  meta: HashMap<Key, FileMeta>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build from a snapshot. Events failing validation are skipped and
  /// returned alongside the store.
  pub fn from_snapshot(snapshot: &Snapshot) -> (Self, Vec<(usize, EngineError)>) {
    let mut store = Self::new();
    let (events, skipped) = normalize_batch(&snapshot.events);
    for e in events {
      store.record_event(e);
    }
    for rec in &snapshot.file_meta {
      store.upsert_file_meta(&rec.repo_id, &rec.file_path, rec.meta);
    }
    (store, skipped)
  }

  /// Append an event, keeping each file's history ordered by `created_at`.
  /// Events without a timestamp sort first so the scorer still sees them.
  pub fn record_event(&mut self, event: RiskEvent) {
    let list = self.events.entry(key(&event.repo, &event.file_path)).or_default();
    let pos = list.partition_point(|e| e.created_at <= event.created_at);
    list.insert(pos, event);
  }

  pub fn upsert_file_meta(&mut self, repo_id: &str, file_path: &str, meta: FileMeta) {
    self.meta.insert(key(repo_id, file_path), meta);
  }

  pub fn event_count(&self) -> usize {
    self.events.values().map(Vec::len).sum()
  }

  pub fn file_meta_count(&self) -> usize {
    self.meta.len()
  }
}

impl EventSource for MemoryStore {
  fn events(&self, repo: &str, file_path: &str) -> Vec<RiskEvent> {
    self.events.get(&key(repo, file_path)).cloned().unwrap_or_default()
  }
}

impl FileMetaLookup for MemoryStore {
  fn file_meta(&self, repo_id: &str, file_path: &str) -> Option<FileMeta> {
    self.meta.get(&key(repo_id, file_path)).copied()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::EventType;
  use chrono::{TimeZone, Utc};

  #[test]
  fn events_come_back_oldest_first() {
    let mut store = MemoryStore::new();
    let later = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
    let earlier = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    store.record_event(RiskEvent::new("r", "src/a.ts", EventType::WorkflowCrash, 0.9, later));
    store.record_event(RiskEvent::new("r", "./src/a.ts", EventType::RevertedPr, 0.4, earlier));

    let events = store.events("r", "src/a.ts");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, EventType::RevertedPr);
    assert!(store.events("r", "src/missing.ts").is_empty());
    assert!(store.events("other", "src/a.ts").is_empty());
  }

  #[test]
  fn snapshot_loads_and_reports_skipped() {
    let snapshot: Snapshot = serde_json::from_str(
      r#"{
        "events": [
          {"repo":"r","file_path":"src/a.ts","event_type":"workflow_crash","severity_score":0.9,"created_at":"2025-01-01T00:00:00Z"},
          {"repo":"r","file_path":"src/a.ts","event_type":"bogus","severity_score":0.9,"created_at":"2025-01-01T00:00:00Z"}
        ],
        "file_meta": [
          {"repo_id":"r","file_path":"src/a.ts","ci_failures":5,"reverted_prs":1}
        ]
      }"#,
    )
    .unwrap();

    let (store, skipped) = MemoryStore::from_snapshot(&snapshot);
    assert_eq!(store.event_count(), 1);
    assert_eq!(skipped.len(), 1);
    let meta = store.file_meta("r", "src/a.ts").unwrap();
    assert_eq!(meta.ci_failures, 5);
    assert_eq!(meta.change_frequency, 0);
  }
}
