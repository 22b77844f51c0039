//! Descriptive signals (dominant type/category, top keywords) for a file's history.
//!
//! Independent of the numeric components. Dominant-key ties resolve to the key
//! seen first in the input; callers must not rely on tie behaviour.

use std::collections::HashMap;
use std::hash::Hash;

use crate::types::{EventType, RiskEvent, RiskSignals};

/// Insertion-ordered occurrence counter.
struct Tally<K> {
  entries: Vec<(K, usize)>,
  index: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone> Tally<K> {
  fn new() -> Self {
    Self {
      entries: Vec::new(),
      index: HashMap::new(),
    }
  }

  fn add(&mut self, key: K) {
    match self.index.get(&key) {
      Some(&i) => self.entries[i].1 += 1,
      None => {
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, 1));
      }
    }
  }

  /// Highest count; the earliest-inserted key wins a tie.
  fn dominant(self) -> Option<K> {
    let mut best: Option<(K, usize)> = None;
    for (k, n) in self.entries {
      if best.as_ref().map_or(true, |(_, b)| n > *b) {
        best = Some((k, n));
      }
    }
    best.map(|(k, _)| k)
  }

  /// Keys by count descending; ties keep insertion order.
  fn top(mut self, limit: usize) -> Vec<K> {
    self.entries.sort_by(|a, b| b.1.cmp(&a.1));
    self.entries.into_iter().take(limit).map(|(k, _)| k).collect()
  }
}

pub fn extract(events: &[RiskEvent], top_keywords: usize) -> RiskSignals {
  let mut types: Tally<EventType> = Tally::new();
  let mut categories: Tally<&str> = Tally::new();
  let mut keywords: Tally<&str> = Tally::new();

  for e in events {
    types.add(e.event_type);
    if let Some(c) = e.risk_category.as_deref() {
      categories.add(c);
    }
    for k in &e.keywords {
      keywords.add(k.as_str());
    }
  }

  RiskSignals {
    dominant_event_type: types.dominant(),
    dominant_risk_category: categories.dominant().map(str::to_string),
    top_keywords: keywords.top(top_keywords).into_iter().map(str::to_string).collect(),
  }
}
