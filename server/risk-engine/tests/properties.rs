//! Property tests for the history scorer.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use risk_engine::{Engine, EventType, RiskEvent, Tier};

fn now() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
}

fn event_type() -> impl Strategy<Value = EventType> {
  prop_oneof![
    Just(EventType::WorkflowCrash),
    Just(EventType::RevertedPr),
    Just(EventType::RejectedPr),
    Just(EventType::Architecture),
  ]
}

prop_compose! {
  fn risk_event()(
    kind in event_type(),
    severity in 0.0f64..=1.0,
    age_hours in -48i64..24 * 400,
    spread in 0usize..4,
  ) -> RiskEvent {
    let mut e = RiskEvent::new("repo", "src/a.ts", kind, severity, now() - Duration::hours(age_hours));
    e.affected_files = (0..spread).map(|i| format!("src/f{i}.ts")).collect();
    e
  }
}

fn in_unit(v: f64) -> bool {
  v.is_finite() && (0.0..=1.0).contains(&v)
}

proptest! {
  #[test]
  fn every_output_is_in_unit_range(events in prop::collection::vec(risk_event(), 0..40)) {
    let r = Engine::with_defaults().score_file("src/a.ts", &events, now()).unwrap();
    prop_assert!(in_unit(r.final_risk_score));
    prop_assert!(in_unit(r.components.recency_weighted_risk));
    prop_assert!(in_unit(r.components.frequency_score));
    prop_assert!(in_unit(r.components.severity_entropy));
    prop_assert!(in_unit(r.components.correlation_score));
    prop_assert!(in_unit(r.components.instability_score));
    prop_assert!(r.signals.top_keywords.len() <= 5);
  }

  #[test]
  fn scoring_is_idempotent(events in prop::collection::vec(risk_event(), 0..20)) {
    let engine = Engine::with_defaults();
    let a = engine.score_file("src/a.ts", &events, now()).unwrap();
    let b = engine.score_file("src/a.ts", &events, now()).unwrap();
    prop_assert_eq!(a, b);
  }

  #[test]
  fn single_event_score_is_monotonic_in_severity(
    base in risk_event(),
    lo in 0.0f64..=1.0,
    bump in 0.0f64..=1.0,
  ) {
    let hi = (lo + bump).min(1.0);
    let engine = Engine::with_defaults();
    let mut low = base.clone();
    low.severity_score = lo;
    let mut high = base;
    high.severity_score = hi;
    let a = engine.score_file("src/a.ts", &[low], now()).unwrap();
    let b = engine.score_file("src/a.ts", &[high], now()).unwrap();
    prop_assert!(b.final_risk_score >= a.final_risk_score);
  }

  #[test]
  fn uniform_severity_raise_never_lowers_score(
    events in prop::collection::vec(risk_event(), 1..15),
    bump in 0.0f64..=0.5,
  ) {
    // All events share one severity, so entropy and instability stay at zero
    // and only the recency component moves.
    let engine = Engine::with_defaults();
    let base = 0.2;
    let mut low = events.clone();
    for e in &mut low { e.severity_score = base; }
    let mut high = events;
    for e in &mut high { e.severity_score = base + bump; }
    let a = engine.score_file("src/a.ts", &low, now()).unwrap();
    let b = engine.score_file("src/a.ts", &high, now()).unwrap();
    prop_assert!(b.final_risk_score >= a.final_risk_score);
  }

  #[test]
  fn tier_is_monotonic_in_score(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
    let t = risk_engine::config::TierThresholds::default();
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    prop_assert!(Tier::from_score(lo, &t) <= Tier::from_score(hi, &t));
  }
}
