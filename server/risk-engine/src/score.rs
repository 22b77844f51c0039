//! Per-file history scoring: five independent components combined into one
//! score and a tier.
//!
//! - recency-weighted severity (exponential decay by age, scaled by event type)
//! - frequency (linear ramp, saturating)
//! - severity entropy (diversity of severity bands)
//! - correlation (share of incidents spanning several files)
//! - instability (mean swing between consecutive severities)

use chrono::{DateTime, Utc};

use crate::config::ScoringConfig;
use crate::error::EngineError;
use crate::signals;
use crate::types::{FileRiskResult, RiskComponents, RiskEvent, Tier};

const MS_PER_DAY: f64 = 86_400_000.0;

/// A validated event: timestamp present, severity finite and clamped.
struct Observation<'a> {
  at: DateTime<Utc>,
  severity: f64,
  event: &'a RiskEvent,
}

/// Score one file's history at instant `now`.
///
/// Fails with `InvalidEvent` if any event lacks `created_at` or carries a
/// non-finite severity; no partial result is produced for that file.
pub fn score_file(
  file_path: &str,
  events: &[RiskEvent],
  now: DateTime<Utc>,
  config: &ScoringConfig,
) -> Result<FileRiskResult, EngineError> {
  if events.is_empty() {
    return Ok(FileRiskResult::zero(file_path));
  }

  let observations = validate(file_path, events)?;

  let components = RiskComponents {
    recency_weighted_risk: recency_weighted_risk(&observations, now, config),
    frequency_score: frequency_score(observations.len(), config.frequency_saturation),
    severity_entropy: severity_entropy(&observations, &config.severity_bands),
    correlation_score: correlation_score(&observations),
    instability_score: instability_score(&observations),
  };

  let w = &config.weights;
  let final_score = w.recency * components.recency_weighted_risk
    + w.frequency * components.frequency_score
    + w.entropy * components.severity_entropy
    + w.correlation * components.correlation_score
    + w.instability * components.instability_score;

  // Tier is taken from the unrounded score so boundaries stay exact.
  let tier = Tier::from_score(final_score, &config.tiers);

  Ok(FileRiskResult {
    file_path: file_path.to_string(),
    final_risk_score: round3(clamp01(final_score)),
    tier,
    components: RiskComponents {
      recency_weighted_risk: round3(components.recency_weighted_risk),
      frequency_score: round3(components.frequency_score),
      severity_entropy: round3(components.severity_entropy),
      correlation_score: round3(components.correlation_score),
      instability_score: round3(components.instability_score),
    },
    signals: signals::extract(events, config.top_keywords),
  })
}

fn validate<'a>(file_path: &str, events: &'a [RiskEvent]) -> Result<Vec<Observation<'a>>, EngineError> {
  events
    .iter()
    .enumerate()
    .map(|(i, event)| {
      let at = event
        .created_at
        .ok_or_else(|| EngineError::invalid_event(file_path, i, "missing created_at"))?;
      if !event.severity_score.is_finite() {
        return Err(EngineError::invalid_event(file_path, i, "severity_score is not finite"));
      }
      Ok(Observation {
        at,
        severity: clamp01(event.severity_score),
        event,
      })
    })
    .collect()
}

/// Severity mean weighted by `decay(age) * type_weight`.
fn recency_weighted_risk(obs: &[Observation<'_>], now: DateTime<Utc>, config: &ScoringConfig) -> f64 {
  let mut sum = 0.0;
  let mut norm = 0.0;
  for o in obs {
    let age_days = (now - o.at).num_milliseconds() as f64 / MS_PER_DAY;
    let weight = decay(age_days, config.half_life_days)
      * config.event_type_weights.weight(o.event.event_type);
    sum += o.severity * weight;
    norm += weight;
  }
  if norm == 0.0 || !norm.is_finite() {
    0.0
  } else {
    clamp01(sum / norm)
  }
}

/// `exp(-ln2 * age / half_life)`: 1.0 at age 0, 0.5 after one half-life.
pub fn decay(age_days: f64, half_life_days: f64) -> f64 {
  (-std::f64::consts::LN_2 * age_days / half_life_days).exp()
}

fn frequency_score(count: usize, saturation: f64) -> f64 {
  if saturation <= 0.0 {
    return 1.0;
  }
  clamp01(count as f64 / saturation)
}

/// Shannon entropy (bits) over severity-band occupancy, normalised by the
/// maximum for the band count.
fn severity_entropy(obs: &[Observation<'_>], bands: &[f64; 3]) -> f64 {
  let mut buckets = [0usize; 4];
  for o in obs {
    let idx = bands.iter().take_while(|&&lower| o.severity >= lower).count();
    buckets[idx] += 1;
  }

  let total = obs.len() as f64;
  let entropy: f64 = buckets
    .iter()
    .filter(|&&b| b > 0)
    .map(|&b| {
      let p = b as f64 / total;
      -p * p.log2()
    })
    .sum();

  clamp01(entropy / (buckets.len() as f64).log2())
}

/// Share of events whose incident touched more than one file.
fn correlation_score(obs: &[Observation<'_>]) -> f64 {
  let correlated = obs.iter().filter(|o| o.event.affected_files.len() > 1).count();
  clamp01(correlated as f64 / obs.len() as f64)
}

/// Mean absolute change between chronologically consecutive severities.
fn instability_score(obs: &[Observation<'_>]) -> f64 {
  let mut ordered: Vec<(DateTime<Utc>, f64)> = obs.iter().map(|o| (o.at, o.severity)).collect();
  // Stable: same-instant events keep input order.
  ordered.sort_by_key(|(at, _)| *at);

  let delta_sum: f64 = ordered.windows(2).map(|w| (w[1].1 - w[0].1).abs()).sum();
  let steps = ordered.len().saturating_sub(1).max(1) as f64;
  clamp01(delta_sum / steps)
}

fn clamp01(v: f64) -> f64 {
  v.clamp(0.0, 1.0)
}

pub(crate) fn round3(v: f64) -> f64 {
  (v * 1000.0).round() / 1000.0
}
