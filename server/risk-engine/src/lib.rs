//! Risk Engine: deterministic per-file risk scoring and change assessment.
//!
//! Turns a file's incident history (workflow crashes, reverted/rejected PRs,
//! architecture changes) into a score in [0, 1] and a context tier, and turns
//! a set of changed paths plus historical counters into allow/warn/block.
//!
//! No AI, no DB, no network; pure computation. Storage is reached only through
//! the traits in [`store`].

pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod risk;
pub mod score;
pub mod signals;
pub mod store;
pub mod types;

pub use config::{AssessConfig, Config, ScoringConfig};
pub use engine::{Engine, ScoredFiles};
pub use error::EngineError;
pub use store::{EventSource, FileMetaLookup, MemoryStore, Snapshot};
pub use types::{
  ChangeDecision, Decision, EventType, FileError, FileMeta, FileRiskResult, InboundEvent, RiskAssessment,
  RiskEvent, Tier,
};
