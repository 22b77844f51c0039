//! Context Engine: tier-driven historical context for scored files.
//!
//! Sits on top of the pure `risk-engine`: decides how much history each file
//! deserves, fetches it through an injected [`Retriever`], composes the
//! advisory for a proposed change, and fires decision side effects.

pub mod advisory;
pub mod error;
pub mod ingest;
pub mod policy;
pub mod retrieval;
pub mod router;
pub mod service;
pub mod sink;
pub mod stats;

pub use advisory::compose_advisory;
pub use error::{ContextError, IngestError, SinkError};
pub use ingest::{build_event_buffer, Incident, IncidentAnalyzer, IngestReport};
pub use policy::{TierPolicy, TierQuery};
pub use retrieval::{RetrievalFilter, RetrievalResult, Retriever, UnavailableRetriever};
pub use router::{ContextRecord, ContextRouter, ScoredFile, FALLBACK_CONTEXT};
pub use service::{Analysis, DecisionOutcome, FileAnalysis, Mode, RiskService};
pub use sink::{DecisionEvent, DecisionLog, DecisionSink, LogSink};
pub use stats::{agent_stats, AgentStats, RiskLevel};
