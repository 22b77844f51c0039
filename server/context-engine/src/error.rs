//! Error types for the context engine's external collaborators.
//!
//! None of these reach the top-level caller: retrieval errors degrade to the
//! fallback context, ingestion errors skip one incident, sink errors are logged.

use std::time::Duration;

use thiserror::Error;

/// Retrieval-side failure while enriching one file.
#[derive(Debug, Error)]
pub enum ContextError {
  #[error("embedding: {0}")]
  Embedding(String),

  #[error("retrieval: {0}")]
  Retrieval(String),

  #[error("retrieval timed out after {0:?}")]
  Timeout(Duration),
}

/// Failure turning one raw incident into a risk event.
#[derive(Debug, Error)]
pub enum IngestError {
  /// Generator output did not match the expected analysis shape.
  #[error("schema: {field}: {reason}")]
  Schema { field: String, reason: String },

  #[error("rate limited: {0}")]
  RateLimited(String),

  #[error("generation: {0}")]
  Generation(String),
}

impl IngestError {
  pub fn schema(field: &str, reason: impl Into<String>) -> Self {
    Self::Schema {
      field: field.to_string(),
      reason: reason.into(),
    }
  }
}

impl From<serde_json::Error> for IngestError {
  fn from(e: serde_json::Error) -> Self {
    Self::schema("$", e.to_string())
  }
}

/// Failure delivering a decision side effect.
#[derive(Debug, Error)]
#[error("sink: {0}")]
pub struct SinkError(pub String);
