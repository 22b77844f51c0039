//! Retrieval collaborator: semantic search over a repository's indexed history.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ContextError;

/// Scope of a retrieval query. `None` is unscoped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalFilter {
  #[serde(default)]
  pub types: Option<Vec<String>>,
}

impl RetrievalFilter {
  pub fn unscoped() -> Self {
    Self { types: None }
  }

  pub fn types<I, S>(types: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      types: Some(types.into_iter().map(Into::into).collect()),
    }
  }

  pub fn is_unscoped(&self) -> bool {
    self.types.is_none()
  }

  /// Metadata filter in the vector store's shape: `{"type": {"$in": [...]}}` or `{}`.
  pub fn to_where(&self) -> Value {
    match &self.types {
      Some(types) => json!({ "type": { "$in": types } }),
      None => json!({}),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalResult {
  /// Matching documents, best first. Absent or empty when nothing matched.
  #[serde(default)]
  pub documents: Vec<String>,
  /// Index ids, aligned with `documents` when the backend returns them.
  #[serde(default)]
  pub ids: Vec<String>,
}

#[async_trait]
pub trait Retriever: Send + Sync {
  async fn query(
    &self,
    repo: &str,
    text: &str,
    filter: &RetrievalFilter,
    limit: usize,
  ) -> Result<RetrievalResult, ContextError>;
}

/// Retriever used when no backend is configured: every query fails, so
/// retrieval tiers fall back to the degraded context.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRetriever;

#[async_trait]
impl Retriever for UnavailableRetriever {
  async fn query(
    &self,
    _repo: &str,
    _text: &str,
    _filter: &RetrievalFilter,
    _limit: usize,
  ) -> Result<RetrievalResult, ContextError> {
    Err(ContextError::Retrieval("no retrieval backend configured".into()))
  }
}
