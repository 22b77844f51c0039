//! Retrieval over HTTP: `POST {base}/query` against the history index service.

use std::time::Duration;

use async_trait::async_trait;
use context_engine::{ContextError, RetrievalFilter, RetrievalResult, Retriever};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Serialize)]
struct QueryBody<'a> {
  repo: &'a str,
  text: &'a str,
  #[serde(rename = "where")]
  filter: Value,
  limit: usize,
}

pub struct HttpRetriever {
  client: reqwest::Client,
  endpoint: String,
}

impl HttpRetriever {
  pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      endpoint: format!("{}/query", base_url.trim_end_matches('/')),
    })
  }

  pub fn endpoint(&self) -> &str {
    &self.endpoint
  }
}

#[async_trait]
impl Retriever for HttpRetriever {
  async fn query(
    &self,
    repo: &str,
    text: &str,
    filter: &RetrievalFilter,
    limit: usize,
  ) -> Result<RetrievalResult, ContextError> {
    let body = QueryBody {
      repo,
      text,
      filter: filter.to_where(),
      limit,
    };

    let response = self
      .client
      .post(&self.endpoint)
      .json(&body)
      .send()
      .await
      .map_err(|e| ContextError::Retrieval(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      return Err(ContextError::Retrieval(format!("{} returned {}", self.endpoint, status)));
    }

    let result: RetrievalResult = response
      .json()
      .await
      .map_err(|e| ContextError::Retrieval(format!("bad response body: {}", e)))?;
    debug!(repo = %repo, documents = result.documents.len(), "retrieval response");
    Ok(result)
  }
}
