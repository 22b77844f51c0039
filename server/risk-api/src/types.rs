//! Request types for the risk API. Responses reuse the engine types directly.

use context_engine::Mode;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
  pub repo: String,
  pub files: Vec<String>,
  /// Description of the proposed change; feeds retrieval queries and the advisory.
  #[serde(default)]
  pub change: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ModeQuery {
  #[serde(default)]
  pub mode: Mode,
}

#[derive(Debug, Deserialize)]
pub struct AssessRequest {
  pub repo_id: String,
  #[serde(default)]
  pub agent: Option<String>,
  pub changed_files: Vec<String>,
  #[serde(default)]
  pub diff_summary: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FileRequest {
  pub repo_id: String,
  pub file_path: String,
  #[serde(default)]
  pub change: String,
}

/// Reject requests with no repository or no usable file paths.
pub fn check_target(repo: &str, files: &[String]) -> Result<(), String> {
  if repo.trim().is_empty() {
    return Err("repo is required".into());
  }
  if files.is_empty() {
    return Err("at least one file is required".into());
  }
  if files.iter().any(|f| f.trim().is_empty()) {
    return Err("file paths must not be empty".into());
  }
  Ok(())
}
