//! Structured error types for the risk engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  /// A boundary record failed schema validation.
  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  /// An event cannot be scored (e.g. missing timestamp). Rejects the whole file.
  #[error("invalid event: {file_path}[{index}]: {reason}")]
  InvalidEvent {
    file_path: String,
    index: usize,
    reason: String,
  },

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),
}

impl EngineError {
  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn invalid_event(file_path: &str, index: usize, reason: impl Into<String>) -> Self {
    Self::InvalidEvent {
      file_path: file_path.to_string(),
      index,
      reason: reason.into(),
    }
  }

  pub fn is_invalid_event(&self) -> bool {
    matches!(self, Self::InvalidEvent { .. })
  }
}
