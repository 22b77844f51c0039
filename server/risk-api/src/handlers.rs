//! HTTP handlers for the risk API.

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use chrono::Utc;
use context_engine::{AgentStats, Analysis, DecisionOutcome, FileAnalysis};
use risk_engine::types::ErrorOutput;
use tracing::{debug, warn};

use crate::state::AppState;
use crate::types::{check_target, AnalysisRequest, AssessRequest, FileRequest, ModeQuery};

/// Client error rendered as an `ErrorOutput` body.
#[derive(Debug)]
pub struct BadRequest(pub String);

impl IntoResponse for BadRequest {
  fn into_response(self) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorOutput::new(self.0))).into_response()
  }
}

pub async fn health() -> &'static str {
  "ok"
}

pub async fn risk_analysis(
  State(state): State<Arc<AppState>>,
  Query(query): Query<ModeQuery>,
  Json(req): Json<AnalysisRequest>,
) -> Result<Json<Analysis>, BadRequest> {
  if let Err(msg) = check_target(&req.repo, &req.files) {
    warn!(repo = %req.repo, reason = %msg, "risk-analysis: rejected");
    return Err(BadRequest(msg));
  }

  let analysis = state
    .service
    .analyze(&req.repo, &req.files, &req.change, query.mode, Utc::now())
    .await;
  Ok(Json(analysis))
}

pub async fn assess(
  State(state): State<Arc<AppState>>,
  Json(req): Json<AssessRequest>,
) -> Result<Json<DecisionOutcome>, BadRequest> {
  if let Err(msg) = check_target(&req.repo_id, &req.changed_files) {
    warn!(repo = %req.repo_id, reason = %msg, "assess: rejected");
    return Err(BadRequest(msg));
  }
  if let Some(summary) = &req.diff_summary {
    debug!(repo = %req.repo_id, diff_summary_len = summary.len(), "assess: diff summary received");
  }

  let outcome = state
    .service
    .decide(&req.repo_id, req.agent.as_deref(), &req.changed_files, Utc::now())
    .await;
  Ok(Json(outcome))
}

pub async fn analyze_file(
  State(state): State<Arc<AppState>>,
  Json(req): Json<FileRequest>,
) -> Result<Json<FileAnalysis>, BadRequest> {
  if let Err(msg) = check_target(&req.repo_id, std::slice::from_ref(&req.file_path)) {
    warn!(repo = %req.repo_id, reason = %msg, "analyze-file: rejected");
    return Err(BadRequest(msg));
  }

  let analysis = state
    .service
    .analyze_file(&req.repo_id, &req.file_path, &req.change, Utc::now())
    .await;
  Ok(Json(analysis))
}

pub async fn agent_stats(State(state): State<Arc<AppState>>, Path(agent): Path<String>) -> Json<AgentStats> {
  Json(state.decisions.agent_stats(&agent))
}
