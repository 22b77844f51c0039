//! Risk API
//!
//! HTTP service exposing per-file risk analysis and change assessment.
//! Bind to 127.0.0.1 by default (internal only).

pub mod config;
mod handlers;
mod retriever;
mod state;
mod types;

use std::sync::Arc;

use axum::{routing::get, routing::post, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use handlers::{agent_stats, analyze_file, assess, health, risk_analysis};
pub use retriever::HttpRetriever;
pub use state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
  Router::new()
    .route("/health", get(health))
    .route("/risk-analysis", post(risk_analysis))
    .route("/assess", post(assess))
    .route("/analyze-file", post(analyze_file))
    .route("/agent-stats/:agent", get(agent_stats))
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
