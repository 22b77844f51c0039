use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use context_engine::{ContextRouter, DecisionLog, RiskService, TierPolicy, UnavailableRetriever, FALLBACK_CONTEXT};
use risk_api::AppState;
use risk_engine::{Engine, EventType, FileMeta, MemoryStore, RiskEvent};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> axum::Router {
  let mut store = MemoryStore::new();
  for i in 0..20 {
    store.record_event(RiskEvent::new(
      "acme/app",
      "src/retry.ts",
      EventType::WorkflowCrash,
      0.95,
      Utc::now() - Duration::days(i),
    ));
  }
  store.upsert_file_meta(
    "acme/app",
    "src/legacy.ts",
    FileMeta {
      ci_failures: 5,
      reverted_prs: 3,
      change_frequency: 0,
    },
  );
  store.upsert_file_meta(
    "acme/app",
    "infra/deploy.sh",
    FileMeta {
      ci_failures: 5,
      reverted_prs: 3,
      change_frequency: 0,
    },
  );
  let store = Arc::new(store);

  let decisions = Arc::new(DecisionLog::new(100));
  let service = RiskService::new(
    Engine::with_defaults(),
    ContextRouter::new(Arc::new(UnavailableRetriever), TierPolicy::default()),
    store.clone(),
    store,
    decisions.clone(),
  );
  risk_api::app(Arc::new(AppState::new(service, decisions)))
}

async fn post(uri: &str, body: Value) -> (StatusCode, Value) {
  send(&app(), post_request(uri, body)).await
}

fn post_request(uri: &str, body: Value) -> Request<Body> {
  Request::builder()
    .method("POST")
    .uri(uri)
    .header("content-type", "application/json")
    .body(Body::from(body.to_string()))
    .unwrap()
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
  let res = app.clone().oneshot(req).await.unwrap();
  let status = res.status();
  let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
  (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn health_is_ok() {
  let res = app()
    .oneshot(Request::get("/health").body(Body::empty()).unwrap())
    .await
    .unwrap();
  assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn score_mode_is_default() {
  let (status, body) = post(
    "/risk-analysis",
    json!({"repo": "acme/app", "files": ["src/retry.ts", "src/new.ts"], "change": "tweak"}),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["repo"], "acme/app");
  assert_eq!(body["count"], 2);
  assert_eq!(body["results"][1]["tier"], "ignorable");
  assert!(body.get("records").is_none());
  assert!(body.get("context").is_none());
}

#[tokio::test]
async fn full_mode_falls_back_without_retriever() {
  let (status, body) = post(
    "/risk-analysis?mode=full",
    json!({"repo": "acme/app", "files": ["src/retry.ts"], "change": "Rework retries"}),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let record = &body["records"][0];
  assert_eq!(record["context"], FALLBACK_CONTEXT);
  assert_eq!(record["risk_score"], body["results"][0]["final_risk_score"]);
  assert!(body["context"].as_str().unwrap().contains("Reviewer instructions:"));
}

#[tokio::test]
async fn empty_repo_or_files_is_bad_request() {
  let (status, body) = post("/risk-analysis", json!({"repo": " ", "files": ["a.ts"]})).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], true);

  let (status, _) = post("/assess", json!({"repo_id": "acme/app", "changed_files": []})).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn assess_returns_decision_with_identity() {
  let (status, body) = post(
    "/assess",
    json!({
      "repo_id": "acme/app",
      "agent": "agent-7",
      "changed_files": ["src/legacy.ts"],
      "diff_summary": "touch legacy retry"
    }),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["decision"], "warn");
  assert_eq!(body["risk_score"], 0.45);
  assert_eq!(body["notify"], false);
  assert_eq!(body["agent"], "agent-7");
  assert!(body["id"].as_str().is_some());
  assert!(body["created_at"].as_str().is_some());
}

#[tokio::test]
async fn analyze_file_attaches_context_above_evidence_score() {
  let (status, body) = post(
    "/analyze-file",
    json!({"repo_id": "acme/app", "file_path": "infra/deploy.sh", "change": "bump"}),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["file_path"], "infra/deploy.sh");
  assert_eq!(body["risk_score"], 0.85);
  assert_eq!(body["decision"], "block");
  // No retrieval backend: the context degrades and no evidence ids are claimed.
  assert_eq!(body["context"]["context"], FALLBACK_CONTEXT);
  assert!(body.get("evidence_ids").is_none());

  let (_, quiet) = post("/analyze-file", json!({"repo_id": "acme/app", "file_path": "README.md"})).await;
  assert_eq!(quiet["decision"], "allow");
  assert!(quiet.get("context").is_none());
}

#[tokio::test]
async fn agent_stats_reflect_assessments() {
  let app = app();
  for file in ["README.md", "payments/x.ts", "infra/deploy.sh"] {
    let req = post_request("/assess", json!({"repo_id": "acme/app", "agent": "cursor", "changed_files": [file]}));
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
  }

  let req = Request::get("/agent-stats/cursor").body(Body::empty()).unwrap();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["agent"], "cursor");
  assert_eq!(body["total_assessments"], 3);
  assert_eq!(body["allowed"], 1);
  assert_eq!(body["warned"], 1);
  assert_eq!(body["blocked"], 1);
  assert_eq!(body["risk_level"], "normal");
  assert_eq!(body["recent_activity"].as_array().unwrap().len(), 3);

  let req = Request::get("/agent-stats/copilot").body(Body::empty()).unwrap();
  let (_, other) = send(&app, req).await;
  assert_eq!(other["total_assessments"], 0);
  assert_eq!(other["risk_rate"], 0.0);
}
