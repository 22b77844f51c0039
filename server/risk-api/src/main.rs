//! Binary entrypoint for the risk API.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use risk_api::config::Settings;
use risk_api::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let settings = Settings::from_env()?;
  let state = Arc::new(AppState::from_settings(&settings)?);
  let app = risk_api::app(state);

  let addr = SocketAddr::from(([127, 0, 0, 1], settings.port));
  let listener = tokio::net::TcpListener::bind(addr).await?;
  info!(%addr, "risk-api listening");
  axum::serve(listener, app).await?;

  Ok(())
}
