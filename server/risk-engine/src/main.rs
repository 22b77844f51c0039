//! Binary entrypoint: read one JSON object from stdin, write one to stdout.
//!
//! `risk-engine score`  reads `{file_path, events, now?}`, writes a FileRiskResult.
//! `risk-engine assess` reads `{repo_id, changed_files, file_meta}`, writes a RiskAssessment.
//!
//! Failures are written to stdout as an ErrorOutput object with exit code 1.
//! Logs go to stderr (`RUST_LOG`).

use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use risk_engine::normalize::{normalize, parse_timestamp};
use risk_engine::types::{ErrorOutput, FileMetaRecord};
use risk_engine::{Config, Engine, EngineError, InboundEvent, MemoryStore};

#[derive(Parser)]
#[command(name = "risk-engine", about = "Per-file risk scoring and change assessment")]
struct Cli {
  /// JSON file overriding engine defaults (partial configs allowed).
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Score one file's event history.
  Score,
  /// Assess a set of changed files against path patterns and file counters.
  Assess,
}

#[derive(Deserialize)]
struct ScoreInput {
  file_path: String,
  #[serde(default)]
  events: Vec<InboundEvent>,
  /// Evaluation instant; defaults to the current time.
  #[serde(default)]
  now: Option<String>,
}

#[derive(Deserialize)]
struct AssessInput {
  repo_id: String,
  changed_files: Vec<String>,
  #[serde(default)]
  file_meta: Vec<FileMetaRecord>,
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();
  if let Err(e) = run_binary(&cli) {
    tracing::error!(error = %format!("{:#}", e), "risk-engine failed");
    let out = match e.downcast_ref::<EngineError>() {
      Some(EngineError::Validation { field, reason }) => {
        ErrorOutput::new(reason.clone()).with_field(field.clone())
      }
      _ => ErrorOutput::new(format!("{:#}", e)),
    };
    let _ = serde_json::to_writer(io::stdout(), &out);
    let _ = writeln!(io::stdout());
    std::process::exit(1);
  }
}

fn run_binary(cli: &Cli) -> anyhow::Result<()> {
  let config = match &cli.config {
    Some(path) => {
      let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
      serde_json::from_str::<Config>(&raw).with_context(|| format!("parsing {}", path.display()))?
    }
    None => Config::default(),
  };
  let engine = Engine::new(config);

  let mut raw = String::new();
  io::stdin().lock().read_to_string(&mut raw)?;

  let json = match cli.command {
    Command::Score => {
      let input: ScoreInput = serde_json::from_str(&raw).map_err(EngineError::from)?;
      let now = resolve_now(input.now.as_deref())?;
      let events = input
        .events
        .iter()
        .map(normalize)
        .collect::<Result<Vec<_>, EngineError>>()?;
      let result = engine.score_file(&input.file_path, &events, now)?;
      serde_json::to_vec(&result)?
    }
    Command::Assess => {
      let input: AssessInput = serde_json::from_str(&raw).map_err(EngineError::from)?;
      let mut store = MemoryStore::new();
      for rec in &input.file_meta {
        let repo = if rec.repo_id.is_empty() { &input.repo_id } else { &rec.repo_id };
        store.upsert_file_meta(repo, &rec.file_path, rec.meta);
      }
      let assessment = engine.assess(&input.repo_id, &input.changed_files, &store);
      serde_json::to_vec(&assessment)?
    }
  };

  let mut stdout = io::stdout().lock();
  stdout.write_all(&json)?;
  writeln!(stdout)?;
  Ok(())
}

fn resolve_now(now: Option<&str>) -> Result<DateTime<Utc>, EngineError> {
  match now {
    Some(s) => parse_timestamp(s).ok_or_else(|| EngineError::validation("now", "invalid timestamp")),
    None => Ok(Utc::now()),
  }
}
