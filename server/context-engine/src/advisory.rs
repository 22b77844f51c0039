//! Combine per-file context records into one advisory for a proposed change.

use std::fmt::Write;

use crate::router::ContextRecord;

const REVIEWER_INSTRUCTIONS: [&str; 3] = [
  "Correlate the proposed change with the failure history above before editing these files.",
  "If the change is trivial (formatting, comments, docs), downplay the historical risk.",
  "Warn explicitly when the touched code paths match previously failing code paths.",
];

/// Render the advisory. `critical_score` is the exclusive lower bound for a
/// file to be listed as critical.
pub fn compose_advisory(records: &[ContextRecord], change: &str, critical_score: f64) -> String {
  let mut out = String::new();

  let _ = writeln!(out, "Proposed change:\n{}\n", change.trim());

  let critical: Vec<&ContextRecord> = records.iter().filter(|r| r.risk_score > critical_score).collect();
  if critical.is_empty() {
    let _ = writeln!(out, "Critical files: none\n");
  } else {
    let _ = writeln!(out, "Critical files:");
    for r in &critical {
      let _ = writeln!(out, "- {} (risk {})", r.file_path, r.risk_score);
    }
    let _ = writeln!(out);
  }

  let _ = writeln!(out, "File context:");
  for r in records {
    let _ = writeln!(
      out,
      "\n### {}\nTier: {}\nRisk score: {}\n{}",
      r.file_path, r.tier, r.risk_score, r.context
    );
  }

  let _ = writeln!(out, "\nReviewer instructions:");
  for line in REVIEWER_INSTRUCTIONS {
    let _ = writeln!(out, "- {}", line);
  }

  out
}
