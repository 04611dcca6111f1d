//! Binary entrypoint: load a test plan, then read attempt JSON lines from
//! stdin and write report JSON lines to stdout.
//!
//! Usage: scoring-engine <test-plan.json>
//!
//! Each input line is an InboundAttempt. Output lines are either:
//! - A ScoreReport (one per valid attempt)
//! - An ErrorOutput (when attempt validation fails)
//!
//! Attempts are independent, so this loop doubles as the batch-rescore path:
//! pipe any number of historical attempts through one process and every
//! report binds to the same norm snapshot.

use scoring_engine::types::ErrorOutput;
use scoring_engine::{Engine, InboundAttempt, InboundBundle};
use std::io::{self, BufRead, Write};

fn main() {
  let args: Vec<String> = std::env::args().collect();
  if args.len() != 2 {
    let _ = writeln!(io::stderr(), "Usage: scoring-engine <test-plan.json>");
    std::process::exit(2);
  }

  let engine = match load_engine(&args[1]) {
    Ok(engine) => engine,
    Err(e) => {
      let _ = writeln!(io::stderr(), "scoring-engine: {}: {}", args[1], e);
      std::process::exit(2);
    }
  };

  let stdin = io::stdin();
  let stdout = io::stdout();
  let mut out = io::BufWriter::new(stdout.lock());

  for line in stdin.lock().lines() {
    let line = match line {
      Ok(l) => l,
      Err(e) => {
        let _ = writeln!(io::stderr(), "scoring-engine: read error: {}", e);
        std::process::exit(1);
      }
    };

    // Skip blank lines.
    let trimmed = line.trim();
    if trimmed.is_empty() {
      continue;
    }

    // Parse inbound attempt.
    let raw: InboundAttempt = match serde_json::from_str(trimmed) {
      Ok(v) => v,
      Err(e) => {
        let err = ErrorOutput::new(format!("json parse: {}", e));
        let _ = serde_json::to_writer(&mut out, &err);
        let _ = writeln!(out);
        continue;
      }
    };

    // Score through the engine.
    match engine.score(&raw) {
      Ok(report) => {
        let _ = serde_json::to_writer(&mut out, &report);
        let _ = writeln!(out);
      }
      Err(e) => {
        let err = match &e {
          scoring_engine::EngineError::Validation { field, reason } => {
            ErrorOutput::new(reason.clone()).with_field(field.clone())
          }
          _ => ErrorOutput::new(e.to_string()),
        };
        let _ = serde_json::to_writer(&mut out, &err);
        let _ = writeln!(out);
      }
    }
  }

  let _ = out.flush();
}

fn load_engine(path: &str) -> Result<Engine, Box<dyn std::error::Error>> {
  let contents = std::fs::read_to_string(path)?;
  let bundle: InboundBundle = serde_json::from_str(&contents)?;
  Ok(Engine::from_bundle(&bundle)?)
}
