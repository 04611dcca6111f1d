//! Core types for the scoring engine (JSON contracts + internal models).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::config::Config;
use crate::norms::NormScope;

// ---------------------------------------------------------------------------
// Inbound types (JSON contract — what the caller sends)
// ---------------------------------------------------------------------------

/// Reference bundle for one test: everything a scoring run binds to.
/// Loaded once per process. Unknown fields are silently ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundBundle {
  pub test_id: String,
  pub questions: Vec<InboundQuestion>,
  #[serde(default)]
  pub competencies: Vec<InboundCompetency>,
  pub norms: InboundSnapshot,
  #[serde(default)]
  pub config: Config,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundQuestion {
  pub id: String,
  pub category: String,
  #[serde(default)]
  pub is_reverse_scored: bool,
  #[serde(default)]
  pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundCompetency {
  pub name: String,
  pub scales: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundSnapshot {
  pub version: String,
  pub norms: Vec<InboundNorm>,
}

/// One norm table row. `scope` is optional: legacy exports omit it and encode
/// the scope in the category name instead ("Scale_…", "Comp_…", "TOTAL").
#[derive(Debug, Clone, Deserialize)]
pub struct InboundNorm {
  pub category: String,
  #[serde(default)]
  pub scope: Option<String>,
  pub mean: f64,
  pub std_dev: f64,
}

/// One finalized attempt line from stdin.
/// `answers` maps question id to the selected option index (0-based).
#[derive(Debug, Clone, Deserialize)]
pub struct InboundAttempt {
  pub attempt_id: String,
  pub answers: HashMap<String, i64>,
  #[serde(default)]
  pub submitted_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Internal normalized types
// ---------------------------------------------------------------------------

/// Canonical question after plan validation. `category` is canonicalized and
/// `directive_target` is precomputed from the content's phrase markers.
#[derive(Debug, Clone)]
pub struct Question {
  pub id: String,
  pub category: String,
  pub is_reverse_scored: bool,
  pub content: String,
  pub directive_target: Option<i64>,
}

/// Higher-level construct: an ordered set of member scale names (canonical).
#[derive(Debug, Clone)]
pub struct Competency {
  pub name: String,
  pub scales: Vec<String>,
}

/// Canonical attempt after envelope validation.
#[derive(Debug, Clone)]
pub struct Attempt {
  pub attempt_id: String,
  /// question id -> raw selected option index (0-based), ordered for
  /// deterministic processing.
  pub answers: BTreeMap<String, i64>,
  pub submitted_at: Option<DateTime<Utc>>,
}

/// One answered item as seen by the reliability checks: the pre-reverse
/// 1..5 magnitude the respondent actually selected.
#[derive(Debug, Clone)]
pub struct ItemResponse {
  pub category: String,
  pub magnitude: i64,
  pub directive_target: Option<i64>,
}

// ---------------------------------------------------------------------------
// Output types (JSON contract — what we emit)
// ---------------------------------------------------------------------------

/// Whether a score at any level is fully computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreStatus {
  /// Raw and T-score both present.
  Ok,
  /// A required norm was missing (here or below); raw kept, no T-score.
  Degraded,
  /// No contributing items; neither value is meaningful.
  InsufficientData,
}

/// The unit of output at every aggregation level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreEntry {
  pub raw: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub t_score: Option<f64>,
  pub status: ScoreStatus,
}

/// What the total raw score was summed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalBasis {
  /// Competency T-scores (the normal two-level hierarchy).
  Competencies,
  /// Scale T-scores directly (tests with no competency hierarchy).
  Scales,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReliabilityCheck {
  ResponseVariance,
  SocialDesirability,
  LieScale,
  DirectiveCompliance,
  SelfValidation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
  Pass,
  Warning,
}

/// Outcome of one reliability check. All five appear on every report;
/// `value` is the measured statistic, `threshold` the configured trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityResult {
  pub check: ReliabilityCheck,
  pub status: CheckStatus,
  pub value: f64,
  pub threshold: f64,
}

/// A clinical scale whose T-score crossed the risk cutoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalFlag {
  pub scale: String,
  pub t_score: f64,
  pub cutoff: f64,
}

/// One recorded degradation. The legacy scripts silently defaulted through
/// every one of these cases; here each substitution is visible on the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityFlag {
  MissingNorm { scope: NormScope, category: String },
  ZeroVarianceNorm { scope: NormScope, category: String },
  MalformedAnswer { question_id: String, raw_value: i64 },
  UnknownQuestion { question_id: String },
  InsufficientData { scale: String },
  /// Total was summed from scale T-scores (no competency hierarchy defined).
  ScaleSumTotal,
}

/// The engine's only artifact: a derived, regenerable score report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
  pub report_id: String,
  pub attempt_id: String,
  pub norm_version: String,
  pub scales: BTreeMap<String, ScoreEntry>,
  pub competencies: BTreeMap<String, ScoreEntry>,
  pub total: ScoreEntry,
  pub raw_total: f64,
  pub total_basis: TotalBasis,
  pub reliability: Vec<ReliabilityResult>,
  pub clinical_flags: Vec<ClinicalFlag>,
  pub data_flags: Vec<DataQualityFlag>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub submitted_at: Option<String>,
}

// ---------------------------------------------------------------------------
// CLI stream wrappers
// ---------------------------------------------------------------------------

/// Structured error output for invalid input lines.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
      field: None,
    }
  }

  pub fn with_field(mut self, field: impl Into<String>) -> Self {
    self.field = Some(field.into());
    self
  }
}
