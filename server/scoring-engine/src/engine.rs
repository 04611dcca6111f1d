//! Core engine: binds one test plan, scores attempts into reports.

use std::collections::{BTreeMap, BTreeSet};

use crate::aggregate;
use crate::clinical;
use crate::config::Config;
use crate::error::EngineError;
use crate::normalize;
use crate::norms::{canonical_category, NormSnapshot};
use crate::reliability;
use crate::types::*;

/// Validated reference data for one test: questions, competency hierarchy,
/// one immutable norm snapshot, and thresholds. Built once, then shared by
/// every scoring run — attempts are scored against exactly this data, never
/// against "whatever is currently active".
#[derive(Debug)]
pub struct TestPlan {
  pub test_id: String,
  pub questions: BTreeMap<String, Question>,
  pub competencies: Vec<Competency>,
  pub norms: NormSnapshot,
  pub config: Config,
  /// Categories that receive raw sums and T-scores. Validity-only and
  /// directive items are diagnostic inputs, not scales.
  scored_categories: BTreeSet<String>,
  /// Degradations detected at load time (e.g. zero-variance norm rows);
  /// they apply to every report scored against this plan.
  load_flags: Vec<DataQualityFlag>,
}

impl TestPlan {
  pub fn from_bundle(raw: &InboundBundle) -> Result<Self, EngineError> {
    if raw.test_id.trim().is_empty() {
      return Err(EngineError::reference("test_id must not be empty"));
    }
    if raw.questions.is_empty() {
      return Err(EngineError::reference("test has no questions"));
    }

    let config = raw.config.clone();
    let mut questions = BTreeMap::new();
    for q in &raw.questions {
      let id = q.id.trim().to_string();
      if id.is_empty() {
        return Err(EngineError::reference("question with empty id"));
      }
      let category = canonical_category(&q.category);
      if category.is_empty() {
        return Err(EngineError::reference(format!(
          "question {} has an empty category",
          id
        )));
      }
      let question = Question {
        id: id.clone(),
        category,
        is_reverse_scored: q.is_reverse_scored,
        content: q.content.clone(),
        directive_target: reliability::directive_target(&q.content),
      };
      if questions.insert(id.clone(), question).is_some() {
        return Err(EngineError::reference(format!("duplicate question id {}", id)));
      }
    }

    let scored_categories: BTreeSet<String> = questions
      .values()
      .filter(|q| q.directive_target.is_none() && !config.is_validity_category(&q.category))
      .map(|q| q.category.clone())
      .collect();
    if scored_categories.is_empty() {
      return Err(EngineError::reference("test has no scorable scale categories"));
    }

    let competencies: Vec<Competency> = raw
      .competencies
      .iter()
      .map(|c| Competency {
        name: canonical_category(&c.name),
        scales: c.scales.iter().map(|s| canonical_category(s)).collect(),
      })
      .collect();

    let (norms, load_flags) = NormSnapshot::from_rows(raw.norms.version.clone(), &raw.norms.norms);

    Ok(Self {
      test_id: raw.test_id.trim().to_string(),
      questions,
      competencies,
      norms,
      config,
      scored_categories,
      load_flags,
    })
  }
}

/// The scoring engine. Pure per-attempt computation over one bound plan;
/// concurrent attempts share it immutably.
#[derive(Debug)]
pub struct Engine {
  plan: TestPlan,
}

impl Engine {
  pub fn new(plan: TestPlan) -> Self {
    Self { plan }
  }

  pub fn from_bundle(raw: &InboundBundle) -> Result<Self, EngineError> {
    Ok(Self::new(TestPlan::from_bundle(raw)?))
  }

  /// Score one attempt into a fresh report.
  ///
  /// Fatal only for a malformed attempt envelope; every partial problem
  /// (unknown question, malformed answer, missing norm, unanswered scale)
  /// degrades the report visibly instead of failing it.
  pub fn score(&self, raw: &InboundAttempt) -> Result<ScoreReport, EngineError> {
    let attempt = normalize::normalize_attempt(raw)?;
    let plan = &self.plan;
    let mut flags = plan.load_flags.clone();

    // Every scored category appears, answered or not — an unanswered scale
    // must surface as insufficient data, not vanish.
    let mut items: BTreeMap<String, Vec<i64>> = plan
      .scored_categories
      .iter()
      .map(|c| (c.clone(), Vec::new()))
      .collect();
    let mut responses: Vec<ItemResponse> = Vec::new();

    for (question_id, raw_index) in &attempt.answers {
      let question = match plan.questions.get(question_id) {
        Some(q) => q,
        None => {
          flags.push(DataQualityFlag::UnknownQuestion {
            question_id: question_id.clone(),
          });
          continue;
        }
      };

      let magnitude = match normalize::magnitude(*raw_index) {
        Some(m) => m,
        None => {
          flags.push(DataQualityFlag::MalformedAnswer {
            question_id: question_id.clone(),
            raw_value: *raw_index,
          });
          continue;
        }
      };

      // Reliability checks see what the respondent actually selected,
      // before reverse keying.
      responses.push(ItemResponse {
        category: question.category.clone(),
        magnitude,
        directive_target: question.directive_target,
      });

      if let Some(values) = items.get_mut(&question.category) {
        let value = if question.is_reverse_scored {
          normalize::reverse(magnitude)
        } else {
          magnitude
        };
        values.push(value);
      }
    }

    let (scales, scale_flags) = aggregate::score_scales(&items, &plan.norms, &plan.config);
    flags.extend(scale_flags);

    let (competencies, comp_flags) =
      aggregate::score_competencies(&scales, &plan.competencies, &plan.norms, &plan.config);
    flags.extend(comp_flags);

    let (total, total_basis, total_flags) =
      aggregate::score_total(&scales, &competencies, &plan.norms, &plan.config);
    flags.extend(total_flags);

    let reliability = reliability::analyze(&responses, &plan.config);
    let clinical_flags = clinical::screen(&scales, &plan.config);

    Ok(ScoreReport {
      report_id: self.report_id(&attempt.attempt_id),
      attempt_id: attempt.attempt_id.clone(),
      norm_version: plan.norms.version().to_string(),
      scales: scales.iter().map(|(k, s)| (k.clone(), s.entry())).collect(),
      competencies: competencies
        .iter()
        .map(|(k, s)| (k.clone(), s.entry()))
        .collect(),
      raw_total: total.raw,
      total: total.entry(),
      total_basis,
      reliability,
      clinical_flags,
      data_flags: flags,
      submitted_at: attempt.submitted_at.map(|ts| ts.to_rfc3339()),
    })
  }

  /// Stable report ID: rescoring the same attempt against the same norm
  /// snapshot reproduces the same ID.
  fn report_id(&self, attempt_id: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(self.plan.test_id.as_bytes());
    hasher.update(b"|");
    hasher.update(attempt_id.as_bytes());
    hasher.update(b"|");
    hasher.update(self.plan.norms.version().as_bytes());
    let hex = hasher.finalize().to_hex();
    format!("rpt-{}", &hex[..16])
  }
}
