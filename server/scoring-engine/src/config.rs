//! Engine configuration with sane defaults.
//!
//! Thresholds and category rosters are test-specific data, so the whole
//! struct is deserializable and may be overridden per test plan. Every field
//! falls back to the defaults below when absent from the bundle.

use serde::Deserialize;

use crate::norms::canonical_category;

/// Tunable thresholds and category rosters for one test.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Lower bound of the reported (clamped) T-score range.
  pub t_clamp_min: f64,
  /// Upper bound of the reported (clamped) T-score range.
  pub t_clamp_max: f64,
  /// Scale T-score at or above which a clinical category is flagged.
  pub clinical_t_cutoff: f64,
  /// Scale categories screened against `clinical_t_cutoff`.
  pub clinical_categories: Vec<String>,
  /// Lie-detection categories (validity-only, never T-scored).
  pub lie_categories: Vec<String>,
  /// Self-validation categories (validity-only, never T-scored).
  pub self_validation_categories: Vec<String>,
  /// Extra categories to exclude from the variance/desirability checks.
  pub excluded_categories: Vec<String>,
  /// Sample standard deviation at or below which responses count as patterned.
  pub variance_warn_max: f64,
  /// Fraction of maximum-value answers at or above which desirability warns.
  pub desirability_warn_ratio: f64,
  /// Answer magnitude treated as "maximum" by the desirability check.
  pub desirability_min_value: i64,
  /// Lie-category answer magnitude counted as an endorsement.
  pub lie_item_min: i64,
  /// Endorsement count at or above which the lie check warns.
  pub lie_warn_count: usize,
  /// Directive-item mismatch count at or above which the compliance check warns.
  pub compliance_warn_count: usize,
  /// Self-validation answer magnitude counted as an endorsement.
  pub self_validation_item_min: i64,
  /// Endorsement count at or above which the self-validation check warns.
  pub self_validation_warn_count: usize,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      t_clamp_min: 0.0,
      t_clamp_max: 100.0,
      clinical_t_cutoff: 65.0,
      clinical_categories: vec![
        "불안/우울".into(),
        "공격성".into(),
        "분열성".into(),
        "반사회성".into(),
        "경계선".into(),
        "의존성".into(),
        "편집성".into(),
      ],
      lie_categories: vec!["허구성".into()],
      self_validation_categories: vec!["자기타당성".into()],
      excluded_categories: vec![],
      variance_warn_max: 0.5,
      desirability_warn_ratio: 0.5,
      desirability_min_value: 5,
      lie_item_min: 4,
      lie_warn_count: 3,
      compliance_warn_count: 2,
      self_validation_item_min: 4,
      self_validation_warn_count: 3,
    }
  }
}

impl Config {
  /// Category belongs to a lie-detection scale.
  pub fn is_lie_category(&self, category: &str) -> bool {
    contains_canonical(&self.lie_categories, category)
  }

  /// Category belongs to a self-validation scale.
  pub fn is_self_validation_category(&self, category: &str) -> bool {
    contains_canonical(&self.self_validation_categories, category)
  }

  /// Category is screened by the clinical risk check.
  pub fn is_clinical_category(&self, category: &str) -> bool {
    contains_canonical(&self.clinical_categories, category)
  }

  /// Validity-only categories exist for the reliability checks and are
  /// excluded from scale aggregation entirely.
  pub fn is_validity_category(&self, category: &str) -> bool {
    self.is_lie_category(category) || self.is_self_validation_category(category)
  }

  /// Category is confounding for the general-purpose reliability checks
  /// (variance, desirability) and is removed from their item pools.
  pub fn is_reliability_excluded(&self, category: &str) -> bool {
    self.is_validity_category(category)
      || self.is_clinical_category(category)
      || contains_canonical(&self.excluded_categories, category)
  }
}

fn contains_canonical(roster: &[String], category: &str) -> bool {
  let canonical = canonical_category(category);
  roster.iter().any(|c| canonical_category(c) == canonical)
}
