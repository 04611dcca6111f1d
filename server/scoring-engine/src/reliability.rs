//! Response reliability/validity checks.
//!
//! Five independent checks over the pre-T-score answer magnitudes. Every
//! check reports pass or warning with its measured value; the report carries
//! all five, not just the first trigger. The variance and desirability
//! checks run over a general-purpose pool that excludes confounding
//! categories (lie, self-validation, clinical) and directive items.

use crate::config::Config;
use crate::types::{CheckStatus, ItemResponse, ReliabilityCheck, ReliabilityResult};

/// Fixed phrase markers that make an item a directive-compliance probe,
/// mapped to the answer magnitude the item instructs. Ordered so that longer
/// markers win ("전혀 그렇지 않다" contains "그렇지 않다"; "매우 그렇다"
/// contains "그렇다").
const DIRECTIVE_MARKERS: [(&str, i64); 5] = [
  ("전혀 그렇지 않다", 1),
  ("매우 그렇다", 5),
  ("그렇지 않다", 2),
  ("그렇다", 4),
  ("보통", 3),
];

/// Parse a question's text for a directive marker. `None` means the item is
/// a normal statement, not a compliance probe.
pub fn directive_target(content: &str) -> Option<i64> {
  DIRECTIVE_MARKERS
    .iter()
    .find(|(marker, _)| content.contains(marker))
    .map(|(_, target)| *target)
}

/// Run all five checks. Output order is fixed for byte-stable reports.
pub fn analyze(items: &[ItemResponse], config: &Config) -> Vec<ReliabilityResult> {
  vec![
    response_variance(items, config),
    social_desirability(items, config),
    lie_scale(items, config),
    directive_compliance(items, config),
    self_validation(items, config),
  ]
}

fn round2(x: f64) -> f64 {
  (x * 100.0).round() / 100.0
}

fn result(check: ReliabilityCheck, warn: bool, value: f64, threshold: f64) -> ReliabilityResult {
  ReliabilityResult {
    check,
    status: if warn { CheckStatus::Warning } else { CheckStatus::Pass },
    value,
    threshold,
  }
}

/// Items eligible for the general-purpose checks.
fn general_pool<'a>(items: &'a [ItemResponse], config: &Config) -> Vec<&'a ItemResponse> {
  items
    .iter()
    .filter(|item| item.directive_target.is_none() && !config.is_reliability_excluded(&item.category))
    .collect()
}

/// Sample standard deviation of the general pool. A flat profile means the
/// respondent did not differentiate between items (pattern responding).
fn response_variance(items: &[ItemResponse], config: &Config) -> ReliabilityResult {
  let pool = general_pool(items, config);
  let n = pool.len();

  let std_dev = if n < 2 {
    0.0
  } else {
    let mean = pool.iter().map(|i| i.magnitude as f64).sum::<f64>() / n as f64;
    let sum_sq: f64 = pool
      .iter()
      .map(|i| (i.magnitude as f64 - mean).powi(2))
      .sum();
    (sum_sq / (n - 1) as f64).sqrt()
  };

  result(
    ReliabilityCheck::ResponseVariance,
    std_dev <= config.variance_warn_max,
    round2(std_dev),
    config.variance_warn_max,
  )
}

/// Fraction of general-pool items answered at the maximum magnitude.
fn social_desirability(items: &[ItemResponse], config: &Config) -> ReliabilityResult {
  let pool = general_pool(items, config);
  let ratio = if pool.is_empty() {
    0.0
  } else {
    let max_count = pool
      .iter()
      .filter(|i| i.magnitude >= config.desirability_min_value)
      .count();
    max_count as f64 / pool.len() as f64
  };

  result(
    ReliabilityCheck::SocialDesirability,
    ratio >= config.desirability_warn_ratio,
    round2(ratio),
    config.desirability_warn_ratio,
  )
}

/// Endorsement count over lie-detection items.
fn lie_scale(items: &[ItemResponse], config: &Config) -> ReliabilityResult {
  let count = items
    .iter()
    .filter(|i| config.is_lie_category(&i.category) && i.magnitude >= config.lie_item_min)
    .count();

  result(
    ReliabilityCheck::LieScale,
    count >= config.lie_warn_count,
    count as f64,
    config.lie_warn_count as f64,
  )
}

/// Mismatch count over directive items (actual answer vs instructed answer).
fn directive_compliance(items: &[ItemResponse], config: &Config) -> ReliabilityResult {
  let mismatches = items
    .iter()
    .filter(|i| matches!(i.directive_target, Some(target) if i.magnitude != target))
    .count();

  result(
    ReliabilityCheck::DirectiveCompliance,
    mismatches >= config.compliance_warn_count,
    mismatches as f64,
    config.compliance_warn_count as f64,
  )
}

/// Endorsement count over self-validation items.
fn self_validation(items: &[ItemResponse], config: &Config) -> ReliabilityResult {
  let count = items
    .iter()
    .filter(|i| {
      config.is_self_validation_category(&i.category) && i.magnitude >= config.self_validation_item_min
    })
    .count();

  result(
    ReliabilityCheck::SelfValidation,
    count >= config.self_validation_warn_count,
    count as f64,
    config.self_validation_warn_count as f64,
  )
}
