//! T-score conversion and the scale -> competency -> total roll-up.
//!
//! Each level sums the level below and standardizes against its own norm:
//! scales sum normalized item values, competencies sum member scale T-scores,
//! the total sums competency T-scores (or scale T-scores for tests with no
//! competency hierarchy). A missing norm never silently becomes T=50: the
//! entry is marked degraded and the degradation propagates upward.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::norms::{canonical_category, Norm, NormScope, NormSnapshot};
use crate::types::{Competency, DataQualityFlag, ScoreEntry, ScoreStatus, TotalBasis};

/// Unclamped T-score: population mean 50, standard deviation 10.
pub fn t_score(raw: f64, norm: &Norm) -> f64 {
  50.0 + 10.0 * (raw - norm.mean) / norm.std_dev
}

fn clamp(t: f64, config: &Config) -> f64 {
  t.max(config.t_clamp_min).min(config.t_clamp_max)
}

fn round2(x: f64) -> f64 {
  (x * 100.0).round() / 100.0
}

/// One score at any aggregation level. `t` is the clamped official T-score;
/// `t_unclamped` is retained for diagnostics and never serialized.
#[derive(Debug, Clone)]
pub struct Scored {
  pub raw: f64,
  pub t: Option<f64>,
  pub t_unclamped: Option<f64>,
  pub status: ScoreStatus,
}

impl Scored {
  fn standardized(raw: f64, norm: &Norm, config: &Config) -> Self {
    let t = t_score(raw, norm);
    Self {
      raw: round2(raw),
      t: Some(round2(clamp(t, config))),
      t_unclamped: Some(t),
      status: ScoreStatus::Ok,
    }
  }

  fn degraded(raw: f64) -> Self {
    Self {
      raw: round2(raw),
      t: None,
      t_unclamped: None,
      status: ScoreStatus::Degraded,
    }
  }

  fn insufficient() -> Self {
    Self {
      raw: 0.0,
      t: None,
      t_unclamped: None,
      status: ScoreStatus::InsufficientData,
    }
  }

  pub fn entry(&self) -> ScoreEntry {
    ScoreEntry {
      raw: self.raw,
      t_score: self.t,
      status: self.status,
    }
  }
}

/// Score every scale category from its normalized item values.
///
/// An unanswered scale (zero contributing items) is insufficient data, not
/// raw=0/T=50; a scale with answers but no Scale-scope norm keeps its raw sum
/// and is marked degraded.
pub fn score_scales(
  items: &BTreeMap<String, Vec<i64>>,
  norms: &NormSnapshot,
  config: &Config,
) -> (BTreeMap<String, Scored>, Vec<DataQualityFlag>) {
  let mut scored = BTreeMap::new();
  let mut flags = Vec::new();

  for (category, values) in items {
    if values.is_empty() {
      flags.push(DataQualityFlag::InsufficientData {
        scale: category.clone(),
      });
      scored.insert(category.clone(), Scored::insufficient());
      continue;
    }

    let raw: f64 = values.iter().map(|v| *v as f64).sum();
    let entry = match norms.lookup(NormScope::Scale, category) {
      Some(norm) => Scored::standardized(raw, norm, config),
      None => {
        flags.push(DataQualityFlag::MissingNorm {
          scope: NormScope::Scale,
          category: category.clone(),
        });
        Scored::degraded(raw)
      }
    };
    scored.insert(category.clone(), entry);
  }

  (scored, flags)
}

/// Roll member scale T-scores up into competency scores.
///
/// A competency whose members are not all fully scored keeps the partial sum
/// of the T-scores it does have, but is marked degraded rather than
/// standardized from a partial raw.
pub fn score_competencies(
  scales: &BTreeMap<String, Scored>,
  competencies: &[Competency],
  norms: &NormSnapshot,
  config: &Config,
) -> (BTreeMap<String, Scored>, Vec<DataQualityFlag>) {
  let mut scored = BTreeMap::new();
  let mut flags = Vec::new();

  for competency in competencies {
    let members: Vec<Option<&Scored>> = competency
      .scales
      .iter()
      .map(|name| scales.get(&canonical_category(name)))
      .collect();

    let complete = members
      .iter()
      .all(|m| matches!(m, Some(s) if s.status == ScoreStatus::Ok));
    let raw: f64 = members
      .iter()
      .filter_map(|m| m.and_then(|s| s.t))
      .sum();

    let name = canonical_category(&competency.name);
    let entry = if !complete {
      Scored::degraded(raw)
    } else {
      match norms.lookup(NormScope::Competency, &name) {
        Some(norm) => Scored::standardized(raw, norm, config),
        None => {
          flags.push(DataQualityFlag::MissingNorm {
            scope: NormScope::Competency,
            category: name.clone(),
          });
          Scored::degraded(raw)
        }
      }
    };
    scored.insert(name, entry);
  }

  (scored, flags)
}

/// Compute the final total score.
///
/// With competencies defined, the total sums competency T-scores and is
/// standardized against the Total-scope norm. Without them (aptitude-type
/// tests), it falls back to summing scale T-scores — recorded explicitly via
/// the basis and a data flag, and a Total norm is then optional.
pub fn score_total(
  scales: &BTreeMap<String, Scored>,
  competencies: &BTreeMap<String, Scored>,
  norms: &NormSnapshot,
  config: &Config,
) -> (Scored, TotalBasis, Vec<DataQualityFlag>) {
  let mut flags = Vec::new();
  let (basis, parts): (TotalBasis, &BTreeMap<String, Scored>) = if competencies.is_empty() {
    flags.push(DataQualityFlag::ScaleSumTotal);
    (TotalBasis::Scales, scales)
  } else {
    (TotalBasis::Competencies, competencies)
  };

  let complete = parts.values().all(|s| s.status == ScoreStatus::Ok);
  let raw: f64 = parts.values().filter_map(|s| s.t).sum();

  let entry = if !complete {
    Scored::degraded(raw)
  } else {
    match norms.total() {
      Some(norm) => Scored::standardized(raw, norm, config),
      None if basis == TotalBasis::Scales => {
        // Aptitude tests ship no Total norm; the raw sum stands on its own.
        Scored {
          raw: round2(raw),
          t: None,
          t_unclamped: None,
          status: ScoreStatus::Ok,
        }
      }
      None => {
        flags.push(DataQualityFlag::MissingNorm {
          scope: NormScope::Total,
          category: "total".into(),
        });
        Scored::degraded(raw)
      }
    }
  };

  (entry, basis, flags)
}
