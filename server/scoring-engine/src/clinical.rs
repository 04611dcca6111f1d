//! Clinical risk screening over already-computed scale T-scores.
//!
//! Purely a read over the scale aggregator's output: a configured clinical
//! category whose official T-score reaches the cutoff becomes a flag. Scales
//! without a T-score (degraded, insufficient data) cannot be screened and
//! produce nothing here — their condition is already on the report as a
//! data-quality flag.

use std::collections::BTreeMap;

use crate::aggregate::Scored;
use crate::config::Config;
use crate::types::ClinicalFlag;

/// Flag every clinical scale at or above the risk cutoff, in category order.
pub fn screen(scales: &BTreeMap<String, Scored>, config: &Config) -> Vec<ClinicalFlag> {
  scales
    .iter()
    .filter(|(category, _)| config.is_clinical_category(category))
    .filter_map(|(category, scored)| {
      let t = scored.t?;
      (t >= config.clinical_t_cutoff).then(|| ClinicalFlag {
        scale: category.clone(),
        t_score: t,
        cutoff: config.clinical_t_cutoff,
      })
    })
    .collect()
}
