//! Versioned norm snapshot: (scope, category) -> (mean, std dev).
//!
//! Legacy norm tables encode scope by category-name prefix ("Scale_회복성",
//! "Comp_대인관계", "TOTAL"). The inbound row parser translates that into an
//! explicit scope exactly once, here at the boundary; nothing downstream ever
//! sniffs strings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{DataQualityFlag, InboundNorm};

/// Aggregation level a norm applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormScope {
  Scale,
  Competency,
  Total,
}

impl NormScope {
  pub fn from_str_loose(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "scale" => Some(Self::Scale),
      "competency" | "comp" => Some(Self::Competency),
      "total" => Some(Self::Total),
      _ => None,
    }
  }

  /// Derive scope from a legacy category name. Unprefixed names are scale
  /// norms (the legacy tables left scale rows bare more often than not).
  fn from_legacy_category(category: &str) -> Self {
    let lower = category.trim().to_ascii_lowercase();
    if lower == "total" || lower.starts_with("total_") {
      Self::Total
    } else if lower.starts_with("comp_") || lower.starts_with("competency_") {
      Self::Competency
    } else {
      Self::Scale
    }
  }
}

/// One calibrated norm entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Norm {
  pub scope: NormScope,
  pub category: String,
  pub mean: f64,
  pub std_dev: f64,
}

/// Canonical category form used for every lookup and report key:
/// trimmed, legacy scope prefix stripped, ASCII lowercased.
pub fn canonical_category(raw: &str) -> String {
  let trimmed = raw.trim();
  let lower = trimmed.to_ascii_lowercase();
  let stripped = ["scale_", "comp_", "competency_", "total_"]
    .iter()
    .find_map(|prefix| lower.strip_prefix(prefix))
    .unwrap_or(&lower);
  stripped.trim().to_string()
}

/// An immutable, versioned set of norms. A scoring run binds to exactly one
/// snapshot; the report records which one.
#[derive(Debug, Clone)]
pub struct NormSnapshot {
  version: String,
  norms: BTreeMap<(NormScope, String), Norm>,
}

impl NormSnapshot {
  /// Build a snapshot from inbound rows.
  ///
  /// Rows with a nonpositive std dev are a calibration error, not a valid
  /// statistical state: they are dropped and flagged so every report scored
  /// against this snapshot carries the degradation. Duplicate
  /// (scope, canonical category) keys keep the first row.
  pub fn from_rows(version: impl Into<String>, rows: &[InboundNorm]) -> (Self, Vec<DataQualityFlag>) {
    let mut norms = BTreeMap::new();
    let mut flags = Vec::new();

    for row in rows {
      let scope = row
        .scope
        .as_deref()
        .and_then(NormScope::from_str_loose)
        .unwrap_or_else(|| NormScope::from_legacy_category(&row.category));
      let category = canonical_category(&row.category);
      if category.is_empty() {
        continue;
      }

      if row.std_dev <= 0.0 {
        flags.push(DataQualityFlag::ZeroVarianceNorm {
          scope,
          category: category.clone(),
        });
        continue;
      }

      norms.entry((scope, category.clone())).or_insert(Norm {
        scope,
        category,
        mean: row.mean,
        std_dev: row.std_dev,
      });
    }

    (
      Self {
        version: version.into(),
        norms,
      },
      flags,
    )
  }

  pub fn version(&self) -> &str {
    &self.version
  }

  /// Look up a norm by scope and category (canonicalized internally).
  pub fn lookup(&self, scope: NormScope, category: &str) -> Option<&Norm> {
    self.norms.get(&(scope, canonical_category(category)))
  }

  /// The single Total-scope norm for this test, if calibrated.
  pub fn total(&self) -> Option<&Norm> {
    self
      .norms
      .iter()
      .find(|((scope, _), _)| *scope == NormScope::Total)
      .map(|(_, norm)| norm)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn row(category: &str, scope: Option<&str>, mean: f64, std_dev: f64) -> InboundNorm {
    InboundNorm {
      category: category.into(),
      scope: scope.map(|s| s.into()),
      mean,
      std_dev,
    }
  }

  #[test]
  fn canonical_strips_legacy_prefixes() {
    assert_eq!(canonical_category("회복성"), "회복성");
    assert_eq!(canonical_category("Scale_회복성"), "회복성");
    assert_eq!(canonical_category("Comp_대인관계"), "대인관계");
    assert_eq!(canonical_category("  Resilience "), "resilience");
  }

  #[test]
  fn legacy_prefix_determines_scope() {
    let (snapshot, flags) = NormSnapshot::from_rows(
      "v1",
      &[
        row("Scale_회복성", None, 12.0, 3.0),
        row("Comp_대인관계", None, 110.0, 15.0),
        row("TOTAL", None, 300.0, 30.0),
        row("성실성", None, 10.0, 2.0),
      ],
    );
    assert!(flags.is_empty());
    assert!(snapshot.lookup(NormScope::Scale, "회복성").is_some());
    assert!(snapshot.lookup(NormScope::Competency, "대인관계").is_some());
    assert!(snapshot.total().is_some());
    // Unprefixed rows are scale norms.
    assert!(snapshot.lookup(NormScope::Scale, "성실성").is_some());
  }

  #[test]
  fn explicit_scope_wins_over_prefix() {
    let (snapshot, _) = NormSnapshot::from_rows("v1", &[row("회복성", Some("competency"), 110.0, 15.0)]);
    assert!(snapshot.lookup(NormScope::Scale, "회복성").is_none());
    assert!(snapshot.lookup(NormScope::Competency, "회복성").is_some());
  }

  #[test]
  fn lookup_is_prefix_insensitive() {
    let (snapshot, _) = NormSnapshot::from_rows("v1", &[row("Scale_회복성", None, 12.0, 3.0)]);
    let direct = snapshot.lookup(NormScope::Scale, "회복성");
    let prefixed = snapshot.lookup(NormScope::Scale, "Scale_회복성");
    assert!(direct.is_some());
    assert_eq!(direct.map(|n| n.mean), prefixed.map(|n| n.mean));
  }

  #[test]
  fn zero_std_dev_is_dropped_and_flagged() {
    let (snapshot, flags) = NormSnapshot::from_rows("v1", &[row("회복성", None, 12.0, 0.0)]);
    assert!(snapshot.lookup(NormScope::Scale, "회복성").is_none());
    assert_eq!(flags.len(), 1);
    match &flags[0] {
      DataQualityFlag::ZeroVarianceNorm { scope, category } => {
        assert_eq!(*scope, NormScope::Scale);
        assert_eq!(category, "회복성");
      }
      other => panic!("unexpected flag: {:?}", other),
    }
  }

  #[test]
  fn duplicate_rows_keep_first() {
    let (snapshot, _) = NormSnapshot::from_rows(
      "v1",
      &[row("회복성", None, 12.0, 3.0), row("Scale_회복성", None, 99.0, 9.0)],
    );
    let norm = snapshot.lookup(NormScope::Scale, "회복성").unwrap();
    assert_eq!(norm.mean, 12.0);
  }
}
