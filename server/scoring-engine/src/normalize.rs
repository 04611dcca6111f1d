//! Normalize inbound attempts and raw option indices into canonical form.
//!
//! The test harness stores the selected option as a 0-based index; the
//! scoring domain works on a 1..5 Likert magnitude. This module is the only
//! place that offset lives — every call site goes through here.

use chrono::{DateTime, Utc};

use crate::error::EngineError;
use crate::types::{Attempt, InboundAttempt};

/// Smallest valid Likert magnitude after normalization.
pub const LIKERT_MIN: i64 = 1;
/// Largest valid Likert magnitude after normalization.
pub const LIKERT_MAX: i64 = 5;

/// 0-based option index -> 1..5 magnitude, or `None` when out of domain.
pub fn magnitude(raw_index: i64) -> Option<i64> {
  let value = raw_index + 1;
  (LIKERT_MIN..=LIKERT_MAX).contains(&value).then_some(value)
}

/// Reverse-keyed items invert around the scale midpoint.
pub fn reverse(value: i64) -> i64 {
  LIKERT_MAX + LIKERT_MIN - value
}

/// Full item normalization: offset, then reverse scoring when the owning
/// question is reverse-keyed. `None` means the answer is malformed and must
/// be excluded (not zeroed) from its scale's sum.
pub fn normalize_answer(raw_index: i64, is_reverse_scored: bool) -> Option<i64> {
  let value = magnitude(raw_index)?;
  Some(if is_reverse_scored { reverse(value) } else { value })
}

/// Parse and validate an inbound attempt envelope.
pub fn normalize_attempt(raw: &InboundAttempt) -> Result<Attempt, EngineError> {
  if raw.attempt_id.trim().is_empty() {
    return Err(EngineError::validation("attempt_id", "must not be empty"));
  }
  if raw.answers.is_empty() {
    return Err(EngineError::validation(
      "answers",
      "must have at least one answer",
    ));
  }

  let submitted_at: Option<DateTime<Utc>> = match &raw.submitted_at {
    Some(ts) => Some(
      DateTime::parse_from_rfc3339(ts)
        .map_err(|e| EngineError::validation("submitted_at", &format!("invalid RFC3339: {}", e)))?
        .with_timezone(&Utc),
    ),
    None => None,
  };

  Ok(Attempt {
    attempt_id: raw.attempt_id.trim().to_string(),
    answers: raw
      .answers
      .iter()
      .map(|(id, v)| (id.trim().to_string(), *v))
      .collect(),
    submitted_at,
  })
}
