//! Integration tests for the scoring engine.

use scoring_engine::types::{CheckStatus, ReliabilityCheck, ScoreStatus, TotalBasis};
use scoring_engine::{Engine, InboundAttempt, InboundBundle};

/// A small but complete personality test plan: two trait scales under one
/// competency, one clinical scale, three lie items, one directive item.
/// Norm rows use the legacy name-prefix encoding on purpose.
fn fixture_bundle() -> InboundBundle {
  let json = r#"{
    "test_id": "persona-2026",
    "questions": [
      {"id": "q01", "category": "회복성", "content": "나는 어려움에서 빨리 회복한다"},
      {"id": "q02", "category": "회복성", "is_reverse_scored": true, "content": "나는 실패하면 오래 주저앉는다"},
      {"id": "q03", "category": "성실성", "content": "나는 맡은 일을 끝까지 해낸다"},
      {"id": "q04", "category": "성실성", "content": "나는 계획을 세우고 지킨다"},
      {"id": "q05", "category": "공격성", "content": "나는 화가 나면 참기 어렵다"},
      {"id": "q06", "category": "공격성", "content": "나는 사소한 일에도 짜증이 난다"},
      {"id": "q07", "category": "허구성", "content": "나는 한 번도 거짓말을 한 적이 없다"},
      {"id": "q08", "category": "허구성", "content": "나는 모든 사람을 좋아한다"},
      {"id": "q09", "category": "허구성", "content": "나는 약속에 늦어 본 적이 없다"},
      {"id": "q10", "category": "지시문", "content": "이 문항에는 '매우 그렇다'로 답하십시오"}
    ],
    "competencies": [
      {"name": "자기관리", "scales": ["회복성", "성실성"]}
    ],
    "norms": {
      "version": "2026-01",
      "norms": [
        {"category": "Scale_회복성", "mean": 6.0, "std_dev": 2.0},
        {"category": "Scale_성실성", "mean": 6.0, "std_dev": 2.0},
        {"category": "Scale_공격성", "mean": 5.0, "std_dev": 2.0},
        {"category": "Comp_자기관리", "mean": 100.0, "std_dev": 20.0},
        {"category": "TOTAL", "mean": 50.0, "std_dev": 10.0}
      ]
    }
  }"#;
  serde_json::from_str(json).unwrap()
}

fn fixture_attempt() -> InboundAttempt {
  // Option indices are 0-based; q02 is reverse-keyed (index 1 -> 2 -> 4).
  let json = r#"{
    "attempt_id": "attempt-7",
    "submitted_at": "2026-03-02T09:30:00Z",
    "answers": {
      "q01": 3, "q02": 1,
      "q03": 2, "q04": 3,
      "q05": 4, "q06": 4,
      "q07": 1, "q08": 0, "q09": 2,
      "q10": 4
    }
  }"#;
  serde_json::from_str(json).unwrap()
}

#[test]
fn full_profile_scores_every_level() {
  let engine = Engine::from_bundle(&fixture_bundle()).unwrap();
  let report = engine.score(&fixture_attempt()).unwrap();

  // Structure checks.
  assert!(report.report_id.starts_with("rpt-"));
  assert_eq!(report.attempt_id, "attempt-7");
  assert_eq!(report.norm_version, "2026-01");
  assert_eq!(report.submitted_at.as_deref(), Some("2026-03-02T09:30:00+00:00"));

  // Scales: 회복성 raw 4+4=8 -> T 60; 성실성 raw 3+4=7 -> T 55; 공격성 raw 10 -> T 75.
  // Legacy "Scale_" prefixes in the norm table must resolve transparently.
  assert_eq!(report.scales["회복성"].raw, 8.0);
  assert_eq!(report.scales["회복성"].t_score, Some(60.0));
  assert_eq!(report.scales["성실성"].t_score, Some(55.0));
  assert_eq!(report.scales["공격성"].t_score, Some(75.0));

  // Validity and directive categories never appear as scales.
  assert!(!report.scales.contains_key("허구성"));
  assert!(!report.scales.contains_key("지시문"));

  // Competency: raw 60+55=115 -> T 50 + 10*(115-100)/20 = 57.5.
  assert_eq!(report.competencies["자기관리"].raw, 115.0);
  assert_eq!(report.competencies["자기관리"].t_score, Some(57.5));

  // Total over competency T-scores: raw 57.5 -> T 57.5.
  assert_eq!(report.total_basis, TotalBasis::Competencies);
  assert_eq!(report.raw_total, 57.5);
  assert_eq!(report.total.t_score, Some(57.5));

  // Clinical: 공격성 T 75 crosses the 65 cutoff.
  assert_eq!(report.clinical_flags.len(), 1);
  assert_eq!(report.clinical_flags[0].scale, "공격성");

  // All five reliability checks present, all passing for this profile.
  assert_eq!(report.reliability.len(), 5);
  assert!(report.reliability.iter().all(|r| r.status == CheckStatus::Pass));

  // Fully resolved plan: no degradation flags.
  assert!(report.data_flags.is_empty());
}

#[test]
fn deterministic_output_across_runs() {
  let bundle = fixture_bundle();
  let attempt = fixture_attempt();

  let engine1 = Engine::from_bundle(&bundle).unwrap();
  let json1 = serde_json::to_string(&engine1.score(&attempt).unwrap()).unwrap();

  let engine2 = Engine::from_bundle(&bundle).unwrap();
  let json2 = serde_json::to_string(&engine2.score(&attempt).unwrap()).unwrap();

  assert_eq!(json1, json2, "Same inputs must produce identical JSON output");
}

#[test]
fn straight_line_responder_trips_the_reliability_battery() {
  let engine = Engine::from_bundle(&fixture_bundle()).unwrap();
  // Every item answered at the maximum option.
  let json = r#"{
    "attempt_id": "attempt-8",
    "answers": {
      "q01": 4, "q02": 4, "q03": 4, "q04": 4, "q05": 4,
      "q06": 4, "q07": 4, "q08": 4, "q09": 4, "q10": 4
    }
  }"#;
  let raw: InboundAttempt = serde_json::from_str(json).unwrap();
  let report = engine.score(&raw).unwrap();

  let status = |check: ReliabilityCheck| {
    report
      .reliability
      .iter()
      .find(|r| r.check == check)
      .unwrap()
      .status
  };

  // Zero spread and an all-maximum profile.
  assert_eq!(status(ReliabilityCheck::ResponseVariance), CheckStatus::Warning);
  assert_eq!(status(ReliabilityCheck::SocialDesirability), CheckStatus::Warning);
  // Three lie items endorsed at 5.
  assert_eq!(status(ReliabilityCheck::LieScale), CheckStatus::Warning);
  // The directive item demanded 5 and got 5.
  assert_eq!(status(ReliabilityCheck::DirectiveCompliance), CheckStatus::Pass);
  assert_eq!(status(ReliabilityCheck::SelfValidation), CheckStatus::Pass);
}

#[test]
fn unanswered_scale_degrades_the_roll_up() {
  let engine = Engine::from_bundle(&fixture_bundle()).unwrap();
  // 성실성 entirely unanswered.
  let json = r#"{
    "attempt_id": "attempt-9",
    "answers": {"q01": 3, "q02": 1, "q05": 2, "q06": 2}
  }"#;
  let raw: InboundAttempt = serde_json::from_str(json).unwrap();
  let report = engine.score(&raw).unwrap();

  assert_eq!(report.scales["성실성"].status, ScoreStatus::InsufficientData);
  assert_eq!(report.scales["성실성"].t_score, None);
  assert_eq!(report.competencies["자기관리"].status, ScoreStatus::Degraded);
  assert_eq!(report.total.status, ScoreStatus::Degraded);
  assert!(!report.data_flags.is_empty());
}

#[test]
fn unknown_fields_are_ignored() {
  let json = r#"{
    "attempt_id": "attempt-10",
    "answers": {"q01": 2, "q02": 2, "q03": 2, "q04": 2},
    "some_unknown_field": "should be ignored",
    "another": 42
  }"#;
  let raw: InboundAttempt = serde_json::from_str(json).unwrap();
  let engine = Engine::from_bundle(&fixture_bundle()).unwrap();
  assert!(engine.score(&raw).is_ok());
}

#[test]
fn missing_required_field_gives_clear_error() {
  let json = r#"{"attempt_id": "attempt-11", "answers": {}}"#;
  let raw: InboundAttempt = serde_json::from_str(json).unwrap();
  let engine = Engine::from_bundle(&fixture_bundle()).unwrap();
  let err = engine.score(&raw).unwrap_err();
  assert!(
    err.to_string().contains("answers"),
    "Error should mention the field: {}",
    err
  );
}

#[test]
fn rescoring_against_a_new_snapshot_changes_the_report_id() {
  let attempt = fixture_attempt();
  let engine1 = Engine::from_bundle(&fixture_bundle()).unwrap();
  let report1 = engine1.score(&attempt).unwrap();

  let mut bundle = fixture_bundle();
  bundle.norms.version = "2026-02".into();
  let engine2 = Engine::from_bundle(&bundle).unwrap();
  let report2 = engine2.score(&attempt).unwrap();

  assert_ne!(report1.report_id, report2.report_id);
  assert_eq!(report1.scales["회복성"].t_score, report2.scales["회복성"].t_score);
}
