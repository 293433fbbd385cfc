use survey_scorer::scoring::{
    resolve_item, score_response, DiagnosticKind, RawAnswers, ScoreValue, ScoringEngine,
};
use survey_scorer::survey::SurveySchema;

fn schema(yaml: &str) -> SurveySchema {
    serde_saphyr::from_str(yaml).unwrap()
}

fn label(text: &str) -> ScoreValue {
    ScoreValue::Label(text.to_string())
}

const LIKERT: &str = r#"
questions:
  - id: q1
    type: likert
    options: [{ value: 1, label: Never }, { value: 2, label: Rarely }, { value: 3, label: Sometimes }, { value: 4, label: Often }, { value: 5, label: Always }]
  - id: q2
    type: likert
    options: [{ value: 1, label: Never }, { value: 2, label: Rarely }, { value: 3, label: Sometimes }, { value: 4, label: Often }, { value: 5, label: Always }]
  - id: q3
    type: likert
    reverse_score: true
    options: [{ value: 1, label: Never }, { value: 2, label: Rarely }, { value: 3, label: Sometimes }, { value: 4, label: Often }, { value: 5, label: Always }]
scoring_rules:
  total_score:
    type: sum
    questions: [q1, q2, q3]
  mean_score:
    type: average
    questions: [q1, q2, q3]
  severity:
    type: threshold
    input: total_score
    thresholds:
      - { min: 0, max: 4, label: Low }
      - { min: 5, max: 9, label: High }
  needs_follow_up:
    type: flag
    condition: "total_score >= 10"
"#;

#[test]
fn test_repeated_scoring_is_deterministic() {
    let engine = ScoringEngine::new(schema(LIKERT));
    let answers: RawAnswers = [("q1", 2.0), ("q2", 4.0), ("q3", 1.0)].into_iter().collect();

    let first = engine.evaluate(&answers);
    for _ in 0..20 {
        assert_eq!(engine.evaluate(&answers), first);
    }
    assert_eq!(score_response(&schema(LIKERT), &answers), first.scores);
}

#[test]
fn test_reverse_score_symmetry() {
    let schema = schema(LIKERT);
    for raw in 1..=5 {
        let answers: RawAnswers = [("q3", raw as f64)].into_iter().collect();
        assert_eq!(resolve_item(&schema, &answers, "q3"), (6 - raw) as f64);
    }
    let answers: RawAnswers = [("q1", 1.0)].into_iter().collect();
    assert_eq!(resolve_item(&schema, &answers, "q1"), 1.0);
}

#[test]
fn test_sum_and_average() {
    let schema = schema(
        r#"
questions:
  - { id: Q1, type: numeric }
  - { id: Q2, type: numeric }
  - { id: Q3, type: numeric }
scoring_rules:
  total: { type: sum, questions: [Q1, Q2, Q3] }
  mean: { type: average, questions: [Q1, Q2, Q3] }
"#,
    );
    let answers: RawAnswers = [("Q1", 2.0), ("Q2", 3.0), ("Q3", 4.0)].into_iter().collect();
    let scores = score_response(&schema, &answers);
    assert_eq!(scores.number("total"), Some(9.0));
    assert_eq!(scores.number("mean"), Some(3.0));
}

#[test]
fn test_threshold_bounds_are_inclusive() {
    let schema = schema(
        r#"
scoring_rules:
  band:
    type: threshold
    input: total
    thresholds:
      - { min: 0, max: 4, label: Low }
      - { min: 5, max: 9, label: High }
  total: { type: sum, questions: [q1] }
"#,
    );
    let at = |v: f64| {
        let answers: RawAnswers = [("q1", v)].into_iter().collect();
        score_response(&schema, &answers).get("band").cloned()
    };
    assert_eq!(at(4.0), Some(label("Low")));
    assert_eq!(at(5.0), Some(label("High")));
    assert_eq!(at(0.0), Some(label("Low")));
    assert_eq!(at(9.0), Some(label("High")));
    assert_eq!(at(4.5), Some(label("Unknown")));
}

#[test]
fn test_flag_condition() {
    let engine = ScoringEngine::new(schema(LIKERT));

    let high: RawAnswers = [("q1", 5.0), ("q2", 4.0), ("q3", 5.0)].into_iter().collect();
    // 5 + 4 + (6 - 5)
    assert_eq!(engine.evaluate(&high).scores.number("total_score"), Some(10.0));
    assert_eq!(
        engine.evaluate(&high).scores.get("needs_follow_up"),
        Some(&ScoreValue::Flag(true))
    );

    let low: RawAnswers = [("q1", 1.0), ("q2", 1.0), ("q3", 5.0)].into_iter().collect();
    assert_eq!(
        engine.evaluate(&low).scores.get("needs_follow_up"),
        Some(&ScoreValue::Flag(false))
    );
}

#[test]
fn test_flag_on_absent_rule_is_false() {
    let report = ScoringEngine::new(schema(
        r#"
scoring_rules:
  needs_follow_up:
    type: flag
    condition: "total_score >= 10"
"#,
    ))
    .evaluate(&RawAnswers::new());
    assert_eq!(
        report.scores.get("needs_follow_up"),
        Some(&ScoreValue::Flag(false))
    );
    assert_eq!(report.diagnostics[0].kind, DiagnosticKind::ExpressionFailed);
}

#[test]
fn test_names_match_whole_words_only() {
    let schema = schema(
        r#"
scoring_rules:
  sum_total: { type: computed, formula: "sum * 10" }
  combined: { type: computed, formula: "sum_total + sum" }
  sum: { type: sum, questions: [q1, q2] }
  doubled: { type: sum, questions: [q1, q2], formula: "sum * 2 + sum_total" }
"#,
    );
    let answers: RawAnswers = [("q1", 1.0), ("q2", 2.0)].into_iter().collect();
    let report = ScoringEngine::new(schema).evaluate(&answers);

    assert_eq!(report.scores.number("sum"), Some(3.0));
    assert_eq!(report.scores.number("sum_total"), Some(30.0));
    assert_eq!(report.scores.number("combined"), Some(33.0));
    // own aggregate 3, doubled, plus the sum_total rule
    assert_eq!(report.scores.number("doubled"), Some(36.0));
    assert!(report.diagnostics.is_empty());
}

#[test]
fn test_missing_answer_only_touches_dependents() {
    let engine = ScoringEngine::new(schema(
        r#"
scoring_rules:
  a: { type: sum, questions: [q1, q2] }
  b: { type: sum, questions: [q3] }
  a_scaled: { type: computed, formula: "a * 2" }
  b_plus: { type: computed, formula: "b + 1" }
  band: { type: threshold, input: b, thresholds: [{ min: 0, max: 10, label: Ok }] }
"#,
    ));
    let mut answers: RawAnswers = [("q1", 1.0), ("q2", 2.0), ("q3", 4.0)].into_iter().collect();
    let before = engine.evaluate(&answers).scores;

    answers.remove("q1");
    let after = engine.evaluate(&answers).scores;

    assert_ne!(before.get("a"), after.get("a"));
    assert_ne!(before.get("a_scaled"), after.get("a_scaled"));
    for name in ["b", "b_plus", "band"] {
        assert_eq!(before.get(name), after.get(name), "{} changed", name);
    }
}

#[test]
fn test_cycle_yields_complete_map() {
    let engine = ScoringEngine::new(schema(
        r#"
scoring_rules:
  left: { type: computed, formula: "right + 1" }
  right: { type: computed, formula: "left + 1" }
  free: { type: computed, formula: "40 + 2" }
"#,
    ));
    assert!(engine.order().has_cycles());

    let report = engine.evaluate(&RawAnswers::new());
    let names: Vec<&str> = report.scores.names().collect();
    assert_eq!(names, vec!["left", "right", "free"]);
    assert_eq!(report.scores.number("free"), Some(42.0));
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::CycleBroken));
}

#[test]
fn test_hostile_formula_does_not_panic() {
    let deep = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
    let yaml = format!(
        "scoring_rules:\n  deep: {{ type: computed, formula: \"{}\" }}\n  junk: {{ type: computed, formula: \"process.exit(1)\" }}\n",
        deep
    );
    let report = ScoringEngine::new(schema(&yaml)).evaluate(&RawAnswers::new());
    assert_eq!(report.scores.number("deep"), Some(0.0));
    assert_eq!(report.scores.number("junk"), Some(0.0));
    assert_eq!(report.diagnostics.len(), 2);
}

#[test]
fn test_long_flat_formula_scores_zero() {
    let chain = vec!["1"; 100_000].join(" + ");
    let yaml = format!(
        "scoring_rules:\n  flat: {{ type: computed, formula: \"{}\" }}\n  ok: {{ type: computed, formula: \"1 + 1\" }}\n",
        chain
    );
    let report = ScoringEngine::new(schema(&yaml)).evaluate(&RawAnswers::new());
    assert_eq!(report.scores.number("flat"), Some(0.0));
    assert_eq!(report.scores.number("ok"), Some(2.0));
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].kind, DiagnosticKind::ExpressionFailed);
}

#[test]
fn test_threshold_over_label_is_unknown() {
    let report = ScoringEngine::new(schema(
        r#"
scoring_rules:
  total:
    type: threshold
    input: raw
    thresholds: [{ min: 100, max: 200, label: Huge }]
  band:
    type: threshold
    input: total
    thresholds: [{ min: 0, max: 4, label: Low }]
  echoed:
    type: threshold
    input: total
  raw: { type: computed, formula: "3" }
"#,
    ))
    .evaluate(&RawAnswers::new());
    assert_eq!(report.scores.get("total"), Some(&label("Unknown")));
    assert_eq!(report.scores.get("band"), Some(&label("Unknown")));
    assert_eq!(report.scores.get("echoed"), Some(&label("Unknown")));
    assert!(report.diagnostics.is_empty());
}
