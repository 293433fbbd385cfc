use super::answers::RawAnswers;
use super::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use super::executor::{execute_rule, CompiledRule, RuleContext};
use super::order::{evaluation_order, EvaluationOrder};
use super::score::{ScoreMap, ScoreValue};
use crate::survey::SurveySchema;
use serde::Serialize;

/// Scores and diagnostics for one response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub scores: ScoreMap,
    pub diagnostics: Vec<Diagnostic>,
}

/// Scores responses against one schema.
///
/// Ordering and expression parsing happen once in [`ScoringEngine::new`];
/// [`ScoringEngine::evaluate`] only reads the engine, so one engine can score
/// many responses, including from several threads at once.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    schema: SurveySchema,
    order: EvaluationOrder,
    plan: Vec<CompiledRule>,
}

impl ScoringEngine {
    pub fn new(schema: SurveySchema) -> Self {
        let order = evaluation_order(&schema);

        for edge in &order.broken_edges {
            tracing::warn!(
                from = %edge.from,
                to = %edge.to,
                "circular rule dependency; '{}' may see a missing value for '{}'",
                edge.from,
                edge.to
            );
        }

        let plan = order
            .order
            .iter()
            .filter_map(|name| {
                schema
                    .rule(name)
                    .map(|rule| CompiledRule::compile(name, rule))
            })
            .collect();

        Self {
            schema,
            order,
            plan,
        }
    }

    pub fn schema(&self) -> &SurveySchema {
        &self.schema
    }

    pub fn order(&self) -> &EvaluationOrder {
        &self.order
    }

    /// Score one response.
    ///
    /// Never fails as a whole: every rule gets an entry, a rule that cannot be
    /// evaluated scores null, and every problem is listed in the report's
    /// diagnostics. Keys come out in schema declaration order.
    pub fn evaluate(&self, answers: &RawAnswers) -> ScoreReport {
        let mut diagnostics = Diagnostics::new();
        let mut working = ScoreMap::new();

        for edge in &self.order.broken_edges {
            diagnostics.report(
                &edge.from,
                DiagnosticKind::CycleBroken,
                format!("dependency on '{}' dropped to break a cycle", edge.to),
            );
        }

        for compiled in &self.plan {
            let ctx = RuleContext {
                schema: &self.schema,
                answers,
                scores: &working,
            };

            let value = match execute_rule(&ctx, compiled, &mut diagnostics) {
                Ok(value) => value,
                Err(err) => {
                    diagnostics.report(&compiled.name, DiagnosticKind::RuleFailed, err.to_string());
                    ScoreValue::Null
                }
            };

            working.insert(compiled.name.as_str(), value);
        }

        let scores = self
            .schema
            .rule_names()
            .map(|name| (name, working.take(name).unwrap_or(ScoreValue::Null)))
            .collect();

        ScoreReport {
            scores,
            diagnostics: diagnostics.into_vec(),
        }
    }
}

/// Score one response against a schema and return only the score map.
pub fn score_response(schema: &SurveySchema, answers: &RawAnswers) -> ScoreMap {
    ScoringEngine::new(schema.clone()).evaluate(answers).scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(yaml: &str) -> SurveySchema {
        serde_saphyr::from_str(yaml).unwrap()
    }

    const PHQ: &str = r#"
questions:
  - id: q1
    type: likert
    options: [{ value: 0, label: a }, { value: 3, label: d }]
  - id: q2
    type: likert
    options: [{ value: 0, label: a }, { value: 3, label: d }]
  - id: q3
    type: likert
    reverse_score: true
    options: [{ value: 0, label: a }, { value: 3, label: d }]
scoring_rules:
  severity:
    type: threshold
    input: total
    thresholds:
      - { min: 0, max: 4, label: Minimal }
      - { min: 5, max: 9, label: Mild }
  high_risk:
    type: flag
    condition: "total >= 7 && q_mean > 2"
  total:
    type: sum
    questions: [q1, q2, q3]
  q_mean:
    type: average
    questions: [q1, q2, q3]
"#;

    #[test]
    fn test_end_to_end() {
        let engine = ScoringEngine::new(schema(PHQ));
        let answers: RawAnswers = [("q1", 3.0), ("q2", 3.0), ("q3", 0.0)].into_iter().collect();
        let report = engine.evaluate(&answers);

        assert_eq!(report.scores.number("total"), Some(9.0));
        assert_eq!(report.scores.number("q_mean"), Some(3.0));
        assert_eq!(
            report.scores.get("severity"),
            Some(&ScoreValue::Label("Mild".to_string()))
        );
        assert_eq!(report.scores.get("high_risk"), Some(&ScoreValue::Flag(true)));
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_keys_follow_declaration_order() {
        let engine = ScoringEngine::new(schema(PHQ));
        let report = engine.evaluate(&RawAnswers::new());
        let names: Vec<&str> = report.scores.names().collect();
        assert_eq!(names, vec!["severity", "high_risk", "total", "q_mean"]);
    }

    #[test]
    fn test_dependencies_evaluated_first() {
        let engine = ScoringEngine::new(schema(PHQ));
        let order = &engine.order().order;
        let pos = |name: &str| order.iter().position(|n| n == name).unwrap();
        assert!(pos("total") < pos("severity"));
        assert!(pos("total") < pos("high_risk"));
        assert!(pos("q_mean") < pos("high_risk"));
    }

    #[test]
    fn test_failed_rule_is_null_and_others_continue() {
        let engine = ScoringEngine::new(schema(
            r#"
scoring_rules:
  orphan:
    type: threshold
    thresholds: [{ min: 0, max: 1, label: x }]
  total:
    type: computed
    formula: "2 + 2"
"#,
        ));
        let report = engine.evaluate(&RawAnswers::new());
        assert_eq!(report.scores.get("orphan"), Some(&ScoreValue::Null));
        assert_eq!(report.scores.number("total"), Some(4.0));
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::RuleFailed);
    }

    #[test]
    fn test_cycle_reported_and_complete() {
        let engine = ScoringEngine::new(schema(
            r#"
scoring_rules:
  a: { type: computed, formula: "b + 1" }
  b: { type: computed, formula: "a + 1" }
"#,
        ));
        let report = engine.evaluate(&RawAnswers::new());
        assert_eq!(report.scores.len(), 2);
        // b runs first and cannot see a
        assert_eq!(report.scores.number("b"), Some(0.0));
        assert_eq!(report.scores.number("a"), Some(1.0));
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::CycleBroken && d.rule == "b"));
    }

    #[test]
    fn test_score_response_convenience() {
        let answers: RawAnswers = [("q1", 1.0)].into_iter().collect();
        let scores = score_response(&schema(PHQ), &answers);
        // q3 unanswered counts 0 without reverse scoring
        assert_eq!(scores.number("total"), Some(1.0));
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<ScoringEngine>();
    }
}
