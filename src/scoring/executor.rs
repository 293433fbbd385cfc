use super::answers::{resolve_item, RawAnswers};
use super::diagnostics::{DiagnosticKind, Diagnostics};
use super::score::{ScoreMap, ScoreValue};
use crate::expr::{Bindings, ExprError, Expression};
use crate::survey::{RuleKind, ScoringRule, SurveySchema};
use thiserror::Error;

/// Label returned by a threshold rule when no band contains the value.
pub const UNKNOWN_BAND: &str = "Unknown";

/// Why a rule produced no value at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("threshold rule has no input")]
    MissingInput,
    #[error("input '{0}' has no value")]
    InputUnavailable(String),
    #[error("{kind} of the answers is not a finite number")]
    NonFiniteAggregate { kind: &'static str },
}

/// Everything one rule can read while it executes.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub schema: &'a SurveySchema,
    pub answers: &'a RawAnswers,
    /// Rules already evaluated in this pass.
    pub scores: &'a ScoreMap,
}

/// Score map view with at most one transient name layered on top.
///
/// The transient binding (`sum`, `average`, or a threshold's input) exists
/// only for the one evaluation; the score map itself is never modified.
pub struct Scope<'a> {
    scores: &'a ScoreMap,
    transient: Option<(&'a str, f64)>,
}

impl<'a> Scope<'a> {
    pub fn new(scores: &'a ScoreMap) -> Self {
        Self {
            scores,
            transient: None,
        }
    }

    pub fn with_binding(scores: &'a ScoreMap, name: &'a str, value: f64) -> Self {
        Self {
            scores,
            transient: Some((name, value)),
        }
    }
}

impl Bindings for Scope<'_> {
    fn lookup(&self, name: &str) -> Option<f64> {
        match self.transient {
            Some((bound, value)) if bound == name => Some(value),
            _ => self.scores.get(name).and_then(ScoreValue::as_binding),
        }
    }
}

/// A rule with its formula and condition parsed once, ready to run against
/// many responses.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: String,
    pub rule: ScoringRule,
    formula: Option<Result<Expression, ExprError>>,
    condition: Option<Result<Expression, ExprError>>,
}

impl CompiledRule {
    pub fn compile(name: &str, rule: &ScoringRule) -> Self {
        Self {
            name: name.to_string(),
            rule: rule.clone(),
            formula: rule.formula.as_deref().map(Expression::parse),
            condition: rule.condition.as_deref().map(Expression::parse),
        }
    }

    /// Evaluate the formula as a number. A failure is reported and counts as 0.
    fn formula_value(&self, scope: &Scope<'_>, diagnostics: &mut Diagnostics) -> Option<f64> {
        let parsed = self.formula.as_ref()?;
        let result = parsed
            .as_ref()
            .map_err(Clone::clone)
            .and_then(|expr| expr.evaluate_number(scope));

        Some(match result {
            Ok(value) => value,
            Err(err) => {
                diagnostics.report(
                    &self.name,
                    DiagnosticKind::ExpressionFailed,
                    format!("formula '{}': {}", self.source_of_formula(), err),
                );
                0.0
            }
        })
    }

    /// Evaluate the condition as a boolean. A failure is reported and counts as false.
    fn condition_value(&self, scope: &Scope<'_>, diagnostics: &mut Diagnostics) -> Option<bool> {
        let parsed = self.condition.as_ref()?;
        let result = parsed
            .as_ref()
            .map_err(Clone::clone)
            .and_then(|expr| expr.evaluate_condition(scope));

        Some(match result {
            Ok(value) => value,
            Err(err) => {
                diagnostics.report(
                    &self.name,
                    DiagnosticKind::ExpressionFailed,
                    format!("condition '{}': {}", self.source_of_condition(), err),
                );
                false
            }
        })
    }

    fn source_of_formula(&self) -> &str {
        self.rule.formula.as_deref().unwrap_or_default()
    }

    fn source_of_condition(&self) -> &str {
        self.rule.condition.as_deref().unwrap_or_default()
    }
}

/// Compute the value of one rule.
///
/// Expression failures never surface as errors: they are reported through
/// `diagnostics` and the rule continues with 0 or false. An `Err` means the
/// rule has no value and the caller records null.
pub fn execute_rule(
    ctx: &RuleContext<'_>,
    compiled: &CompiledRule,
    diagnostics: &mut Diagnostics,
) -> Result<ScoreValue, RuleError> {
    let rule = &compiled.rule;

    match &rule.kind {
        RuleKind::Sum => {
            let total = sum_items(ctx, &rule.questions);
            if !total.is_finite() {
                return Err(RuleError::NonFiniteAggregate { kind: "sum" });
            }
            let scope = Scope::with_binding(ctx.scores, "sum", total);
            let value = compiled.formula_value(&scope, diagnostics).unwrap_or(total);
            Ok(ScoreValue::Number(value))
        }
        RuleKind::Average => {
            if rule.questions.is_empty() {
                return Ok(ScoreValue::Number(0.0));
            }
            let mean = sum_items(ctx, &rule.questions) / rule.questions.len() as f64;
            if !mean.is_finite() {
                return Err(RuleError::NonFiniteAggregate { kind: "average" });
            }
            let scope = Scope::with_binding(ctx.scores, "average", mean);
            let value = compiled.formula_value(&scope, diagnostics).unwrap_or(mean);
            Ok(ScoreValue::Number(value))
        }
        RuleKind::Computed => {
            let scope = Scope::new(ctx.scores);
            let value = compiled.formula_value(&scope, diagnostics).unwrap_or(0.0);
            Ok(ScoreValue::Number(value))
        }
        RuleKind::Threshold => execute_threshold(ctx, compiled, diagnostics),
        RuleKind::Flag => {
            let scope = Scope::new(ctx.scores);
            let raised = compiled
                .condition_value(&scope, diagnostics)
                .unwrap_or(false);
            Ok(ScoreValue::Flag(raised))
        }
        RuleKind::Other(kind) => {
            diagnostics.report(
                &compiled.name,
                DiagnosticKind::UnknownRuleKind,
                format!("rule type '{}' is not supported", kind),
            );
            Ok(ScoreValue::Null)
        }
    }
}

fn sum_items(ctx: &RuleContext<'_>, questions: &[String]) -> f64 {
    questions
        .iter()
        .map(|id| resolve_item(ctx.schema, ctx.answers, id))
        .sum()
}

fn execute_threshold(
    ctx: &RuleContext<'_>,
    compiled: &CompiledRule,
    diagnostics: &mut Diagnostics,
) -> Result<ScoreValue, RuleError> {
    let rule = &compiled.rule;
    let input = rule.input.as_deref().ok_or(RuleError::MissingInput)?;

    let input_value = match ctx.scores.get(input) {
        None | Some(ScoreValue::Null) => {
            return Err(RuleError::InputUnavailable(input.to_string()));
        }
        Some(value) => value.clone(),
    };

    // A label input is not bound, so a formula reading it fails like any
    // other unknown name.
    let scope = match input_value.as_binding() {
        Some(number) => Scope::with_binding(ctx.scores, input, number),
        None => Scope::new(ctx.scores),
    };
    let working = compiled
        .formula_value(&scope, diagnostics)
        .map(ScoreValue::Number)
        .unwrap_or(input_value);

    // Without bands the rule is a pass-through transform of its input.
    let Some(bands) = &rule.thresholds else {
        return Ok(working);
    };

    let label = working
        .as_binding()
        .and_then(|value| bands.iter().find(|band| band.contains(value)))
        .map(|band| band.label.clone())
        .unwrap_or_else(|| UNKNOWN_BAND.to_string());

    Ok(ScoreValue::Label(label))
}
