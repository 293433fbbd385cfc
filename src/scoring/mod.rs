pub mod answers;
pub mod dependencies;
pub mod diagnostics;
pub mod engine;
pub mod executor;
pub mod order;
pub mod score;

pub use answers::{load_answers, resolve_item, AnswerValue, RawAnswers};
pub use dependencies::rule_dependencies;
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use engine::{score_response, ScoreReport, ScoringEngine};
pub use executor::{execute_rule, CompiledRule, RuleContext, RuleError, UNKNOWN_BAND};
pub use order::{evaluation_order, BrokenEdge, EvaluationOrder};
pub use score::{ScoreMap, ScoreValue};
