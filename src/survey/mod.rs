mod load;
mod types;

pub use load::{load_document, load_schema, resolve_schema_path};
pub use types::{
    AnswerOption, OptionValue, Question, QuestionType, RuleKind, ScoringRule, SurveySchema,
    ThresholdBand,
};
