use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Questionnaire definition plus the named scoring rules applied to it.
///
/// Example YAML:
/// ```yaml
/// questions:
///   - id: q1
///     type: likert
///     options: [{ value: 1, label: Never }, { value: 5, label: Always }]
///   - id: q2
///     type: likert
///     reverse_score: true
///     options: [{ value: 1, label: Never }, { value: 5, label: Always }]
/// scoring_rules:
///   total:
///     type: sum
///     questions: [q1, q2]
///   severity:
///     type: threshold
///     input: total
///     thresholds:
///       - { min: 0, max: 4, label: Low }
///       - { min: 5, max: 10, label: High }
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SurveySchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default)]
    pub questions: Vec<Question>,

    /// Rules in declaration order. Declaration order is the root order for
    /// dependency sorting and the key order of every score map.
    #[serde(default)]
    pub scoring_rules: IndexMap<String, ScoringRule>,
}

impl SurveySchema {
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn rule(&self, name: &str) -> Option<&ScoringRule> {
        self.scoring_rules.get(name)
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.scoring_rules.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Question {
    pub id: String,

    #[serde(default)]
    pub text: String,

    #[serde(rename = "type", default)]
    pub kind: QuestionType,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<AnswerOption>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub reverse_score: bool,
}

impl Question {
    /// Lowest and highest option values, if every option is numeric.
    ///
    /// Returns `None` for an empty option list or when any option value is
    /// not a number, in which case reverse scoring cannot be applied.
    pub fn option_range(&self) -> Option<(f64, f64)> {
        let mut range: Option<(f64, f64)> = None;
        for option in &self.options {
            let value = option.value.as_number()?;
            range = Some(match range {
                None => (value, value),
                Some((min, max)) => (min.min(value), max.max(value)),
            });
        }
        range
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    #[default]
    Likert,
    Numeric,
    Choice,
    Text,
    Other(String),
}

impl From<String> for QuestionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "likert" => QuestionType::Likert,
            "numeric" => QuestionType::Numeric,
            "choice" => QuestionType::Choice,
            "text" => QuestionType::Text,
            _ => QuestionType::Other(value),
        }
    }
}

impl From<QuestionType> for String {
    fn from(value: QuestionType) -> Self {
        match value {
            QuestionType::Likert => "likert".to_string(),
            QuestionType::Numeric => "numeric".to_string(),
            QuestionType::Choice => "choice".to_string(),
            QuestionType::Text => "text".to_string(),
            QuestionType::Other(other) => other,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AnswerOption {
    pub value: OptionValue,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum OptionValue {
    Number(f64),
    Text(String),
}

impl OptionValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            OptionValue::Number(n) => Some(*n),
            OptionValue::Text(text) => text.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ScoringRule {
    #[serde(rename = "type")]
    pub kind: RuleKind,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<String>,

    /// Name of another rule whose value feeds a threshold rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Vec<ThresholdBand>>,

    /// Text shown alongside a raised flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Rule kind. Unrecognised kinds are kept verbatim and score as null.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum RuleKind {
    #[default]
    Sum,
    Average,
    Computed,
    Threshold,
    Flag,
    Other(String),
}

impl RuleKind {
    /// Name under which a `sum`/`average` rule's own aggregate is visible
    /// to its formula.
    pub fn implicit_binding(&self) -> Option<&'static str> {
        match self {
            RuleKind::Sum => Some("sum"),
            RuleKind::Average => Some("average"),
            _ => None,
        }
    }
}

impl From<String> for RuleKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "sum" => RuleKind::Sum,
            "average" | "mean" => RuleKind::Average,
            "computed" => RuleKind::Computed,
            "threshold" => RuleKind::Threshold,
            "flag" => RuleKind::Flag,
            _ => RuleKind::Other(value),
        }
    }
}

impl From<RuleKind> for String {
    fn from(value: RuleKind) -> Self {
        value.to_string()
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::Sum => write!(f, "sum"),
            RuleKind::Average => write!(f, "average"),
            RuleKind::Computed => write!(f, "computed"),
            RuleKind::Threshold => write!(f, "threshold"),
            RuleKind::Flag => write!(f, "flag"),
            RuleKind::Other(other) => write!(f, "{}", other),
        }
    }
}

/// Closed interval `[min, max]` mapped to a label.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ThresholdBand {
    pub min: f64,
    pub max: f64,
    pub label: String,
}

impl ThresholdBand {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}
