use crate::survey::{load_document, SurveySchema};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A raw answer as collected by the form layer.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl AnswerValue {
    /// Numeric reading of the answer, if there is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(n) if n.is_finite() => Some(*n),
            AnswerValue::Number(_) => None,
            AnswerValue::Text(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            AnswerValue::Other(_) => None,
        }
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        AnswerValue::Number(value)
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

/// Answers for one response, keyed by question id.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct RawAnswers(IndexMap<String, AnswerValue>);

impl RawAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, question_id: impl Into<String>, value: impl Into<AnswerValue>) {
        self.0.insert(question_id.into(), value.into());
    }

    pub fn remove(&mut self, question_id: &str) -> Option<AnswerValue> {
        self.0.shift_remove(question_id)
    }

    pub fn get(&self, question_id: &str) -> Option<&AnswerValue> {
        self.0.get(question_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AnswerValue)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<AnswerValue>> FromIterator<(K, V)> for RawAnswers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Load one response's answers from a YAML or JSON file.
pub fn load_answers(path: &Path) -> Result<RawAnswers> {
    load_document(path).with_context(|| format!("Failed to load answers from {}", path.display()))
}

/// Numeric value of one item.
///
/// Missing, null or non-numeric answers count as 0 so that partially
/// completed questionnaires still score. When the question is reverse-scored
/// and its options are all numeric the answer is mirrored within the option
/// range: `max + min - value`.
pub fn resolve_item(schema: &SurveySchema, answers: &RawAnswers, question_id: &str) -> f64 {
    let Some(value) = answers.get(question_id).and_then(AnswerValue::as_number) else {
        return 0.0;
    };

    let Some(question) = schema.question(question_id) else {
        return value;
    };

    if !question.reverse_score {
        return value;
    }

    match question.option_range() {
        Some((min, max)) => max + min - value,
        None => {
            tracing::debug!(
                question = question_id,
                "reverse scoring skipped: options missing or not numeric"
            );
            value
        }
    }
}
