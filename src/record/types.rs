use crate::scoring::{Diagnostic, RawAnswers, ScoreMap, ScoreReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One scored response, ready to be stored next to its raw answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredResponse {
    /// Where the answers came from (usually the answers file path).
    pub source: String,
    pub scored_at: DateTime<Utc>,
    pub raw_answers: RawAnswers,
    pub scores: ScoreMap,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ScoredResponse {
    pub fn new(source: impl Into<String>, raw_answers: RawAnswers, report: ScoreReport) -> Self {
        Self {
            source: source.into(),
            scored_at: Utc::now(),
            raw_answers,
            scores: report.scores,
            diagnostics: report.diagnostics,
        }
    }
}

/// File format for a batch of scored responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreArchive {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_title: Option<String>,
    #[serde(default)]
    pub records: Vec<ScoredResponse>,
}

impl ScoreArchive {
    pub const VERSION: u32 = 1;

    pub fn new(schema_title: Option<String>, records: Vec<ScoredResponse>) -> Self {
        Self {
            version: Self::VERSION,
            schema_title,
            records,
        }
    }
}
