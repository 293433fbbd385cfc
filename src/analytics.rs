//! Summary statistics over many scored responses.

use crate::scoring::{ScoreMap, ScoreValue};
use indexmap::IndexMap;
use serde::Serialize;

/// Descriptive statistics for the numeric values of one score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl NumericSummary {
    /// Returns `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let median = if count % 2 == 0 {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        } else {
            sorted[count / 2]
        };
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        Some(Self {
            count,
            mean,
            median,
            min: sorted[0],
            max: sorted[count - 1],
            std_dev: variance.sqrt(),
        })
    }
}

/// Everything observed for one score name across a set of responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreStats {
    pub responses: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSummary>,
    pub flagged: usize,
    pub unflagged: usize,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub labels: IndexMap<String, usize>,
    pub nulls: usize,
}

impl ScoreStats {
    /// Share of flag values that were `true`, if any flags were seen.
    pub fn flag_rate(&self) -> Option<f64> {
        let total = self.flagged + self.unflagged;
        (total > 0).then(|| self.flagged as f64 / total as f64)
    }
}

/// Aggregate score maps into per-score statistics.
///
/// Score names keep the order in which they were first seen. Label counts
/// keep first-seen order too, so the table reads the same on every run.
pub fn summarize<'a, I>(score_maps: I) -> IndexMap<String, ScoreStats>
where
    I: IntoIterator<Item = &'a ScoreMap>,
{
    let mut numbers: IndexMap<String, Vec<f64>> = IndexMap::new();
    let mut stats: IndexMap<String, ScoreStats> = IndexMap::new();

    for scores in score_maps {
        for (name, value) in scores.iter() {
            let entry = stats.entry(name.clone()).or_default();
            entry.responses += 1;
            match value {
                ScoreValue::Number(n) => numbers.entry(name.clone()).or_default().push(*n),
                ScoreValue::Flag(true) => entry.flagged += 1,
                ScoreValue::Flag(false) => entry.unflagged += 1,
                ScoreValue::Label(label) => *entry.labels.entry(label.clone()).or_default() += 1,
                ScoreValue::Null => entry.nulls += 1,
            }
        }
    }

    for (name, values) in numbers {
        if let Some(entry) = stats.get_mut(&name) {
            entry.numeric = NumericSummary::from_values(&values);
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, ScoreValue)]) -> ScoreMap {
        entries.iter().cloned().collect()
    }

    #[test]
    fn test_numeric_summary() {
        let summary = NumericSummary::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(summary.count, 8);
        assert_eq!(summary.mean, 5.0);
        assert_eq!(summary.median, 4.5);
        assert_eq!(summary.min, 2.0);
        assert_eq!(summary.max, 9.0);
        assert_eq!(summary.std_dev, 2.0);
    }

    #[test]
    fn test_numeric_summary_odd_count() {
        let summary = NumericSummary::from_values(&[3.0, 1.0, 2.0]).unwrap();
        assert_eq!(summary.median, 2.0);
    }

    #[test]
    fn test_numeric_summary_empty() {
        assert!(NumericSummary::from_values(&[]).is_none());
    }

    #[test]
    fn test_summarize_mixed_values() {
        let maps = vec![
            map(&[
                ("total", ScoreValue::Number(10.0)),
                ("band", ScoreValue::Label("High".to_string())),
                ("risk", ScoreValue::Flag(true)),
            ]),
            map(&[
                ("total", ScoreValue::Number(4.0)),
                ("band", ScoreValue::Label("Low".to_string())),
                ("risk", ScoreValue::Flag(false)),
            ]),
            map(&[
                ("total", ScoreValue::Null),
                ("band", ScoreValue::Label("High".to_string())),
                ("risk", ScoreValue::Flag(true)),
            ]),
        ];

        let stats = summarize(&maps);
        let names: Vec<&str> = stats.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["total", "band", "risk"]);

        let total = &stats["total"];
        assert_eq!(total.responses, 3);
        assert_eq!(total.nulls, 1);
        assert_eq!(total.numeric.as_ref().unwrap().mean, 7.0);

        let band = &stats["band"];
        assert_eq!(band.labels["High"], 2);
        assert_eq!(band.labels["Low"], 1);
        assert!(band.numeric.is_none());

        let risk = &stats["risk"];
        assert_eq!(risk.flagged, 2);
        assert_eq!(risk.unflagged, 1);
        assert!((risk.flag_rate().unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }
}
