use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value produced by one rule.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ScoreValue {
    Number(f64),
    Flag(bool),
    Label(String),
    Null,
}

impl ScoreValue {
    /// The value as seen by other rules' formulas: numbers as-is, flags as
    /// 1 or 0. Labels and nulls have no numeric reading.
    pub fn as_binding(&self) -> Option<f64> {
        match self {
            ScoreValue::Number(n) => Some(*n),
            ScoreValue::Flag(true) => Some(1.0),
            ScoreValue::Flag(false) => Some(0.0),
            ScoreValue::Label(_) | ScoreValue::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ScoreValue::Null)
    }
}

impl fmt::Display for ScoreValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreValue::Number(n) => write!(f, "{}", n),
            ScoreValue::Flag(b) => write!(f, "{}", b),
            ScoreValue::Label(label) => write!(f, "{}", label),
            ScoreValue::Null => write!(f, "null"),
        }
    }
}

/// Rule name to computed value. Built fresh for every scored response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ScoreMap(IndexMap<String, ScoreValue>);

impl ScoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ScoreValue> {
        self.0.get(name)
    }

    /// Numeric value of a score, if it has one.
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.0.get(name) {
            Some(ScoreValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ScoreValue) {
        self.0.insert(name.into(), value);
    }

    pub(crate) fn take(&mut self, name: &str) -> Option<ScoreValue> {
        self.0.swap_remove(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ScoreValue)> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<(K, ScoreValue)> for ScoreMap {
    fn from_iter<I: IntoIterator<Item = (K, ScoreValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
