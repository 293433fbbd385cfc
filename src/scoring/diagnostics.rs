use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A formula or condition failed to parse or evaluate; the rule used 0 or false.
    ExpressionFailed,
    /// A dependency edge was dropped to break a cycle.
    CycleBroken,
    /// The rule could not be evaluated and scored null.
    RuleFailed,
    /// The rule kind is not recognised; the rule scored null.
    UnknownRuleKind,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DiagnosticKind::ExpressionFailed => "expression failed",
            DiagnosticKind::CycleBroken => "cycle broken",
            DiagnosticKind::RuleFailed => "rule failed",
            DiagnosticKind::UnknownRuleKind => "unknown rule kind",
        };
        write!(f, "{}", text)
    }
}

/// Non-fatal problem encountered while scoring one response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub rule: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(rule: impl Into<String>, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.rule, self.kind, self.message)
    }
}

/// Collects diagnostics for one scoring pass and logs each as it arrives.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.kind {
            DiagnosticKind::CycleBroken => tracing::debug!(
                rule = %diagnostic.rule,
                "{}", diagnostic.message
            ),
            _ => tracing::warn!(
                rule = %diagnostic.rule,
                kind = %diagnostic.kind,
                "{}", diagnostic.message
            ),
        }
        self.entries.push(diagnostic);
    }

    pub fn report(&mut self, rule: &str, kind: DiagnosticKind, message: impl Into<String>) {
        self.push(Diagnostic::new(rule, kind, message));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_in_order() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());
        diagnostics.report("a", DiagnosticKind::ExpressionFailed, "unknown name 'x'");
        diagnostics.report("b", DiagnosticKind::RuleFailed, "no input");
        let entries = diagnostics.into_vec();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].rule, "a");
        assert_eq!(entries[1].kind, DiagnosticKind::RuleFailed);
    }

    #[test]
    fn test_display() {
        let diagnostic = Diagnostic::new("risk", DiagnosticKind::ExpressionFailed, "division by zero");
        assert_eq!(diagnostic.to_string(), "risk: expression failed: division by zero");
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&DiagnosticKind::UnknownRuleKind).unwrap();
        assert_eq!(json, r#""unknown_rule_kind""#);
    }
}
