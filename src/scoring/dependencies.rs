use crate::expr::referenced_names;
use crate::survey::ScoringRule;
use indexmap::IndexSet;

/// Rule names this rule reads, in discovery order: `input`, then names in
/// `formula`, then names in `condition`.
///
/// Only names accepted by `is_rule` are returned. Names are matched as
/// whole identifiers, so a rule called `sum` is never found inside `summary`.
/// The implicit aggregate binding of a `sum`/`average` rule is not a
/// dependency of that rule's own formula.
pub fn rule_dependencies<F>(rule: &ScoringRule, is_rule: F) -> IndexSet<String>
where
    F: Fn(&str) -> bool,
{
    let shadowed = rule.kind.implicit_binding();
    let mut dependencies = IndexSet::new();

    if let Some(input) = &rule.input {
        if is_rule(input) {
            dependencies.insert(input.clone());
        }
    }

    if let Some(formula) = &rule.formula {
        for name in referenced_names(formula) {
            if Some(name.as_str()) != shadowed && is_rule(&name) {
                dependencies.insert(name);
            }
        }
    }

    if let Some(condition) = &rule.condition {
        for name in referenced_names(condition) {
            if is_rule(&name) {
                dependencies.insert(name);
            }
        }
    }

    dependencies
}
