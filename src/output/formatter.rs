use std::io::IsTerminal;
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

use indexmap::IndexMap;

use crate::analytics::ScoreStats;
use crate::record::ScoredResponse;
use crate::scoring::{rule_dependencies, ScoreValue, ScoringEngine};
use crate::survey::{RuleKind, ScoringRule};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a number with at most three decimals and no trailing zeros
/// ("3", "2.5", "0.333").
pub fn format_number(value: f64) -> String {
    let formatted = format!("{:.3}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Plain-text rendering of a score value.
pub fn format_value(value: &ScoreValue) -> String {
    match value {
        ScoreValue::Number(n) => format_number(*n),
        ScoreValue::Flag(flag) => flag.to_string(),
        ScoreValue::Label(label) => label.clone(),
        ScoreValue::Null => "null".to_string(),
    }
}

fn colorize_value(value: &ScoreValue, text: &str) -> String {
    match value {
        ScoreValue::Number(_) => text.bold().to_string(),
        ScoreValue::Flag(true) => text.red().bold().to_string(),
        ScoreValue::Flag(false) => text.green().to_string(),
        ScoreValue::Label(_) => text.cyan().to_string(),
        ScoreValue::Null => text.dimmed().to_string(),
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format scored responses as one block per response.
///
/// Each block starts with the source, followed by one row per rule:
/// index, rule name padded to the longest name, value. Values are truncated
/// to the terminal width when stdout is a terminal. Diagnostics follow the
/// rows.
pub fn format_score_table(records: &[ScoredResponse], use_colors: bool) -> String {
    if records.is_empty() {
        return "No responses scored.".to_string();
    }

    let term_width = get_terminal_width();

    records
        .iter()
        .map(|record| {
            let mut lines = Vec::new();
            lines.push(if use_colors {
                record.source.bold().underline().to_string()
            } else {
                record.source.clone()
            });

            let name_width = record.scores.names().map(|n| n.chars().count()).max().unwrap_or(0);
            // index "99." + space + name + two-space separator
            let fixed_width = 4 + name_width + 2;

            for (idx, (name, value)) in record.scores.iter().enumerate() {
                let index_str = format!("{:>2}.", idx + 1);
                let name_padded = format!("{:<width$}", name, width = name_width);
                let text = format_value(value);
                let text = match term_width {
                    Some(width) if width > fixed_width + 10 => truncate(&text, width - fixed_width),
                    Some(_) => truncate(&text, 20),
                    None => text,
                };

                if use_colors {
                    lines.push(format!(
                        "{} {}  {}",
                        index_str.dimmed(),
                        name_padded,
                        colorize_value(value, &text)
                    ));
                } else {
                    lines.push(format!("{} {}  {}", index_str, name_padded, text));
                }
            }

            for diagnostic in &record.diagnostics {
                let line = format!("  ! {}", diagnostic);
                lines.push(if use_colors {
                    line.yellow().to_string()
                } else {
                    line
                });
            }

            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format scored responses as tab-separated values for scripting
/// Columns: source, rule, value (no headers, no colors)
pub fn format_tsv(records: &[ScoredResponse]) -> String {
    records
        .iter()
        .flat_map(|record| {
            record.scores.iter().map(move |(name, value)| {
                format!("{}\t{}\t{}", record.source, name, format_value(value))
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format scored responses as pretty JSON.
pub fn format_json(records: &[ScoredResponse]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// One-line human description of what a rule computes.
pub fn describe_rule(rule: &ScoringRule) -> String {
    if let Some(description) = &rule.description {
        return description.clone();
    }

    match &rule.kind {
        RuleKind::Sum | RuleKind::Average => {
            let verb = if rule.kind == RuleKind::Sum { "sum" } else { "average" };
            let mut text = if rule.questions.is_empty() {
                format!("{} of no questions", verb)
            } else {
                format!("{} of {}", verb, rule.questions.join(", "))
            };
            if let Some(formula) = &rule.formula {
                text.push_str(&format!(", then {}", formula));
            }
            text
        }
        RuleKind::Computed => match &rule.formula {
            Some(formula) => format!("computed as {}", formula),
            None => "computed (no formula, always 0)".to_string(),
        },
        RuleKind::Threshold => {
            let input = rule.input.as_deref().unwrap_or("(no input)");
            match rule.thresholds.as_deref() {
                Some(bands) if !bands.is_empty() => {
                    let bands = bands
                        .iter()
                        .map(|b| {
                            format!("{} [{}, {}]", b.label, format_number(b.min), format_number(b.max))
                        })
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("bands of {}: {}", input, bands)
                }
                _ => match &rule.formula {
                    Some(formula) => format!("{} with input {}", formula, input),
                    None => format!("passes {} through", input),
                },
            }
        }
        RuleKind::Flag => {
            let condition = rule.condition.as_deref().unwrap_or("false");
            match &rule.message {
                Some(message) => format!("flag when {} ({})", condition, message),
                None => format!("flag when {}", condition),
            }
        }
        RuleKind::Other(kind) => format!("unsupported rule type '{}' (always null)", kind),
    }
}

/// Format the evaluation plan of an engine: one line per rule in evaluation
/// order with its dependencies and description, then any dropped cycle edges.
pub fn format_explain(engine: &ScoringEngine, use_colors: bool) -> String {
    let schema = engine.schema();
    let order = engine.order();
    let mut lines = Vec::new();

    if let Some(title) = &schema.title {
        let heading = match &schema.version {
            Some(version) => format!("{} (v{})", title, version),
            None => title.clone(),
        };
        lines.push(if use_colors { heading.bold().to_string() } else { heading });
    }

    let name_width = order.order.iter().map(|n| n.chars().count()).max().unwrap_or(0);

    for (idx, name) in order.order.iter().enumerate() {
        let Some(rule) = schema.rule(name) else {
            continue;
        };
        let dependencies = rule_dependencies(rule, |n| schema.scoring_rules.contains_key(n));
        let index_str = format!("{:>2}.", idx + 1);
        let name_padded = format!("{:<width$}", name, width = name_width);
        let kind = format!("{:<9}", rule.kind.to_string());
        let mut line = if use_colors {
            format!(
                "{} {}  {}  {}",
                index_str.dimmed(),
                name_padded.bold(),
                kind.cyan(),
                describe_rule(rule)
            )
        } else {
            format!("{} {}  {}  {}", index_str, name_padded, kind, describe_rule(rule))
        };
        if !dependencies.is_empty() {
            let deps = dependencies.iter().cloned().collect::<Vec<_>>().join(", ");
            line.push_str(&format!("  <- {}", deps));
        }
        lines.push(line);
    }

    if order.has_cycles() {
        lines.push(String::new());
        let heading = "Circular dependencies broken:";
        lines.push(if use_colors {
            heading.yellow().to_string()
        } else {
            heading.to_string()
        });
        for edge in &order.broken_edges {
            lines.push(format!("  {} -> {}", edge.from, edge.to));
        }
    }

    if lines.is_empty() {
        "No scoring rules defined.".to_string()
    } else {
        lines.join("\n")
    }
}

/// Format per-score statistics across a batch of responses.
pub fn format_stats(stats: &IndexMap<String, ScoreStats>, use_colors: bool) -> String {
    if stats.is_empty() {
        return "No scores to summarize.".to_string();
    }

    let mut lines = Vec::new();
    for (name, entry) in stats {
        let heading = format!("{} ({} responses)", name, entry.responses);
        lines.push(if use_colors { heading.bold().to_string() } else { heading });

        if let Some(numeric) = &entry.numeric {
            lines.push(format!(
                "  n={}  mean={}  median={}  min={}  max={}  sd={}",
                numeric.count,
                format_number(numeric.mean),
                format_number(numeric.median),
                format_number(numeric.min),
                format_number(numeric.max),
                format_number(numeric.std_dev)
            ));
        }
        if let Some(rate) = entry.flag_rate() {
            lines.push(format!(
                "  flagged {} of {} ({}%)",
                entry.flagged,
                entry.flagged + entry.unflagged,
                format_number(rate * 100.0)
            ));
        }
        for (label, count) in &entry.labels {
            lines.push(format!("  {}: {}", label, count));
        }
        if entry.nulls > 0 {
            let line = format!("  null: {}", entry.nulls);
            lines.push(if use_colors { line.dimmed().to_string() } else { line });
        }
    }

    lines.join("\n")
}
