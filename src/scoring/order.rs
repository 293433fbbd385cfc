use super::dependencies::rule_dependencies;
use crate::survey::SurveySchema;
use serde::Serialize;

/// Traversal state of one rule during ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// A dependency edge dropped to break a cycle: `from` reads `to`, but `to`
/// was still being ordered when `from` was reached through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokenEdge {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct EvaluationOrder {
    /// Every rule name exactly once.
    pub order: Vec<String>,
    pub broken_edges: Vec<BrokenEdge>,
}

impl EvaluationOrder {
    pub fn has_cycles(&self) -> bool {
        !self.broken_edges.is_empty()
    }
}

/// Order rules so each comes after the rules it reads.
///
/// Depth-first, roots taken in declaration order. A rule whose dependency is
/// still in progress (a cycle) is scheduled anyway and the edge is recorded
/// in `broken_edges`; ordering never fails. The walk uses an explicit stack
/// so long dependency chains cannot overflow the call stack.
pub fn evaluation_order(schema: &SurveySchema) -> EvaluationOrder {
    let names: Vec<&str> = schema.rule_names().collect();

    let edges: Vec<Vec<usize>> = schema
        .scoring_rules
        .values()
        .map(|rule| {
            rule_dependencies(rule, |name| schema.scoring_rules.contains_key(name))
                .iter()
                .filter_map(|dep| schema.scoring_rules.get_index_of(dep.as_str()))
                .collect()
        })
        .collect();

    let mut marks = vec![Mark::Unvisited; names.len()];
    let mut order = Vec::with_capacity(names.len());
    let mut broken_edges = Vec::new();
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..names.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        marks[root] = Mark::InProgress;
        stack.push((root, 0));

        while let Some(&(node, next)) = stack.last() {
            if let Some(&dep) = edges[node].get(next) {
                let top = stack.len() - 1;
                stack[top].1 += 1;

                match marks[dep] {
                    Mark::Unvisited => {
                        marks[dep] = Mark::InProgress;
                        stack.push((dep, 0));
                    }
                    Mark::InProgress => {
                        tracing::debug!(
                            from = names[node],
                            to = names[dep],
                            "dependency cycle: edge dropped"
                        );
                        broken_edges.push(BrokenEdge {
                            from: names[node].to_string(),
                            to: names[dep].to_string(),
                        });
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                order.push(names[node].to_string());
                stack.pop();
            }
        }
    }

    EvaluationOrder {
        order,
        broken_edges,
    }
}
