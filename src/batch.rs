use anyhow::{Context, Result};
use crate::record::ScoredResponse;
use crate::scoring::{load_answers, ScoringEngine};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Expand answer path arguments into concrete files.
///
/// Arguments containing glob metacharacters are expanded; anything else is
/// taken as a literal path so a missing file still surfaces as a load error.
/// Duplicates are removed, first occurrence kept.
pub fn expand_answer_paths(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut paths = Vec::new();

    for pattern in patterns {
        if !pattern.contains(['*', '?', '[']) {
            let path = PathBuf::from(pattern);
            if seen.insert(path.clone()) {
                paths.push(path);
            }
            continue;
        }

        let matches = glob::glob(pattern)
            .with_context(|| format!("Invalid answers pattern '{}'", pattern))?;
        let mut matched_any = false;
        for entry in matches {
            match entry {
                Ok(path) => {
                    matched_any = true;
                    if seen.insert(path.clone()) {
                        paths.push(path);
                    }
                }
                Err(e) => tracing::warn!("Skipping unreadable path: {}", e),
            }
        }
        if !matched_any {
            tracing::warn!(pattern = %pattern, "pattern matched no files");
        }
    }

    Ok(paths)
}

/// A batch of scored responses plus the files that could not be scored.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub scored: Vec<ScoredResponse>,
    pub failed: Vec<(PathBuf, anyhow::Error)>,
}

/// Load and score every answers file concurrently.
///
/// Each file is an independent unit of work on the blocking pool; a file that
/// fails to load is logged and recorded in `failed` while the others still
/// score. Results are sorted by source path.
pub async fn score_files(engine: Arc<ScoringEngine>, paths: Vec<PathBuf>) -> BatchOutcome {
    let mut futures = FuturesUnordered::new();
    for path in paths {
        let engine = Arc::clone(&engine);
        futures.push(async move {
            let task_path = path.clone();
            let joined = tokio::task::spawn_blocking(move || {
                let answers = load_answers(&task_path)?;
                let report = engine.evaluate(&answers);
                Ok::<_, anyhow::Error>(ScoredResponse::new(
                    task_path.display().to_string(),
                    answers,
                    report,
                ))
            })
            .await;
            let result = match joined {
                Ok(result) => result,
                Err(e) => Err(anyhow::anyhow!("Scoring task failed: {}", e)),
            };
            (path, result)
        });
    }

    let mut outcome = BatchOutcome::default();
    while let Some((path, result)) = futures.next().await {
        match result {
            Ok(record) => {
                tracing::debug!(
                    source = %record.source,
                    diagnostics = record.diagnostics.len(),
                    "scored response"
                );
                outcome.scored.push(record);
            }
            Err(e) => {
                tracing::error!(path = %path.display(), "failed to score: {:#}", e);
                outcome.failed.push((path, e));
            }
        }
    }

    outcome.scored.sort_by(|a, b| a.source.cmp(&b.source));
    outcome.failed.sort_by(|a, b| a.0.cmp(&b.0));
    outcome
}
