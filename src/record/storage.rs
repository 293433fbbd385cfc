use super::types::{ScoreArchive, ScoredResponse};
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::{self, File};
use std::path::Path;

/// Load a score archive written by [`save_scored_responses`].
///
/// If the file exists but has an unsupported version, returns an error.
pub fn load_scored_responses(path: &Path) -> Result<ScoreArchive> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open score archive at {}", path.display()))?;

    let archive: ScoreArchive =
        serde_json::from_reader(file).context("Failed to load score archive")?;

    if archive.version != ScoreArchive::VERSION {
        anyhow::bail!("Unsupported score archive version: {}", archive.version);
    }

    Ok(archive)
}

/// Save scored responses to a JSON file atomically.
///
/// The file is either fully replaced or left untouched; a reader never sees a
/// half-written archive. Parent directories are created as needed.
pub fn save_scored_responses(
    path: &Path,
    schema_title: Option<String>,
    records: Vec<ScoredResponse>,
) -> Result<ScoreArchive> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let archive = ScoreArchive::new(schema_title, records);

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, &archive).context("Failed to serialize scores")?;

    file.commit()
        .with_context(|| format!("Failed to save scores to {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        records = archive.records.len(),
        "saved scored responses"
    );

    Ok(archive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{
        Diagnostic, DiagnosticKind, RawAnswers, ScoreMap, ScoreReport, ScoreValue,
    };

    fn record(source: &str) -> ScoredResponse {
        let answers: RawAnswers = [("q1", 2.0), ("q2", 3.0)].into_iter().collect();
        let scores: ScoreMap = [
            ("total", ScoreValue::Number(5.0)),
            ("band", ScoreValue::Label("Low".to_string())),
        ]
        .into_iter()
        .collect();
        ScoredResponse::new(
            source,
            answers,
            ScoreReport {
                scores,
                diagnostics: vec![Diagnostic::new(
                    "band",
                    DiagnosticKind::ExpressionFailed,
                    "unknown name 'x'",
                )],
            },
        )
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("scores.json");

        save_scored_responses(&path, Some("PHQ-9".to_string()), vec![record("a.json"), record("b.json")])
            .unwrap();

        let loaded = load_scored_responses(&path).unwrap();
        assert_eq!(loaded.version, ScoreArchive::VERSION);
        assert_eq!(loaded.schema_title.as_deref(), Some("PHQ-9"));
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.records[0].source, "a.json");
        assert_eq!(loaded.records[0].scores.number("total"), Some(5.0));
        assert_eq!(loaded.records[1].diagnostics.len(), 1);
    }

    #[test]
    fn test_loaded_archive_feeds_statistics() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        save_scored_responses(&path, None, vec![record("a.json"), record("b.json")]).unwrap();

        let loaded = load_scored_responses(&path).unwrap();
        let stats = crate::analytics::summarize(loaded.records.iter().map(|r| &r.scores));
        assert_eq!(stats["total"].numeric.as_ref().unwrap().mean, 5.0);
        assert_eq!(stats["band"].labels["Low"], 2);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_scored_responses(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_load_rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        fs::write(&path, r#"{"version": 9, "records": []}"#).unwrap();
        let err = load_scored_responses(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported score archive version"));
    }
}
