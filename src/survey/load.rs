use super::types::SurveySchema;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a YAML or JSON document. Files ending in `.json` are parsed as JSON,
/// everything else as YAML.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        anyhow::bail!("File not found at {}", path.display());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}: invalid JSON", path.display()))
    } else {
        serde_saphyr::from_str(&content)
            .with_context(|| format!("Failed to parse {}: invalid YAML", path.display()))
    }
}

/// Load a survey schema from disk.
pub fn load_schema(path: &Path) -> Result<SurveySchema> {
    let schema: SurveySchema = load_document(path)
        .with_context(|| format!("Failed to load survey schema from {}", path.display()))?;

    tracing::debug!(
        path = %path.display(),
        questions = schema.questions.len(),
        rules = schema.scoring_rules.len(),
        "loaded survey schema"
    );

    Ok(schema)
}

/// Resolve the `--schema` argument to a file.
///
/// An existing path is used as-is. Otherwise a bare instrument name is looked
/// up in the configured schema directory as `<name>.yaml`, `<name>.yml` or
/// `<name>.json`.
pub fn resolve_schema_path(reference: &str, schema_dir: Option<&Path>) -> Result<PathBuf> {
    let direct = PathBuf::from(reference);
    if direct.exists() {
        return Ok(direct);
    }

    if let Some(dir) = schema_dir {
        for ext in ["yaml", "yml", "json"] {
            let candidate = dir.join(format!("{}.{}", reference, ext));
            if candidate.exists() {
                return Ok(candidate);
            }
        }
        anyhow::bail!(
            "Schema '{}' not found as a file or in {}",
            reference,
            dir.display()
        );
    }

    anyhow::bail!("Schema file not found at {}", direct.display())
}
