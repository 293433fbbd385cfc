use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Filter used when neither RUST_LOG nor the config names one.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log level/filter '{value}': unable to build EnvFilter")]
    EnvFilter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("telemetry error: {0}")]
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

/// Pick the filter directive: `--verbose` wins, then RUST_LOG, then the
/// configured level, then [`DEFAULT_LOG_LEVEL`].
pub fn build_filter(verbose: bool, configured: Option<&str>) -> Result<EnvFilter, TelemetryError> {
    if verbose {
        return parse_filter("debug");
    }
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => parse_filter(configured.unwrap_or(DEFAULT_LOG_LEVEL)),
    }
}

fn parse_filter(value: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(value).map_err(|source| TelemetryError::EnvFilter {
        value: value.to_string(),
        source,
    })
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean
/// for scores.
pub fn init(verbose: bool, configured: Option<&str>) -> Result<(), TelemetryError> {
    let env_filter = build_filter(verbose, configured)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_always_parses() {
        assert!(build_filter(true, Some("not a [valid filter")).is_ok());
    }

    #[test]
    fn test_invalid_configured_filter() {
        let err = parse_filter("survey_scorer=loud").unwrap_err();
        assert!(err.to_string().contains("'survey_scorer=loud'"));
    }
}
