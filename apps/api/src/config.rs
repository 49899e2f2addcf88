use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::matching::scorer::{ScorerBackend, DEFAULT_NEUTRAL_SCORE};

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Only required for the enhanced scorer.
    pub anthropic_api_key: Option<String>,
    pub scorer_backend: ScorerBackend,
    /// Replaces the built-in synonym table when set.
    pub taxonomy_path: Option<PathBuf>,
    /// Score assigned to jobs with no parsed requirements.
    pub neutral_score: f64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let scorer_backend = match optional_env("SCORER_BACKEND") {
            Some(raw) => raw.parse::<ScorerBackend>().map_err(anyhow::Error::msg)?,
            None => ScorerBackend::default(),
        };

        let config = Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            scorer_backend,
            taxonomy_path: optional_env("TAXONOMY_PATH").map(PathBuf::from),
            neutral_score: parse_neutral_score(optional_env("NEUTRAL_SCORE").as_deref())?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Cross-field checks that cannot be expressed per variable.
    pub fn validate(&self) -> Result<()> {
        if self.scorer_backend == ScorerBackend::Enhanced && self.anthropic_api_key.is_none() {
            bail!("ANTHROPIC_API_KEY is required when SCORER_BACKEND=enhanced");
        }
        Ok(())
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_neutral_score(raw: Option<&str>) -> Result<f64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_NEUTRAL_SCORE);
    };
    let score = raw
        .parse::<f64>()
        .with_context(|| format!("NEUTRAL_SCORE must be a number, got '{raw}'"))?;
    if !(0.0..=100.0).contains(&score) {
        bail!("NEUTRAL_SCORE must lie within 0–100, got {score}");
    }
    Ok(score)
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/jobmatch_test".to_string(),
        anthropic_api_key: None,
        scorer_backend: ScorerBackend::Basic,
        taxonomy_path: None,
        neutral_score: DEFAULT_NEUTRAL_SCORE,
        port: 8080,
        rust_log: "debug".to_string(),
    }
}
