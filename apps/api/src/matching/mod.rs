// Skill matching engine: taxonomy canonicalization, pluggable scorers,
// match persistence and re-score sweeps. All LLM calls go through llm_client.

pub mod handlers;
pub mod prompts;
pub mod scorer;
pub mod store;
pub mod sweep;
pub mod taxonomy;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    /// A profile or job id is missing, so the result could not be persisted.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The synonym table could not be read or failed validation.
    #[error("Failed to load skill taxonomy from {source_name}: {reason}")]
    TaxonomyLoad { source_name: String, reason: String },
}
