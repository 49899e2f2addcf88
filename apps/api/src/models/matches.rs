use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::matching::scorer::ScorerBackend;

/// Outcome of scoring one profile against one job.
///
/// `(profile_id, job_id)` is the persistence key; re-scoring replaces the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub profile_id: Uuid,
    pub job_id: Uuid,
    pub score: f64, // 0.0 – 100.0, one decimal
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub notes: String,
    pub scorer_backend: ScorerBackend,
    pub scored_at: DateTime<Utc>,
}

/// A persisted match joined with the job it refers to, for ranked listings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RankedMatchRow {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub job_id: Uuid,
    pub match_score: f64,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub notes: Option<String>,
    pub scorer_backend: String,
    pub scored_at: DateTime<Utc>,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub apply_url: Option<String>,
}
