//! Re-score sweeps: one profile against every job, or one job against every profile.
//!
//! Each pair is scored and upserted independently. A pair that fails is logged
//! and counted, and the sweep moves on.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::scorer::{ScoreRequest, Scorer};
use crate::matching::store::{self, UpsertOutcome};
use crate::models::job::RequirementEntry;
use crate::models::matches::MatchResult;
use crate::models::profile::SkillEntry;

const PROGRESS_EVERY: usize = 10;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SweepOptions {
    /// Delete the profile's existing matches before re-scoring.
    #[serde(default)]
    pub refresh: bool,
    /// Score at most this many of the most recently fetched jobs.
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepSummary {
    pub target_id: Uuid,
    pub scored: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub deleted: u64,
    pub best_score: Option<f64>,
}

impl SweepSummary {
    fn new(target_id: Uuid) -> Self {
        Self {
            target_id,
            ..Self::default()
        }
    }

    fn record(&mut self, result: &MatchResult, outcome: UpsertOutcome) {
        self.scored += 1;
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Updated => self.updated += 1,
        }
        self.best_score = Some(match self.best_score {
            Some(best) => best.max(result.score),
            None => result.score,
        });
    }
}

async fn score_and_store(
    pool: &PgPool,
    scorer: &dyn Scorer,
    profile_id: Uuid,
    job_id: Uuid,
    skills: &[SkillEntry],
    requirements: &[RequirementEntry],
) -> Result<(MatchResult, UpsertOutcome), AppError> {
    let result = scorer
        .score(ScoreRequest {
            profile_id: Some(profile_id),
            job_id: Some(job_id),
            profile_skills: skills,
            job_requirements: requirements,
        })
        .await?;
    let outcome = store::upsert_match(pool, &result).await?;
    Ok((result, outcome))
}

/// Scores a single stored pair and upserts the result.
pub async fn score_pair(
    pool: &PgPool,
    scorer: &dyn Scorer,
    profile_id: Uuid,
    job_id: Uuid,
) -> Result<MatchResult, AppError> {
    if !store::profile_exists(pool, profile_id).await? {
        return Err(AppError::NotFound(format!("Profile {profile_id} not found")));
    }
    let requirements = store::get_job_requirements(pool, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    let skills = store::get_profile_skills(pool, profile_id).await?;

    let (result, outcome) =
        score_and_store(pool, scorer, profile_id, job_id, &skills, &requirements).await?;

    info!(
        "Scored profile {profile_id} vs job {job_id}: {} ({:?})",
        result.score, outcome
    );
    Ok(result)
}

/// Scores one profile against every job (or the `limit` most recent ones).
pub async fn sweep_profile(
    pool: &PgPool,
    scorer: &dyn Scorer,
    profile_id: Uuid,
    options: &SweepOptions,
) -> Result<SweepSummary, AppError> {
    validate_limit(options.limit)?;

    if !store::profile_exists(pool, profile_id).await? {
        return Err(AppError::NotFound(format!("Profile {profile_id} not found")));
    }

    let mut summary = SweepSummary::new(profile_id);
    let skills = store::get_profile_skills(pool, profile_id).await?;

    if options.refresh {
        summary.deleted = store::delete_matches_for_profile(pool, profile_id).await?;
        info!(
            "Deleted {} existing matches for profile {profile_id}",
            summary.deleted
        );
    }

    let job_ids = store::list_job_ids(pool, options.limit).await?;
    info!(
        "Sweeping profile {profile_id} ({} skills) across {} jobs with {} scorer",
        skills.len(),
        job_ids.len(),
        scorer.backend()
    );

    let total = job_ids.len();
    for (i, job_id) in job_ids.into_iter().enumerate() {
        if (i + 1) % PROGRESS_EVERY == 0 {
            debug!("Progress: {}/{} jobs processed", i + 1, total);
        }

        // A job deleted since listing is skipped, not failed.
        let requirements = match store::get_job_requirements(pool, job_id).await {
            Ok(Some(requirements)) => requirements,
            Ok(None) => {
                summary.skipped += 1;
                continue;
            }
            Err(e) => {
                warn!("Failed to load requirements for job {job_id}: {e}");
                summary.failed += 1;
                continue;
            }
        };

        match score_and_store(pool, scorer, profile_id, job_id, &skills, &requirements).await {
            Ok((result, outcome)) => summary.record(&result, outcome),
            Err(e) => {
                warn!("Failed to score profile {profile_id} vs job {job_id}: {e}");
                summary.failed += 1;
            }
        }
    }

    info!(
        "Profile sweep {profile_id} done: {} scored ({} new, {} updated), {} skipped, {} failed",
        summary.scored, summary.created, summary.updated, summary.skipped, summary.failed
    );
    Ok(summary)
}

/// Scores one job against every profile.
pub async fn sweep_job(
    pool: &PgPool,
    scorer: &dyn Scorer,
    job_id: Uuid,
) -> Result<SweepSummary, AppError> {
    let requirements = store::get_job_requirements(pool, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let mut summary = SweepSummary::new(job_id);
    let profile_ids = store::list_profile_ids(pool).await?;
    info!(
        "Sweeping job {job_id} ({} requirements) across {} profiles",
        requirements.len(),
        profile_ids.len()
    );

    for profile_id in profile_ids {
        let outcome = match store::get_profile_skills(pool, profile_id).await {
            Ok(skills) => {
                score_and_store(pool, scorer, profile_id, job_id, &skills, &requirements).await
            }
            Err(e) => Err(AppError::Internal(e)),
        };

        match outcome {
            Ok((result, outcome)) => summary.record(&result, outcome),
            Err(e) => {
                warn!("Failed to score profile {profile_id} vs job {job_id}: {e}");
                summary.failed += 1;
            }
        }
    }

    info!(
        "Job sweep {job_id} done: {} scored ({} new, {} updated), {} failed",
        summary.scored, summary.created, summary.updated, summary.failed
    );
    Ok(summary)
}

fn validate_limit(limit: Option<i64>) -> Result<(), AppError> {
    match limit {
        Some(n) if n <= 0 => Err(AppError::Validation(format!(
            "limit must be positive, got {n}"
        ))),
        _ => Ok(()),
    }
}
