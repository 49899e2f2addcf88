//! Match store — reads profile skills and job requirements, upserts match results.
//!
//! `job_matches` is keyed by `(profile_id, job_id)`; writes go through
//! `ON CONFLICT ... DO UPDATE` so re-scoring never duplicates a row.

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::job::RequirementEntry;
use crate::models::matches::{MatchResult, RankedMatchRow};
use crate::models::profile::{SkillEntry, SkillRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

pub async fn profile_exists(pool: &PgPool, profile_id: Uuid) -> sqlx::Result<bool> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM profiles WHERE id = $1)")
        .bind(profile_id)
        .fetch_one(pool)
        .await
}

/// Skills of a profile in extraction order.
pub async fn get_profile_skills(pool: &PgPool, profile_id: Uuid) -> Result<Vec<SkillEntry>> {
    let rows = sqlx::query_as::<_, SkillRow>(
        "SELECT raw_text, category, level, years FROM profile_skills \
         WHERE profile_id = $1 ORDER BY position, id",
    )
    .bind(profile_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(SkillEntry::try_from).collect()
}

/// Requirements of a job in posting order, or `None` when the job does not exist.
pub async fn get_job_requirements(
    pool: &PgPool,
    job_id: Uuid,
) -> sqlx::Result<Option<Vec<RequirementEntry>>> {
    let requirements: Option<Vec<String>> =
        sqlx::query_scalar("SELECT requirements FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(pool)
            .await?;

    Ok(requirements.map(|reqs| reqs.into_iter().map(RequirementEntry::new).collect()))
}

/// Most recently fetched jobs first. `None` lists all of them.
pub async fn list_job_ids(pool: &PgPool, limit: Option<i64>) -> sqlx::Result<Vec<Uuid>> {
    sqlx::query_scalar("SELECT id FROM jobs ORDER BY fetched_at DESC, id LIMIT $1")
        .bind(limit)
        .fetch_all(pool)
        .await
}

pub async fn list_profile_ids(pool: &PgPool) -> sqlx::Result<Vec<Uuid>> {
    sqlx::query_scalar("SELECT id FROM profiles ORDER BY created_at, id")
        .fetch_all(pool)
        .await
}

/// Inserts the result, or replaces the existing row for the same pair.
pub async fn upsert_match(pool: &PgPool, result: &MatchResult) -> sqlx::Result<UpsertOutcome> {
    // xmax is 0 only for freshly inserted tuples
    let inserted: bool = sqlx::query_scalar(
        r#"
        INSERT INTO job_matches
            (profile_id, job_id, match_score, matched_skills, missing_skills,
             notes, scorer_backend, scored_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (profile_id, job_id) DO UPDATE SET
            match_score = EXCLUDED.match_score,
            matched_skills = EXCLUDED.matched_skills,
            missing_skills = EXCLUDED.missing_skills,
            notes = EXCLUDED.notes,
            scorer_backend = EXCLUDED.scorer_backend,
            scored_at = EXCLUDED.scored_at
        RETURNING (xmax = 0)
        "#,
    )
    .bind(result.profile_id)
    .bind(result.job_id)
    .bind(result.score)
    .bind(&result.matched_skills)
    .bind(&result.missing_skills)
    .bind(&result.notes)
    .bind(result.scorer_backend.as_str())
    .bind(result.scored_at)
    .fetch_one(pool)
    .await?;

    Ok(if inserted {
        UpsertOutcome::Created
    } else {
        UpsertOutcome::Updated
    })
}

/// Matches of a profile at or above `min_score`, best first.
pub async fn get_matches_for_profile(
    pool: &PgPool,
    profile_id: Uuid,
    min_score: f64,
    limit: i64,
) -> sqlx::Result<Vec<RankedMatchRow>> {
    sqlx::query_as::<_, RankedMatchRow>(
        r#"
        SELECT
            jm.id, jm.profile_id, jm.job_id, jm.match_score,
            jm.matched_skills, jm.missing_skills, jm.notes,
            jm.scorer_backend, jm.scored_at,
            j.title, j.company, j.location, j.apply_url
        FROM job_matches jm
        JOIN jobs j ON jm.job_id = j.id
        WHERE jm.profile_id = $1 AND jm.match_score >= $2
        ORDER BY jm.match_score DESC, jm.scored_at DESC
        LIMIT $3
        "#,
    )
    .bind(profile_id)
    .bind(min_score)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Used only by a refreshing profile sweep.
pub async fn delete_matches_for_profile(pool: &PgPool, profile_id: Uuid) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM job_matches WHERE profile_id = $1")
        .bind(profile_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
