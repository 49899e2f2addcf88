//! Axum route handlers for the Matching API.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::scorer::ScoreRequest;
use crate::matching::store::get_matches_for_profile;
use crate::matching::sweep::{score_pair, sweep_job, sweep_profile, SweepOptions, SweepSummary};
use crate::models::job::RequirementEntry;
use crate::models::matches::{MatchResult, RankedMatchRow};
use crate::models::profile::SkillEntry;
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: i64 = 50;
const DEFAULT_TOP_LIMIT: i64 = 10;
const MAX_LIST_LIMIT: i64 = 500;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub profile_id: Option<Uuid>,
    #[serde(default)]
    pub job_id: Option<Uuid>,
    #[serde(default)]
    pub profile_skills: Vec<SkillEntry>,
    #[serde(default)]
    pub job_requirements: Vec<RequirementEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ScorePairRequest {
    pub profile_id: Uuid,
    pub job_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct MatchListQuery {
    pub min_score: Option<f64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TopMatchesQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CanonicalizeQuery {
    pub skill: String,
}

#[derive(Debug, Serialize)]
pub struct CanonicalizeResponse {
    pub raw: String,
    pub canonical: String,
    pub known: bool,
    pub synonyms: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/matches/preview
///
/// Scores inline skills against inline requirements without persisting.
/// Ids are still required so the result has the same shape as a stored match.
pub async fn handle_preview(
    State(state): State<AppState>,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<MatchResult>, AppError> {
    let result = state
        .scorer
        .score(ScoreRequest {
            profile_id: request.profile_id,
            job_id: request.job_id,
            profile_skills: &request.profile_skills,
            job_requirements: &request.job_requirements,
        })
        .await?;

    Ok(Json(result))
}

/// POST /api/v1/matches
///
/// Loads the stored profile and job, scores them and upserts the match.
pub async fn handle_score_pair(
    State(state): State<AppState>,
    Json(request): Json<ScorePairRequest>,
) -> Result<Json<MatchResult>, AppError> {
    let result = score_pair(
        &state.db,
        state.scorer.as_ref(),
        request.profile_id,
        request.job_id,
    )
    .await?;
    Ok(Json(result))
}

/// POST /api/v1/profiles/:id/matches/sweep
pub async fn handle_profile_sweep(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SweepSummary>, AppError> {
    let options = parse_sweep_options(&headers, &body)?;
    let summary = sweep_profile(&state.db, state.scorer.as_ref(), profile_id, &options).await?;
    Ok(Json(summary))
}

/// An empty body means default options. Anything else must be a JSON
/// `SweepOptions` object sent as `application/json`.
fn parse_sweep_options(headers: &HeaderMap, body: &[u8]) -> Result<SweepOptions, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(SweepOptions::default());
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let mime = content_type.split(';').next().unwrap_or("").trim();
    if !(mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")) {
        return Err(AppError::Validation(format!(
            "Sweep options must be sent as application/json, got '{content_type}'"
        )));
    }

    let Json(options) = Json::<SweepOptions>::from_bytes(body)
        .map_err(|e| AppError::Validation(format!("Invalid sweep options: {}", e.body_text())))?;
    Ok(options)
}

/// POST /api/v1/jobs/:id/matches/sweep
pub async fn handle_job_sweep(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<SweepSummary>, AppError> {
    let summary = sweep_job(&state.db, state.scorer.as_ref(), job_id).await?;
    Ok(Json(summary))
}

/// GET /api/v1/profiles/:id/matches
///
/// Stored matches, best first, filtered by `min_score` (default 0).
pub async fn handle_list_matches(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
    Query(params): Query<MatchListQuery>,
) -> Result<Json<Vec<RankedMatchRow>>, AppError> {
    let min_score = validate_min_score(params.min_score.unwrap_or(0.0))?;
    let limit = validate_list_limit(params.limit.unwrap_or(DEFAULT_LIST_LIMIT))?;
    let matches = get_matches_for_profile(&state.db, profile_id, min_score, limit).await?;
    Ok(Json(matches))
}

/// GET /api/v1/profiles/:id/matches/top
///
/// Matches scoring at least the neutral score.
pub async fn handle_top_matches(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
    Query(params): Query<TopMatchesQuery>,
) -> Result<Json<Vec<RankedMatchRow>>, AppError> {
    let limit = validate_list_limit(params.limit.unwrap_or(DEFAULT_TOP_LIMIT))?;
    let matches =
        get_matches_for_profile(&state.db, profile_id, state.config.neutral_score, limit).await?;
    Ok(Json(matches))
}

/// GET /api/v1/taxonomy/canonicalize?skill=...
pub async fn handle_canonicalize(
    State(state): State<AppState>,
    Query(params): Query<CanonicalizeQuery>,
) -> Result<Json<CanonicalizeResponse>, AppError> {
    if params.skill.trim().is_empty() {
        return Err(AppError::Validation("skill cannot be empty".to_string()));
    }

    let taxonomy = &state.taxonomy;
    Ok(Json(CanonicalizeResponse {
        canonical: taxonomy.canonicalize(&params.skill),
        known: taxonomy.is_known(&params.skill),
        synonyms: taxonomy.synonyms(&params.skill),
        raw: params.skill,
    }))
}

fn validate_min_score(min_score: f64) -> Result<f64, AppError> {
    if !(0.0..=100.0).contains(&min_score) {
        return Err(AppError::Validation(format!(
            "min_score must lie within 0–100, got {min_score}"
        )));
    }
    Ok(min_score)
}

fn validate_list_limit(limit: i64) -> Result<i64, AppError> {
    if !(1..=MAX_LIST_LIMIT).contains(&limit) {
        return Err(AppError::Validation(format!(
            "limit must lie within 1–{MAX_LIST_LIMIT}, got {limit}"
        )));
    }
    Ok(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_score_bounds() {
        assert_eq!(validate_min_score(0.0).unwrap(), 0.0);
        assert_eq!(validate_min_score(100.0).unwrap(), 100.0);
        assert!(validate_min_score(100.1).is_err());
        assert!(validate_min_score(f64::NAN).is_err());
    }

    #[test]
    fn test_list_limit_bounds() {
        assert!(validate_list_limit(0).is_err());
        assert!(validate_list_limit(MAX_LIST_LIMIT + 1).is_err());
        assert_eq!(validate_list_limit(25).unwrap(), 25);
    }

    fn json_headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, content_type.parse().unwrap());
        headers
    }

    #[test]
    fn test_sweep_options_default_on_empty_body() {
        let options = parse_sweep_options(&HeaderMap::new(), b"").unwrap();
        assert!(!options.refresh);
        assert_eq!(options.limit, None);

        let options = parse_sweep_options(&json_headers("application/json"), b" \n").unwrap();
        assert_eq!(options.limit, None);
    }

    #[test]
    fn test_sweep_options_parse_json_body() {
        let options = parse_sweep_options(
            &json_headers("application/json; charset=utf-8"),
            br#"{"refresh": true, "limit": 5}"#,
        )
        .unwrap();
        assert!(options.refresh);
        assert_eq!(options.limit, Some(5));
    }

    #[test]
    fn test_sweep_options_reject_malformed_body() {
        let err = parse_sweep_options(
            &json_headers("application/json"),
            br#"{"refresh":"yes","limit":"zero"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = parse_sweep_options(&json_headers("application/json"), b"{not json").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_sweep_options_reject_wrong_content_type() {
        let err = parse_sweep_options(
            &json_headers("text/plain"),
            br#"{"limit":0,"refresh":true}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("text/plain")));

        let err = parse_sweep_options(&HeaderMap::new(), br#"{"limit":1}"#).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
