//! Scorer — pluggable, trait-based scoring of a profile's skills against a job's requirements.
//!
//! Default: `BasicScorer` (taxonomy set overlap, pure and deterministic).
//! Alternate: `EnhancedScorer` (basic overlap, then an LLM review of the
//! requirements left unmatched).
//!
//! `AppState` holds an `Arc<dyn Scorer>` chosen at startup from `SCORER_BACKEND`.
//! Both backends produce the same `MatchResult` shape and honor the same invariants:
//! - matched ∩ missing = ∅, and both are ordered by first occurrence in the requirements
//! - score = 100 × |matched| / |requirements|, one decimal, or the neutral score
//!   when the job has no requirements

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::llm_client::{LlmClient, LlmError};
use crate::matching::prompts::{COVERAGE_PROMPT_TEMPLATE, COVERAGE_SYSTEM};
use crate::matching::taxonomy::SkillTaxonomy;
use crate::matching::MatchError;
use crate::models::job::RequirementEntry;
use crate::models::matches::MatchResult;
use crate::models::profile::SkillEntry;

pub const DEFAULT_NEUTRAL_SCORE: f64 = 50.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerBackend {
    #[default]
    Basic,
    Enhanced,
}

impl ScorerBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScorerBackend::Basic => "basic",
            ScorerBackend::Enhanced => "enhanced",
        }
    }
}

impl FromStr for ScorerBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(ScorerBackend::Basic),
            "enhanced" => Ok(ScorerBackend::Enhanced),
            other => Err(format!(
                "unknown scorer backend '{other}' (expected 'basic' or 'enhanced')"
            )),
        }
    }
}

impl fmt::Display for ScorerBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs for one (profile, job) scoring call.
#[derive(Debug, Clone, Copy)]
pub struct ScoreRequest<'a> {
    pub profile_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
    pub profile_skills: &'a [SkillEntry],
    pub job_requirements: &'a [RequirementEntry],
}

/// Implement this to add a scoring backend without touching handlers or sweeps.
#[async_trait]
pub trait Scorer: Send + Sync {
    fn backend(&self) -> ScorerBackend;

    async fn score(&self, request: ScoreRequest<'_>) -> Result<MatchResult, MatchError>;
}

/// Selects the scorer named by `config.scorer_backend`.
pub fn build_scorer(
    config: &Config,
    taxonomy: Arc<SkillTaxonomy>,
) -> anyhow::Result<Arc<dyn Scorer>> {
    let basic = BasicScorer::new(taxonomy, config.neutral_score);

    let scorer: Arc<dyn Scorer> = match config.scorer_backend {
        ScorerBackend::Basic => Arc::new(basic),
        ScorerBackend::Enhanced => {
            let api_key = config.anthropic_api_key.clone().ok_or_else(|| {
                anyhow::anyhow!("ANTHROPIC_API_KEY is required when SCORER_BACKEND=enhanced")
            })?;
            Arc::new(EnhancedScorer::new(basic, LlmClient::new(api_key)?))
        }
    };

    info!("Scorer backend: {}", scorer.backend());
    Ok(scorer)
}

// ────────────────────────────────────────────────────────────────────────────
// Core overlap algorithm
// ────────────────────────────────────────────────────────────────────────────

/// Canonical overlap between a profile and a job, before ids and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillMatch {
    /// Distinct canonical requirements, in first-occurrence order.
    pub requirements: Vec<String>,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub score: f64,
}

/// Canonicalizes both sides and partitions the requirements into matched and missing.
///
/// Blank strings carry no skill and are skipped. Duplicates collapse onto their
/// first occurrence.
pub fn compute_skill_match(
    taxonomy: &SkillTaxonomy,
    profile_skills: &[SkillEntry],
    job_requirements: &[RequirementEntry],
    neutral_score: f64,
) -> SkillMatch {
    let profile: HashSet<String> = profile_skills
        .iter()
        .map(|s| s.canonical_id(taxonomy))
        .filter(|c| !c.is_empty())
        .collect();

    let mut seen = HashSet::new();
    let requirements: Vec<String> = job_requirements
        .iter()
        .map(|r| taxonomy.canonicalize(&r.raw_text))
        .filter(|c| !c.is_empty() && seen.insert(c.clone()))
        .collect();

    partition_requirements(requirements, |req| profile.contains(req), neutral_score)
}

fn partition_requirements(
    requirements: Vec<String>,
    is_matched: impl Fn(&str) -> bool,
    neutral_score: f64,
) -> SkillMatch {
    let (matched_skills, missing_skills): (Vec<String>, Vec<String>) =
        requirements.iter().cloned().partition(|req| is_matched(req.as_str()));

    let score = overlap_score(matched_skills.len(), requirements.len(), neutral_score);

    SkillMatch {
        requirements,
        matched_skills,
        missing_skills,
        score,
    }
}

/// 100 × matched / total, rounded to one decimal (33.33… → 33.3).
pub fn overlap_score(matched: usize, total: usize, neutral_score: f64) -> f64 {
    if total == 0 {
        return neutral_score;
    }
    ((1000.0 * matched as f64 / total as f64).round() / 10.0).clamp(0.0, 100.0)
}

fn require_id(id: Option<Uuid>, field: &str) -> Result<Uuid, MatchError> {
    match id {
        Some(id) if !id.is_nil() => Ok(id),
        _ => Err(MatchError::InvalidInput(format!("{field} is required"))),
    }
}

fn basic_notes(skill_match: &SkillMatch) -> String {
    if skill_match.requirements.is_empty() {
        "No requirements parsed for this job; neutral score assigned.".to_string()
    } else {
        format!(
            "Basic skill match: {} of {} requirements matched",
            skill_match.matched_skills.len(),
            skill_match.requirements.len()
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// BasicScorer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct BasicScorer {
    taxonomy: Arc<SkillTaxonomy>,
    neutral_score: f64,
}

impl BasicScorer {
    pub fn new(taxonomy: Arc<SkillTaxonomy>, neutral_score: f64) -> Self {
        Self {
            taxonomy,
            neutral_score,
        }
    }

    pub fn taxonomy(&self) -> &SkillTaxonomy {
        &self.taxonomy
    }

    pub fn skill_match(&self, request: &ScoreRequest<'_>) -> SkillMatch {
        compute_skill_match(
            &self.taxonomy,
            request.profile_skills,
            request.job_requirements,
            self.neutral_score,
        )
    }

    /// Synchronous scoring; ids are validated before any work is done.
    pub fn evaluate(&self, request: &ScoreRequest<'_>) -> Result<MatchResult, MatchError> {
        let profile_id = require_id(request.profile_id, "profile_id")?;
        let job_id = require_id(request.job_id, "job_id")?;

        let skill_match = self.skill_match(request);
        let notes = basic_notes(&skill_match);

        debug!(
            "Scored profile {profile_id} vs job {job_id}: {} ({} matched, {} missing)",
            skill_match.score,
            skill_match.matched_skills.len(),
            skill_match.missing_skills.len()
        );

        Ok(into_result(
            profile_id,
            job_id,
            skill_match,
            notes,
            ScorerBackend::Basic,
        ))
    }
}

#[async_trait]
impl Scorer for BasicScorer {
    fn backend(&self) -> ScorerBackend {
        ScorerBackend::Basic
    }

    async fn score(&self, request: ScoreRequest<'_>) -> Result<MatchResult, MatchError> {
        self.evaluate(&request)
    }
}

fn into_result(
    profile_id: Uuid,
    job_id: Uuid,
    skill_match: SkillMatch,
    notes: String,
    scorer_backend: ScorerBackend,
) -> MatchResult {
    MatchResult {
        profile_id,
        job_id,
        score: skill_match.score,
        matched_skills: skill_match.matched_skills,
        missing_skills: skill_match.missing_skills,
        notes,
        scorer_backend,
        scored_at: Utc::now(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// EnhancedScorer
// ────────────────────────────────────────────────────────────────────────────

/// LLM verdict on which unmatched requirements the candidate covers anyway.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoverageVerdict {
    #[serde(default)]
    pub covered: Vec<CoveredRequirement>,
    #[serde(default)]
    pub analysis: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoveredRequirement {
    pub requirement: String,
    #[serde(default)]
    pub evidence: Option<String>,
}

/// Basic overlap plus a semantic review of the missing requirements.
/// Falls back to the basic result whenever the review is unavailable.
pub struct EnhancedScorer {
    basic: BasicScorer,
    llm: LlmClient,
}

impl EnhancedScorer {
    pub fn new(basic: BasicScorer, llm: LlmClient) -> Self {
        Self { basic, llm }
    }

    async fn review_missing(
        &self,
        profile_skills: &[SkillEntry],
        missing: &[String],
    ) -> Result<CoverageVerdict, LlmError> {
        let taxonomy = self.basic.taxonomy();
        let skills: Vec<_> = profile_skills
            .iter()
            .map(|s| {
                json!({
                    "skill": s.raw_text,
                    "canonical": s.canonical_id(taxonomy),
                    "category": s.category,
                    "level": s.level,
                    "years": s.years,
                })
            })
            .collect();

        let prompt = COVERAGE_PROMPT_TEMPLATE
            .replace("{skills_json}", &serde_json::to_string_pretty(&skills)?)
            .replace("{missing_json}", &serde_json::to_string_pretty(missing)?);

        self.llm.call_json::<CoverageVerdict>(&prompt, COVERAGE_SYSTEM).await
    }
}

/// Moves requirements the verdict covers from missing to matched and rescores.
///
/// Verdict entries are canonicalized and must name a currently missing
/// requirement; anything else is ignored.
pub fn apply_verdict(
    taxonomy: &SkillTaxonomy,
    basic: &SkillMatch,
    verdict: &CoverageVerdict,
    neutral_score: f64,
) -> SkillMatch {
    let accepted: HashSet<String> = verdict
        .covered
        .iter()
        .map(|c| taxonomy.canonicalize(&c.requirement))
        .filter(|c| basic.missing_skills.contains(c))
        .collect();

    let matched: HashSet<&str> = basic
        .matched_skills
        .iter()
        .map(String::as_str)
        .chain(accepted.iter().map(String::as_str))
        .collect();

    partition_requirements(
        basic.requirements.clone(),
        |req| matched.contains(req),
        neutral_score,
    )
}

#[async_trait]
impl Scorer for EnhancedScorer {
    fn backend(&self) -> ScorerBackend {
        ScorerBackend::Enhanced
    }

    async fn score(&self, request: ScoreRequest<'_>) -> Result<MatchResult, MatchError> {
        let profile_id = require_id(request.profile_id, "profile_id")?;
        let job_id = require_id(request.job_id, "job_id")?;

        let basic = self.basic.skill_match(&request);
        let notes = basic_notes(&basic);

        if basic.missing_skills.is_empty() || request.profile_skills.is_empty() {
            return Ok(into_result(
                profile_id,
                job_id,
                basic,
                notes,
                ScorerBackend::Basic,
            ));
        }

        match self
            .review_missing(request.profile_skills, &basic.missing_skills)
            .await
        {
            Ok(verdict) => {
                for covered in &verdict.covered {
                    debug!(
                        "Semantic review marks '{}' covered (evidence: {})",
                        covered.requirement,
                        covered.evidence.as_deref().unwrap_or("none given")
                    );
                }
                let enhanced =
                    apply_verdict(self.basic.taxonomy(), &basic, &verdict, self.basic.neutral_score);
                let resolved = enhanced.matched_skills.len() - basic.matched_skills.len();
                let mut notes = format!(
                    "{notes}; semantic review resolved {resolved} of {} missing",
                    basic.missing_skills.len()
                );
                if !verdict.analysis.trim().is_empty() {
                    notes.push_str("\n\n");
                    notes.push_str(verdict.analysis.trim());
                }
                Ok(into_result(
                    profile_id,
                    job_id,
                    enhanced,
                    notes,
                    ScorerBackend::Enhanced,
                ))
            }
            Err(e) => {
                warn!("Semantic review failed for profile {profile_id} vs job {job_id}: {e}");
                Ok(into_result(
                    profile_id,
                    job_id,
                    basic,
                    format!("{notes}\n(semantic review unavailable: {e})"),
                    ScorerBackend::Basic,
                ))
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
