use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::matching::scorer::Scorer;
use crate::matching::taxonomy::SkillTaxonomy;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Immutable synonym table, loaded once at startup.
    pub taxonomy: Arc<SkillTaxonomy>,
    /// Pluggable scorer. Default: BasicScorer. Swap via SCORER_BACKEND.
    pub scorer: Arc<dyn Scorer>,
}
