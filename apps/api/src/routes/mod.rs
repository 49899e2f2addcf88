pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Scoring
        .route("/api/v1/matches", post(handlers::handle_score_pair))
        .route("/api/v1/matches/preview", post(handlers::handle_preview))
        // Sweeps
        .route(
            "/api/v1/profiles/:id/matches/sweep",
            post(handlers::handle_profile_sweep),
        )
        .route(
            "/api/v1/jobs/:id/matches/sweep",
            post(handlers::handle_job_sweep),
        )
        // Listings
        .route(
            "/api/v1/profiles/:id/matches",
            get(handlers::handle_list_matches),
        )
        .route(
            "/api/v1/profiles/:id/matches/top",
            get(handlers::handle_top_matches),
        )
        // Taxonomy
        .route(
            "/api/v1/taxonomy/canonicalize",
            get(handlers::handle_canonicalize),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::test_config;
    use crate::matching::scorer::BasicScorer;
    use crate::matching::taxonomy::SkillTaxonomy;

    /// State backed by a lazy pool; the requests below are answered before any query runs.
    fn test_state() -> AppState {
        let config = test_config();
        let taxonomy = Arc::new(SkillTaxonomy::builtin().unwrap());
        AppState {
            db: PgPoolOptions::new()
                .connect_lazy(&config.database_url)
                .unwrap(),
            scorer: Arc::new(BasicScorer::new(taxonomy.clone(), config.neutral_score)),
            taxonomy,
            config,
        }
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(test_state()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_preview_scores_inline_input() {
        let body = json!({
            "profile_id": Uuid::new_v4(),
            "job_id": Uuid::new_v4(),
            "profile_skills": [{"raw_text": "Python"}, {"raw_text": "SQL", "level": "advanced"}],
            "job_requirements": [{"raw_text": "python3"}, {"raw_text": "SQL"}]
        });
        let (status, body) = send(post_json("/api/v1/matches/preview", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 100.0);
        assert_eq!(body["matched_skills"], json!(["python", "sql"]));
        assert_eq!(body["missing_skills"], json!([]));
        assert_eq!(body["scorer_backend"], "basic");
    }

    #[tokio::test]
    async fn test_preview_without_ids_is_invalid_input() {
        let body = json!({
            "profile_skills": [{"raw_text": "Python"}],
            "job_requirements": [{"raw_text": "Python"}]
        });
        let (status, body) = send(post_json("/api/v1/matches/preview", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_preview_with_no_requirements_is_neutral() {
        let body = json!({
            "profile_id": Uuid::new_v4(),
            "job_id": Uuid::new_v4(),
            "profile_skills": [{"raw_text": "Rust"}]
        });
        let (status, body) = send(post_json("/api/v1/matches/preview", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 50.0);
    }

    #[tokio::test]
    async fn test_canonicalize_known_alias() {
        let request = Request::builder()
            .uri("/api/v1/taxonomy/canonicalize?skill=K8s")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["canonical"], "kubernetes");
        assert_eq!(body["known"], true);
        assert_eq!(body["synonyms"][0], "kubernetes");
    }

    #[tokio::test]
    async fn test_canonicalize_blank_is_validation_error() {
        let request = Request::builder()
            .uri("/api/v1/taxonomy/canonicalize?skill=%20")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_profile_sweep_rejects_malformed_options() {
        let uri = format!("/api/v1/profiles/{}/matches/sweep", Uuid::new_v4());
        let body = json!({"refresh": "yes", "limit": "zero"});
        let (status, body) = send(post_json(&uri, body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_profile_sweep_rejects_non_json_content_type() {
        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/profiles/{}/matches/sweep", Uuid::new_v4()))
            .header("content-type", "text/plain")
            .body(Body::from(r#"{"limit":0,"refresh":true}"#))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_profile_sweep_rejects_non_positive_limit() {
        let uri = format!("/api/v1/profiles/{}/matches/sweep", Uuid::new_v4());
        let (status, body) = send(post_json(&uri, json!({"limit": 0}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}
