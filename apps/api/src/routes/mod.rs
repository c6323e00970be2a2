pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::jobs::handlers as jobs;
use crate::matching::handlers as matching;
use crate::resume::handlers as resume;
use crate::state::AppState;

/// Largest accepted request body (résumé uploads included).
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs API
        .route("/api/v1/jobs/search", post(jobs::handle_search))
        .route("/api/v1/jobs/description", post(jobs::handle_description))
        .route(
            "/api/v1/jobs/description/posting",
            post(jobs::handle_posting_description),
        )
        // Resume API
        .route("/api/v1/resumes/extract", post(resume::handle_extract))
        // Match API
        .route("/api/v1/match", post(matching::handle_match))
        .route("/api/v1/match/upload", post(matching::handle_match_upload))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
