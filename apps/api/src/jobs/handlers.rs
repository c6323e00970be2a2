use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::posting::JobPosting;
use crate::orchestrator::{self, JobDescription};
use crate::state::AppState;

const DEFAULT_MAX_RESULTS: usize = 5;

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

#[derive(Deserialize)]
pub struct SearchRequest {
    pub term: String,
    #[serde(default)]
    pub location: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub postings: Vec<JobPosting>,
}

#[derive(Deserialize)]
pub struct DescriptionRequest {
    pub url: String,
}

#[derive(Deserialize)]
pub struct PostingDescriptionRequest {
    pub posting: JobPosting,
}

#[derive(Debug, Serialize)]
pub struct DescriptionResponse {
    pub url: String,
    pub available: bool,
    pub description: String,
}

impl DescriptionResponse {
    fn new(url: &str, description: &JobDescription) -> Self {
        Self {
            url: url.trim().to_string(),
            available: description.is_available(),
            description: description.text().to_string(),
        }
    }
}

/// POST /api/v1/jobs/search
pub async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let postings = orchestrator::search_postings(
        state.search.as_ref(),
        &req.term,
        &req.location,
        req.max_results,
    )
    .await?;
    Ok(Json(SearchResponse { postings }))
}

/// POST /api/v1/jobs/description
/// Fetches and formats the description behind a posting URL.
pub async fn handle_description(
    State(state): State<AppState>,
    Json(req): Json<DescriptionRequest>,
) -> Result<Json<DescriptionResponse>, AppError> {
    let description = orchestrator::description_from_url(state.fetcher.as_ref(), &req.url).await?;
    Ok(Json(DescriptionResponse::new(&req.url, &description)))
}

/// POST /api/v1/jobs/description/posting
/// Like `handle_description`, but prefers the posting's inline description.
pub async fn handle_posting_description(
    State(state): State<AppState>,
    Json(req): Json<PostingDescriptionRequest>,
) -> Result<Json<DescriptionResponse>, AppError> {
    let description =
        orchestrator::description_for_posting(state.fetcher.as_ref(), &req.posting).await;
    Ok(Json(DescriptionResponse::new(&req.posting.job_url, &description)))
}
