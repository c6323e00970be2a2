use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::match_record::MatchRecord;
use crate::orchestrator;
use crate::resume::upload::{UploadForm, JOB_TEXT_FIELD};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct MatchRequest {
    pub resume_text: String,
    pub job_text: String,
}

/// POST /api/v1/match
/// Scores already-extracted résumé text against a job description.
pub async fn handle_match(
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<MatchRecord>, AppError> {
    let record =
        orchestrator::analyze_match(state.scorer.as_ref(), &req.resume_text, &req.job_text).await?;
    Ok(Json(record))
}

/// POST /api/v1/match/upload
/// Multipart form with a `resume` file and a `job_text` field: extract, then score.
pub async fn handle_match_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<MatchRecord>, AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let upload = form.require_resume()?;
    let job_text = form
        .job_text
        .take()
        .ok_or_else(|| AppError::Validation(format!("missing '{JOB_TEXT_FIELD}' field")))?;

    let staged = upload.stage()?;
    let record =
        orchestrator::analyze_resume_file(state.scorer.as_ref(), staged.path(), &job_text).await?;
    Ok(Json(record))
}
