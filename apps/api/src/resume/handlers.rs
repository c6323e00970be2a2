//! Axum route handlers for the Résumé API.

use axum::{extract::Multipart, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::resume::upload::UploadForm;

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub file_name: String,
    pub characters: usize,
    pub text: String,
}

/// POST /api/v1/resumes/extract
///
/// Accepts a multipart `resume` file (PDF, DOCX or TXT) and returns its plain text.
pub async fn handle_extract(multipart: Multipart) -> Result<Json<ExtractResponse>, AppError> {
    let upload = UploadForm::read(multipart).await?.require_resume()?;
    let file_name = upload.file_name.clone();
    let text = upload.extract().await?;

    Ok(Json(ExtractResponse {
        file_name,
        characters: text.chars().count(),
        text,
    }))
}
