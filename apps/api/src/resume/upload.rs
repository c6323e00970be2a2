//! Multipart résumé uploads, staged to a temporary file so extraction works on a real path.

use std::io::Write;
use std::path::Path;

use axum::extract::Multipart;
use bytes::Bytes;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::errors::AppError;
use crate::orchestrator::extract_resume;

/// Multipart field carrying the résumé file.
pub const RESUME_FIELD: &str = "resume";
/// Multipart field carrying the job description text (match upload only).
pub const JOB_TEXT_FIELD: &str = "job_text";

/// The fields of a résumé upload form.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub resume: Option<UploadedFile>,
    pub job_text: Option<String>,
}

#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
        {
            match field.name() {
                Some(RESUME_FIELD) => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?;
                    debug!("Received résumé upload '{}' ({} bytes)", file_name, bytes.len());
                    form.resume = Some(UploadedFile { file_name, bytes });
                }
                Some(JOB_TEXT_FIELD) => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?;
                    form.job_text = Some(text);
                }
                _ => {}
            }
        }

        Ok(form)
    }

    pub fn require_resume(&mut self) -> Result<UploadedFile, AppError> {
        self.resume
            .take()
            .ok_or_else(|| AppError::Validation(format!("missing '{RESUME_FIELD}' file field")))
    }
}

impl UploadedFile {
    /// Writes the upload to a temporary file that keeps the original extension.
    pub fn stage(&self) -> Result<NamedTempFile, AppError> {
        let suffix = Path::new(&self.file_name)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let mut file = tempfile::Builder::new()
            .prefix("resume-")
            .suffix(&suffix)
            .tempfile()
            .map_err(anyhow::Error::from)?;
        file.write_all(&self.bytes).map_err(anyhow::Error::from)?;
        file.flush().map_err(anyhow::Error::from)?;
        Ok(file)
    }

    /// Stages the upload and extracts its text.
    pub async fn extract(&self) -> Result<String, AppError> {
        let staged = self.stage()?;
        extract_resume(staged.path()).await
    }
}
