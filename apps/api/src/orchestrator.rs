//! Orchestrator: sequences search, description fetch, résumé extraction and scoring for one
//! user action. Holds no state of its own; every collaborator is passed in.

use std::path::Path;

use tracing::{info, warn};

use crate::errors::AppError;
use crate::jobs::fetch::DescriptionFetcher;
use crate::jobs::formatter::format_job_text;
use crate::jobs::search::JobSearchProvider;
use crate::matching::scorer::MatchScorer;
use crate::models::match_record::MatchRecord;
use crate::models::posting::JobPosting;
use crate::resume::extractor::extract_text;

/// Largest page of results a single search may ask for.
pub const MAX_SEARCH_RESULTS: usize = 25;

/// Shown in place of a description that could not be retrieved.
pub const UNAVAILABLE_PLACEHOLDER: &str =
    "[No description available: the posting may be private or require a login.]";

/// A posting's description after formatting, or the fact that none could be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobDescription {
    Available(String),
    Unavailable,
}

impl JobDescription {
    /// Formats raw description text; blank text is `Unavailable`.
    pub fn from_raw(raw: &str) -> Self {
        let formatted = format_job_text(raw);
        if formatted.is_empty() {
            JobDescription::Unavailable
        } else {
            JobDescription::Available(formatted)
        }
    }

    /// The text to display or score: the description itself, or the placeholder.
    pub fn text(&self) -> &str {
        match self {
            JobDescription::Available(text) => text,
            JobDescription::Unavailable => UNAVAILABLE_PLACEHOLDER,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, JobDescription::Available(_))
    }
}

/// Searches for postings. The term must be non-blank and `max_results` within 1–25.
pub async fn search_postings(
    provider: &dyn JobSearchProvider,
    term: &str,
    location: &str,
    max_results: usize,
) -> Result<Vec<JobPosting>, AppError> {
    let term = term.trim();
    if term.is_empty() {
        return Err(AppError::Validation("search term must not be empty".to_string()));
    }
    if !(1..=MAX_SEARCH_RESULTS).contains(&max_results) {
        return Err(AppError::Validation(format!(
            "max_results must be between 1 and {MAX_SEARCH_RESULTS}"
        )));
    }

    Ok(provider.search(term, location.trim(), max_results).await?)
}

/// The description for a selected search result: its inline text if it has any, otherwise
/// whatever the fetcher can retrieve from its URL.
pub async fn description_for_posting(
    fetcher: &dyn DescriptionFetcher,
    posting: &JobPosting,
) -> JobDescription {
    if let Some(inline) = posting.inline_description() {
        info!("Using inline description for '{}'", posting.title);
        return JobDescription::from_raw(inline);
    }
    fetch(fetcher, &posting.job_url).await
}

/// The description behind a directly supplied posting URL.
pub async fn description_from_url(
    fetcher: &dyn DescriptionFetcher,
    url: &str,
) -> Result<JobDescription, AppError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::Validation("url must not be empty".to_string()));
    }
    Ok(fetch(fetcher, url).await)
}

async fn fetch(fetcher: &dyn DescriptionFetcher, url: &str) -> JobDescription {
    let description = JobDescription::from_raw(&fetcher.fetch_description(url).await);
    if !description.is_available() {
        warn!("Description unavailable for {}", url);
    }
    description
}

/// Extracts résumé text on the blocking pool.
pub async fn extract_resume(path: &Path) -> Result<String, AppError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || extract_text(&path))
        .await
        .map_err(|e| AppError::ExtractionFailed(format!("extraction task aborted: {e}")))?
        .map_err(AppError::from)
}

/// Scores résumé text against job text. Both must be non-blank.
pub async fn analyze_match(
    scorer: &dyn MatchScorer,
    resume_text: &str,
    job_text: &str,
) -> Result<MatchRecord, AppError> {
    if resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume text must not be empty".to_string()));
    }
    if job_text.trim().is_empty() {
        return Err(AppError::Validation("job text must not be empty".to_string()));
    }

    info!("Scoring match with the {} scorer", scorer.backend());
    scorer.score(resume_text, job_text).await
}

/// Extracts a résumé file and scores it against job text.
pub async fn analyze_resume_file(
    scorer: &dyn MatchScorer,
    path: &Path,
    job_text: &str,
) -> Result<MatchRecord, AppError> {
    if job_text.trim().is_empty() {
        return Err(AppError::Validation("job text must not be empty".to_string()));
    }
    let resume_text = extract_resume(path).await?;
    analyze_match(scorer, &resume_text, job_text).await
}
