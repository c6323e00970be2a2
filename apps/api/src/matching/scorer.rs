//! Match Scorer: pluggable, trait-based scorer for a résumé against a job description.
//!
//! `LlmMatchScorer` asks the language model and hands its reply to the normalizer.
//! `OfflineMatchScorer` returns a fixed record without any network call, for environments
//! without credentials.
//!
//! `AppState` holds an `Arc<dyn MatchScorer>`, chosen at startup via `USE_MOCK`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::llm_client::ModelTransport;
use crate::matching::normalizer::{normalize, normalize_reply, RawReply};
use crate::matching::prompts::{build_match_prompt, MATCH_SYSTEM};
use crate::models::match_record::MatchRecord;

/// Upper bound, in characters, on each text sent to the model.
pub const MAX_INPUT_CHARS: usize = 4000;

/// The match scorer trait. Implement this to swap backends without touching handlers
/// or the orchestrator.
#[async_trait]
pub trait MatchScorer: Send + Sync {
    async fn score(&self, resume_text: &str, job_text: &str) -> Result<MatchRecord, AppError>;

    /// "llm" | "offline": reported in logs and the health endpoint.
    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmMatchScorer
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmMatchScorer {
    transport: Arc<dyn ModelTransport>,
}

impl LlmMatchScorer {
    pub fn new(transport: Arc<dyn ModelTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl MatchScorer for LlmMatchScorer {
    async fn score(&self, resume_text: &str, job_text: &str) -> Result<MatchRecord, AppError> {
        let prompt = build_match_prompt(
            truncate_chars(resume_text, MAX_INPUT_CHARS),
            truncate_chars(job_text, MAX_INPUT_CHARS),
        );

        let reply = self.transport.complete(MATCH_SYSTEM, &prompt).await?;
        debug!("Model reply ({} chars)", reply.chars().count());

        let shape = RawReply::from_text(&reply);
        if let Some(message) = shape.refusal() {
            return Err(AppError::ModelRefusal(message));
        }

        let record = normalize_reply(&shape);
        info!(
            "Scored match: score={:?}, matched={}, missing={}",
            record.score,
            record.matched_skills.len(),
            record.missing_skills.len()
        );
        Ok(record)
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// OfflineMatchScorer
// ────────────────────────────────────────────────────────────────────────────

/// Deterministic stand-in used when `USE_MOCK` is set. Never calls the model.
pub struct OfflineMatchScorer;

#[async_trait]
impl MatchScorer for OfflineMatchScorer {
    async fn score(&self, _resume_text: &str, _job_text: &str) -> Result<MatchRecord, AppError> {
        Ok(offline_record())
    }

    fn backend(&self) -> &'static str {
        "offline"
    }
}

/// The offline substitute, built through the same normalizer as a live reply.
pub fn offline_record() -> MatchRecord {
    normalize(&json!({
        "match_score": 75,
        "matched_skills": ["UX Research", "Prototyping", "Figma"],
        "missing_skills": ["WCAG", "Design Systems"],
        "summary": "Offline analysis. Configure OPENAI_API_KEY and unset USE_MOCK for live scoring."
    }))
}

/// The first `max_chars` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
