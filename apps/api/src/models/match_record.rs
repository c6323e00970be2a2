use serde::{Deserialize, Serialize};

/// Canonical result of comparing a résumé against a job description.
///
/// Every record is fully populated: an unknown score is `None`, the skill lists are
/// free of blank entries, and `summary` is at worst an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// 0 – 100, `None` when the reply carried no usable score.
    #[serde(rename = "match_score")]
    pub score: Option<u8>,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub summary: String,
}

impl MatchRecord {
    /// A record with no score and no skills, carrying only narrative text.
    pub fn summary_only(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Self::default()
        }
    }
}
