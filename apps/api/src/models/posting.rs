use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single job listing as returned by the search provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub location: String,
    pub job_url: String,
    /// Inline description, when the provider returned one with the listing.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub posted_on: Option<NaiveDate>,
}

impl JobPosting {
    /// The inline description if it holds any non-whitespace text.
    pub fn inline_description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(description: Option<&str>) -> JobPosting {
        JobPosting {
            title: "UX Designer".to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            job_url: "https://www.linkedin.com/jobs/view/123".to_string(),
            description: description.map(String::from),
            posted_on: None,
        }
    }

    #[test]
    fn test_blank_inline_description_is_none() {
        assert_eq!(posting(Some("   \n")).inline_description(), None);
        assert_eq!(posting(None).inline_description(), None);
    }

    #[test]
    fn test_inline_description_is_trimmed() {
        assert_eq!(
            posting(Some("  Design things.  ")).inline_description(),
            Some("Design things.")
        );
    }

    #[test]
    fn test_deserializes_without_optional_fields() {
        let json = r#"{"title":"t","company":"c","location":"l","job_url":"u"}"#;
        let parsed: JobPosting = serde_json::from_str(json).unwrap();
        assert!(parsed.description.is_none());
        assert!(parsed.posted_on.is_none());
    }
}
