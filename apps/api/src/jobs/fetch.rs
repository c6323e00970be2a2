//! Description fetcher: best-effort retrieval of a posting's full description text.
//!
//! Only LinkedIn postings are attempted. When the URL carries a job id, the guest job-posting
//! API is tried first; if it yields nothing, the supplied posting URL itself is requested with a
//! search-engine referer. Every failure is logged and reported as an empty description.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::{ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::{Client, Url};
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use crate::jobs::search::BROWSER_USER_AGENT;
use crate::matching::scorer::truncate_chars;

/// Upper bound, in characters, on a fetched description.
pub const MAX_DESCRIPTION_CHARS: usize = 100_000;
/// Paragraphs shorter than this are not considered a description on their own.
const MIN_PARAGRAPH_CHARS: usize = 100;

const GUEST_POSTING_URL: &str = "https://www.linkedin.com/jobs-guest/jobs/api/jobPosting";
const SEARCH_ENGINE_REFERER: &str = "https://www.google.com/";

/// Retrieves the plain-text description behind a posting URL. Empty means unavailable.
#[async_trait]
pub trait DescriptionFetcher: Send + Sync {
    async fn fetch_description(&self, url: &str) -> String;
}

pub struct LinkedinDescriptionFetcher {
    client: Client,
}

impl LinkedinDescriptionFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// GETs `url` and extracts a description, or `None` on any failure.
    async fn try_page(&self, url: &str, referer: Option<&str>) -> Option<String> {
        debug!("GET {}", url);
        let mut request = self
            .client
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9");
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to send request to {}: {}", url, e);
                return None;
            }
        };
        let status = response.status();
        if !status.is_success() {
            warn!("Request to {} not successful, status code: {}", url, status);
            return None;
        }
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to read response body from {}: {}", url, e);
                return None;
            }
        };

        let description = extract_description(&body);
        (!description.is_empty()).then_some(description)
    }
}

#[async_trait]
impl DescriptionFetcher for LinkedinDescriptionFetcher {
    async fn fetch_description(&self, url: &str) -> String {
        if !is_linkedin_url(url) {
            info!("Not a LinkedIn posting, skipping fetch: {}", url);
            return String::new();
        }

        for attempt in fetch_attempts(url) {
            if let Some(description) = self.try_page(&attempt.url, attempt.referer).await {
                info!("Fetched description from {}", attempt.url);
                return description;
            }
            debug!("No description at {}", attempt.url);
        }

        warn!("No description available for {}", url);
        String::new()
    }
}

/// One page request in the fetch strategy.
#[derive(Debug, PartialEq, Eq)]
struct FetchAttempt {
    url: String,
    referer: Option<&'static str>,
}

/// The guest API for the job id (when there is one), then the supplied URL.
fn fetch_attempts(url: &str) -> Vec<FetchAttempt> {
    let url = url.trim();
    let mut attempts = Vec::with_capacity(2);
    if let Some(id) = linkedin_job_id(url) {
        attempts.push(FetchAttempt {
            url: format!("{GUEST_POSTING_URL}/{id}"),
            referer: None,
        });
    }
    attempts.push(FetchAttempt {
        url: url.to_string(),
        referer: Some(SEARCH_ENGINE_REFERER),
    });
    attempts
}

fn is_linkedin_url(url: &str) -> bool {
    Url::parse(url.trim())
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase))
        .map(|host| host == "linkedin.com" || host.ends_with(".linkedin.com"))
        .unwrap_or(false)
}

lazy_static! {
    static ref JOB_ID_PATTERNS: Vec<Regex> = [
        r"/jobs/view/(\d+)",
        r"/view/(\d+)",
        r"currentJobId=(\d+)",
        r"/jobs/[^?#]*-(\d+)(?:[/?#]|$)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid job id regex"))
    .collect();
    static ref DESCRIPTION_SELECTORS: Vec<Selector> = [
        "[data-test-description-section]",
        "div.show-more-less-html__markup",
        "div.description__text",
        "section.description",
        "div#job-details",
        "article",
    ]
    .iter()
    .map(|selector| Selector::parse(selector).expect("valid description selector"))
    .collect();
    static ref PARAGRAPH: Selector = Selector::parse("p").expect("valid paragraph selector");
}

/// The numeric LinkedIn job id carried by a posting URL, if any.
pub fn linkedin_job_id(url: &str) -> Option<String> {
    JOB_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Pulls the description text out of a posting page, whitespace-collapsed and capped.
///
/// The first known description container with text wins; otherwise the longest paragraph
/// over 100 characters. Empty when neither exists.
pub fn extract_description(html: &str) -> String {
    let doc = Html::parse_document(html);

    let from_container = DESCRIPTION_SELECTORS.iter().find_map(|selector| {
        doc.select(selector)
            .map(|el| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
            .find(|text| !text.is_empty())
    });

    let text = from_container.or_else(|| {
        doc.select(&PARAGRAPH)
            .map(|p| collapse_whitespace(&p.text().collect::<Vec<_>>().join(" ")))
            .filter(|text| text.chars().count() > MIN_PARAGRAPH_CHARS)
            .max_by_key(|text| text.chars().count())
    });

    text.map(|text| truncate_chars(&text, MAX_DESCRIPTION_CHARS).to_string())
        .unwrap_or_default()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
