//! Job search: a pluggable provider trait plus the LinkedIn guest-search implementation.
//!
//! The guest endpoint returns an HTML fragment of up to 25 result cards per page. Pages are
//! requested in order until enough postings are collected or a page comes back empty.

use async_trait::async_trait;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use reqwest::header::{ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::posting::JobPosting;

const SEARCH_URL: &str = "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search";
const PAGE_SIZE: usize = 25;

/// Browser identity sent with every LinkedIn request.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("search request not successful (status {status}) for {url}")]
    RequestNotOk { status: u16, url: String },
}

/// Finds job postings matching a search term and location.
#[async_trait]
pub trait JobSearchProvider: Send + Sync {
    /// Returns at most `max_results` postings; zero results is not an error.
    async fn search(
        &self,
        term: &str,
        location: &str,
        max_results: usize,
    ) -> Result<Vec<JobPosting>, SearchError>;
}

// ────────────────────────────────────────────────────────────────────────────
// LinkedinSearch
// ────────────────────────────────────────────────────────────────────────────

pub struct LinkedinSearch {
    client: Client,
}

impl LinkedinSearch {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn fetch_page(&self, term: &str, location: &str, start: usize) -> Result<String, SearchError> {
        let url = search_url(term, location, start);
        info!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Search request not successful, status code: {}", status);
            return Err(SearchError::RequestNotOk {
                status: status.as_u16(),
                url,
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl JobSearchProvider for LinkedinSearch {
    async fn search(
        &self,
        term: &str,
        location: &str,
        max_results: usize,
    ) -> Result<Vec<JobPosting>, SearchError> {
        let mut postings = Vec::new();
        let mut start = 0;

        while postings.len() < max_results {
            let body = self.fetch_page(term, location, start).await?;
            let page = parse_search_results(&body);
            debug!("Page at offset {} yielded {} cards", start, page.len());
            if page.is_empty() {
                break;
            }
            postings.extend(page);
            start += PAGE_SIZE;
        }

        postings.truncate(max_results);
        info!(
            "Search for '{}' in '{}' returned {} postings",
            term,
            location,
            postings.len()
        );
        Ok(postings)
    }
}

fn search_url(term: &str, location: &str, start: usize) -> String {
    format!(
        "{SEARCH_URL}?location={}&keywords={}&start={start}",
        urlencoding::encode(location),
        urlencoding::encode(term)
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Result card parsing
// ────────────────────────────────────────────────────────────────────────────

lazy_static! {
    static ref CARD: Selector = Selector::parse(".base-search-card").expect("valid card selector");
    static ref TITLE: Selector =
        Selector::parse(".base-search-card__title").expect("valid title selector");
    static ref COMPANY: Selector =
        Selector::parse(".base-search-card__subtitle").expect("valid company selector");
    static ref LOCATION: Selector =
        Selector::parse(".job-search-card__location").expect("valid location selector");
    static ref FULL_LINK: Selector =
        Selector::parse("a.base-card__full-link").expect("valid link selector");
    static ref POSTED: Selector = Selector::parse("time[datetime]").expect("valid time selector");
}

/// Parses the result cards of one search page. Cards without a posting link are skipped.
pub fn parse_search_results(html: &str) -> Vec<JobPosting> {
    let doc = Html::parse_fragment(html);
    doc.select(&CARD).filter_map(parse_card).collect()
}

fn parse_card(card: ElementRef<'_>) -> Option<JobPosting> {
    let href = card
        .select(&FULL_LINK)
        .next()
        .and_then(|link| link.value().attr("href"))
        .or_else(|| card.value().attr("href"))?;
    let job_url = href.split('?').next().unwrap_or(href).trim().to_string();
    if job_url.is_empty() {
        return None;
    }

    let posted_on = card
        .select(&POSTED)
        .next()
        .and_then(|time| time.value().attr("datetime"))
        .and_then(|date| NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok());

    Some(JobPosting {
        title: text_of(card, &TITLE),
        company: text_of(card, &COMPANY),
        location: text_of(card, &LOCATION),
        job_url,
        description: None,
        posted_on,
    })
}

/// The whitespace-collapsed text of the first element matching `selector`, or empty.
fn text_of(card: ElementRef<'_>, selector: &Selector) -> String {
    card.select(selector)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<li>
  <div class="base-card relative w-full base-card--link base-search-card base-search-card--link job-search-card">
    <a class="base-card__full-link absolute top-0" href="https://www.linkedin.com/jobs/view/product-designer-at-acme-3812345678?refId=abc&amp;trackingId=xyz">
      <span class="sr-only">Product Designer</span>
    </a>
    <div class="base-search-card__info">
      <h3 class="base-search-card__title">
            Product Designer
      </h3>
      <h4 class="base-search-card__subtitle">
        <a class="hidden-nested-link" href="https://www.linkedin.com/company/acme">Acme
          Corp</a>
      </h4>
      <div class="base-search-card__metadata">
        <span class="job-search-card__location">Berlin, Germany</span>
        <time class="job-search-card__listdate" datetime="2024-05-02">1 week ago</time>
      </div>
    </div>
  </div>
</li>
<li>
  <div class="base-card base-search-card job-search-card">
    <a class="base-card__full-link" href="https://de.linkedin.com/jobs/view/ux-researcher-4000000001">x</a>
    <h3 class="base-search-card__title">UX Researcher</h3>
    <h4 class="base-search-card__subtitle">Globex</h4>
    <span class="job-search-card__location">Remote</span>
    <time datetime="not-a-date">recently</time>
  </div>
</li>
<li>
  <div class="base-card base-search-card job-search-card">
    <h3 class="base-search-card__title">No link here</h3>
  </div>
</li>
"#;

    #[test]
    fn test_cards_are_parsed_in_page_order() {
        let postings = parse_search_results(PAGE);
        assert_eq!(postings.len(), 2);

        let first = &postings[0];
        assert_eq!(first.title, "Product Designer");
        assert_eq!(first.company, "Acme Corp");
        assert_eq!(first.location, "Berlin, Germany");
        assert_eq!(
            first.job_url,
            "https://www.linkedin.com/jobs/view/product-designer-at-acme-3812345678"
        );
        assert_eq!(first.posted_on, NaiveDate::from_ymd_opt(2024, 5, 2));
        assert_eq!(first.description, None);

        let second = &postings[1];
        assert_eq!(second.title, "UX Researcher");
        assert_eq!(second.company, "Globex");
        assert_eq!(second.posted_on, None);
    }

    #[test]
    fn test_empty_page_has_no_postings() {
        assert!(parse_search_results("").is_empty());
        assert!(parse_search_results("<html><body>No jobs</body></html>").is_empty());
    }

    #[test]
    fn test_search_url_encodes_parameters() {
        assert_eq!(
            search_url("UX designer", "São Paulo", 25),
            "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search?location=S%C3%A3o%20Paulo&keywords=UX%20designer&start=25"
        );
    }
}
