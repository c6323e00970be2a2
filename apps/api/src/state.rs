use std::sync::Arc;

use crate::config::Config;
use crate::jobs::fetch::DescriptionFetcher;
use crate::jobs::search::JobSearchProvider;
use crate::matching::scorer::MatchScorer;

/// Shared application state injected into all route handlers via Axum extractors.
/// Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Job search provider. Default: LinkedIn guest search.
    pub search: Arc<dyn JobSearchProvider>,
    pub fetcher: Arc<dyn DescriptionFetcher>,
    /// Pluggable match scorer. LLM-backed, or the offline substitute when `USE_MOCK` is set.
    pub scorer: Arc<dyn MatchScorer>,
}
