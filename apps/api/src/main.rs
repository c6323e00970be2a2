mod config;
mod errors;
mod jobs;
mod llm_client;
mod matching;
mod models;
mod orchestrator;
mod resume;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::jobs::fetch::LinkedinDescriptionFetcher;
use crate::jobs::search::LinkedinSearch;
use crate::llm_client::LlmClient;
use crate::matching::scorer::{LlmMatchScorer, MatchScorer, OfflineMatchScorer};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Resolve configuration first: environment, .env, then the secrets file
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ResumeSync API v{}", env!("CARGO_PKG_VERSION"));

    // HTTP client for LinkedIn search and description fetches
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .build()?;

    // Initialize match scorer (LLM by default, offline substitute via USE_MOCK)
    let scorer: Arc<dyn MatchScorer> = if config.use_mock {
        info!("USE_MOCK is set, scoring offline");
        Arc::new(OfflineMatchScorer)
    } else {
        // The model client owns its connection pool and timeout
        let llm = LlmClient::new(config.openai_api_key.clone(), config.model.clone())?;
        if !llm.has_credentials() {
            warn!("OPENAI_API_KEY is not set; match scoring will report the model as unavailable");
        }
        info!(
            "LLM client initialized (model: {}, timeout: {}s)",
            llm.settings().model,
            llm.settings().request_timeout_secs
        );
        Arc::new(LlmMatchScorer::new(Arc::new(llm)))
    };

    // Build app state
    let state = AppState {
        config: config.clone(),
        search: Arc::new(LinkedinSearch::new(http.clone())),
        fetcher: Arc::new(LinkedinDescriptionFetcher::new(http)),
        scorer,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
