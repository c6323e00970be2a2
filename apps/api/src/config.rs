use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::llm_client::{
    ModelSettings, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_TEMPERATURE,
};

/// Environment variable naming the JSON secrets file.
const SECRETS_PATH_VAR: &str = "RESUMESYNC_SECRETS";
const DEFAULT_SECRETS_PATH: &str = "secrets.json";

/// One place a configuration value may come from.
#[derive(Debug, Clone)]
pub enum SecretSource {
    /// The process environment (after `.env` has been loaded).
    Environment,
    /// A JSON document: top-level keys first, then nested groups depth-first.
    Json(Value),
}

impl SecretSource {
    fn lookup(&self, key: &str) -> Option<String> {
        match self {
            SecretSource::Environment => std::env::var(key).ok(),
            SecretSource::Json(document) => lookup_json(document, key),
        }
    }
}

fn lookup_json(document: &Value, key: &str) -> Option<String> {
    let Value::Object(map) = document else {
        return None;
    };

    if let Some(found) = map.get(key).and_then(scalar_text) {
        return Some(found);
    }
    map.values()
        .filter(|value| value.is_object())
        .find_map(|group| lookup_json(group, key))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Looks keys up over an ordered list of sources; the first non-blank value wins.
#[derive(Debug, Clone)]
pub struct SecretResolver {
    sources: Vec<SecretSource>,
}

impl SecretResolver {
    pub fn new(sources: Vec<SecretSource>) -> Self {
        Self { sources }
    }

    /// The process environment, then the JSON secrets file if one exists.
    pub fn default_sources() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let mut sources = vec![SecretSource::Environment];
        let path =
            std::env::var(SECRETS_PATH_VAR).unwrap_or_else(|_| DEFAULT_SECRETS_PATH.to_string());
        if Path::new(&path).exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read secrets file '{path}'"))?;
            let document: Value = serde_json::from_str(&raw)
                .with_context(|| format!("Secrets file '{path}' is not valid JSON"))?;
            debug!("Loaded secrets file {}", path);
            sources.push(SecretSource::Json(document));
        }

        Ok(Self::new(sources))
    }

    pub fn lookup(&self, key: &str) -> Option<String> {
        self.sources
            .iter()
            .filter_map(|source| source.lookup(key))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
    }
}

/// Application configuration.
///
/// Nothing is strictly required: without an API key the server still starts and scoring
/// reports the model as unavailable.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub use_mock: bool,
    pub model: ModelSettings,
    pub fetch_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::resolve(&SecretResolver::default_sources()?)
    }

    pub fn resolve(secrets: &SecretResolver) -> Result<Self> {
        let temperature = match secrets.lookup("OPENAI_TEMPERATURE") {
            Some(raw) => raw
                .parse::<f32>()
                .context("OPENAI_TEMPERATURE must be a number")?,
            None => DEFAULT_TEMPERATURE,
        };
        ensure!(
            (0.0..=1.0).contains(&temperature),
            "OPENAI_TEMPERATURE must be between 0.0 and 1.0, got {temperature}"
        );

        Ok(Config {
            openai_api_key: secrets.lookup("OPENAI_API_KEY"),
            use_mock: secrets.lookup("USE_MOCK").is_some_and(|v| is_truthy(&v)),
            model: ModelSettings {
                model: secrets
                    .lookup("OPENAI_MODEL")
                    .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                temperature,
                max_output_tokens: parse_or(secrets, "OPENAI_MAX_TOKENS", DEFAULT_MAX_OUTPUT_TOKENS)?,
                request_timeout_secs: parse_or(
                    secrets,
                    "OPENAI_TIMEOUT_SECS",
                    DEFAULT_REQUEST_TIMEOUT_SECS,
                )?,
            },
            fetch_timeout_secs: parse_or(secrets, "FETCH_TIMEOUT_SECS", 15)?,
            port: parse_or(secrets, "PORT", 8080)?,
            rust_log: secrets
                .lookup("RUST_LOG")
                .unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<T>(secrets: &SecretResolver, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match secrets.lookup(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
