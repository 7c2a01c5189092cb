//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing.
//! Sensitive values wrapped in secrecy::SecretString to prevent log leaks.

use crate::error::{Error, Result};
use secrecy::SecretString;

#[derive(Debug)]
pub struct Config {
    pub database_url: SecretString,
    pub openrouter_api_key: SecretString,
    /// Base URL of the OpenAI-compatible completion endpoint.
    pub llm_base_url: String,
    /// Model used for the extraction stage.
    pub extract_model: String,
    /// Cheaper model used for the two post-check stages.
    pub check_model: String,
    /// Search-capable model used for the web-search stage.
    pub search_model: String,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
    /// Number of concurrent workers in the pool.
    pub workers: usize,
    /// Seconds a worker sleeps after finding no work or hitting an
    /// infrastructure error.
    pub poll_interval_secs: u64,
    /// Connection pool upper bound, shared by all workers.
    pub max_connections: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: SecretString::from(required_var("DATABASE_URL")?),
            openrouter_api_key: SecretString::from(required_var("OPENROUTER_API_KEY")?),
            llm_base_url: var_or("LLM_BASE_URL", "https://openrouter.ai/api/v1"),
            extract_model: var_or("LLM_EXTRACT_MODEL", "x-ai/grok-4-fast"),
            check_model: var_or("LLM_CHECK_MODEL", "mistralai/ministral-8b"),
            search_model: var_or("LLM_SEARCH_MODEL", "perplexity/sonar"),
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: var_or("LOG_LEVEL", "info"),
            workers: parsed_var_or("WORKERS", 4)?,
            poll_interval_secs: parsed_var_or("POLL_INTERVAL_SECS", 5)?,
            max_connections: parsed_var_or("DB_MAX_CONNECTIONS", 10)?,
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed_var_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("cannot parse {name}={raw}"))),
        Err(_) => Ok(default),
    }
}
