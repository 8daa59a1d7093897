//! Configuration management for Tokenmeter
//!
//! Configuration is loaded from environment variables once at startup and is
//! immutable afterwards.

use std::collections::HashMap;
use std::env;

use anyhow::{bail, Context, Result};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable, one line per event
    Text,
    /// One JSON object per event (for log aggregators)
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Static API key to client identifier mapping
    pub api_keys: HashMap<String, String>,

    /// Vertex AI project identifier
    pub vertex_project_id: String,
    /// Vertex AI region
    pub vertex_location: String,
    /// Optional Vertex AI base URL override (private endpoints, tests)
    pub vertex_api_url: Option<String>,
    /// Optional static bearer token; the metadata server is used when unset
    pub vertex_access_token: Option<String>,

    /// Log output format
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let api_keys = parse_api_keys(
            &env::var("TOKENMETER_API_KEYS").context("TOKENMETER_API_KEYS must be set")?,
        )?;

        Ok(Self {
            host: env::var("TOKENMETER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("TOKENMETER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid TOKENMETER_PORT")?,

            api_keys,

            vertex_project_id: env::var("VERTEX_PROJECT_ID")
                .context("VERTEX_PROJECT_ID must be set")?,
            vertex_location: env::var("VERTEX_LOCATION")
                .unwrap_or_else(|_| "us-central1".to_string()),
            vertex_api_url: env::var("VERTEX_API_URL").ok().filter(|v| !v.is_empty()),
            vertex_access_token: env::var("VERTEX_ACCESS_TOKEN").ok().filter(|v| !v.is_empty()),

            log_format: parse_log_format(
                &env::var("TOKENMETER_LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
            )?,
        })
    }

    /// Base URL of the Vertex AI REST API for the configured region
    pub fn vertex_base_url(&self) -> String {
        match &self.vertex_api_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", self.vertex_location),
        }
    }
}

/// Parse `key:client` pairs separated by commas
///
/// Whitespace around keys and clients is ignored. A key may not appear twice.
pub fn parse_api_keys(raw: &str) -> Result<HashMap<String, String>> {
    let mut keys = HashMap::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (key, client) = entry
            .split_once(':')
            .with_context(|| format!("Invalid API key entry '{}', expected key:client", entry))?;
        let (key, client) = (key.trim(), client.trim());

        if key.is_empty() || client.is_empty() {
            bail!("Invalid API key entry '{}', key and client must be non-empty", entry);
        }
        if keys.insert(key.to_string(), client.to_string()).is_some() {
            bail!("Duplicate API key for client '{}'", client);
        }
    }

    if keys.is_empty() {
        bail!("TOKENMETER_API_KEYS must contain at least one key:client pair");
    }

    Ok(keys)
}

fn parse_log_format(raw: &str) -> Result<LogFormat> {
    match raw.to_ascii_lowercase().as_str() {
        "text" | "" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => bail!("Invalid TOKENMETER_LOG_FORMAT '{}', expected text or json", other),
    }
}
