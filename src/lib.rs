//! Tokenmeter - authenticated token counting service
//!
//! This library provides the core functionality for the Tokenmeter server.
//! It authenticates callers by static API key, routes the requested model to a
//! token counting backend and reports the count as JSON.

pub mod config;
pub mod docs;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod tokens;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

pub use crate::config::Config;
pub use crate::middleware::auth::{KeyRegistry, StaticKeyRegistry};
pub use crate::tokens::{HostedTokenCounter, TokenCounter, VertexClient};

/// Application state shared across all request handlers
///
/// Read-only after construction.
pub struct AppState {
    pub config: Config,
    pub start_time: Instant,
    /// API key to client lookup
    pub key_registry: Arc<dyn KeyRegistry>,
    /// Model-aware token counter
    pub token_counter: TokenCounter,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        // Default reqwest client; the hosted count call has no explicit timeout
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(16)
            .build()?;

        let hosted: Arc<dyn HostedTokenCounter> =
            Arc::new(VertexClient::new(http_client, &config));
        let key_registry: Arc<dyn KeyRegistry> =
            Arc::new(StaticKeyRegistry::new(config.api_keys.clone()));

        Ok(Self {
            config,
            start_time: Instant::now(),
            key_registry,
            token_counter: TokenCounter::new(hosted),
        })
    }

    /// Create a new application state for testing with injected collaborators
    #[cfg(any(test, feature = "test-utils"))]
    pub fn new_for_testing(
        config: Config,
        key_registry: Arc<dyn KeyRegistry>,
        hosted: Arc<dyn HostedTokenCounter>,
    ) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            key_registry,
            token_counter: TokenCounter::new(hosted),
        }
    }
}
