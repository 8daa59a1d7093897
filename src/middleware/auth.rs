//! Authentication middleware
//!
//! Resolves the `X-API-Key` header to a client identifier through a
//! [`KeyRegistry`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

use crate::{
    error::{AppError, AppResult},
    AppState,
};

/// Header carrying the client API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Authenticated caller, inserted into request extensions by [`auth_middleware`]
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    pub client: String,
}

/// Lookup capability from API key to client identifier
///
/// The static table is the only implementation shipped; a secret manager
/// backed registry plugs in here without touching the handlers.
#[async_trait]
pub trait KeyRegistry: Send + Sync {
    /// Return the client identifier registered for `key`, if any
    async fn lookup(&self, key: &str) -> AppResult<Option<String>>;
}

/// Immutable in-memory key table loaded at startup
#[derive(Debug, Clone, Default)]
pub struct StaticKeyRegistry {
    keys: HashMap<String, String>,
}

impl StaticKeyRegistry {
    pub fn new(keys: HashMap<String, String>) -> Self {
        Self { keys }
    }
}

#[async_trait]
impl KeyRegistry for StaticKeyRegistry {
    async fn lookup(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.keys.get(key).cloned())
    }
}

/// Short SHA-256 fingerprint of an API key, safe to log
pub fn key_fingerprint(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())[..12].to_string()
}

/// Extract the raw API key header
///
/// `Ok(None)` when the header is absent. A value that is not visible ASCII
/// cannot match any registered key and is reported as `InvalidKey`.
pub fn extract_api_key(headers: &HeaderMap) -> AppResult<Option<&str>> {
    match headers.get(API_KEY_HEADER) {
        None => Ok(None),
        Some(value) => value.to_str().map(Some).map_err(|_| AppError::InvalidKey),
    }
}

/// Resolve an optional header value to a client identifier
pub async fn authenticate(registry: &dyn KeyRegistry, api_key: Option<&str>) -> AppResult<String> {
    let key = match api_key {
        Some(key) if !key.is_empty() => key,
        _ => return Err(AppError::MissingKey),
    };

    match registry.lookup(key).await? {
        Some(client) => Ok(client),
        None => {
            warn!(key_fingerprint = %key_fingerprint(key), "Unrecognized API key");
            Err(AppError::InvalidKey)
        }
    }
}

/// Authentication middleware
///
/// This middleware:
/// 1. Extracts the key from the `X-API-Key` header
/// 2. Resolves it against the key registry
/// 3. Adds AuthenticatedClient to request extensions
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = extract_api_key(request.headers())?;
    let client = authenticate(state.key_registry.as_ref(), api_key).await?;

    debug!(client = %client, "Client authenticated successfully");

    request
        .extensions_mut()
        .insert(AuthenticatedClient { client });

    Ok(next.run(request).await)
}
