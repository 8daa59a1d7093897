//! Token counter implementation
//!
//! Routes a count request to one of two backends based on the model name:
//! local tiktoken-rs encodings or the hosted Vertex AI counting service.

use std::sync::Arc;

use tiktoken_rs::{get_bpe_from_model, CoreBPE};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::routes::metrics::record_encoding_fallback;
use crate::tokens::vertex::HostedTokenCounter;

/// Encoding used when no model is given or a model's encoding is unknown
pub const DEFAULT_ENCODING: &str = "cl100k_base";

/// Reported as `model_used` when the default encoding was selected
pub const DEFAULT_MODEL_LABEL: &str = "default (tiktoken)";

/// Backend selected for a model name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRoute<'a> {
    /// No model requested
    Default,
    /// Hosted generative model, counted remotely
    Hosted(&'a str),
    /// Subword tokenizer family, counted locally
    Subword(&'a str),
    /// Matches neither family
    Unsupported(&'a str),
}

impl<'a> ModelRoute<'a> {
    /// Classify a model name. The hosted check runs before the subword check.
    pub fn classify(model: Option<&'a str>) -> Self {
        match model {
            None => ModelRoute::Default,
            Some(name) if name.starts_with("gemini") => ModelRoute::Hosted(name),
            Some(name) if name.starts_with("gpt-") || name.contains("turbo") => {
                ModelRoute::Subword(name)
            }
            Some(name) => ModelRoute::Unsupported(name),
        }
    }

    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            ModelRoute::Default => "default",
            ModelRoute::Hosted(_) => "hosted",
            ModelRoute::Subword(_) => "subword",
            ModelRoute::Unsupported(_) => "unsupported",
        }
    }
}

/// Result of a count, with the routing decision that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCount {
    pub tokens: usize,
    pub route: &'static str,
    /// True when a subword model fell back to the default encoding
    pub fell_back: bool,
}

/// Build the default tiktoken encoding
pub fn default_encoding() -> anyhow::Result<CoreBPE> {
    tiktoken_rs::cl100k_base()
}

/// Special tokens such as `<|endoftext|>` are counted as single tokens.
fn encode_len(encoding: &CoreBPE, text: &str) -> usize {
    encoding.encode_with_special_tokens(text).len()
}

/// Count with the default encoding
pub fn count_default(text: &str) -> AppResult<usize> {
    let encoding = default_encoding()?;
    Ok(encode_len(&encoding, text))
}

/// Count with a model's encoding, falling back to the default encoding when
/// the model is unknown to tiktoken. Returns the count and whether it fell back.
pub fn count_for_model(model: &str, text: &str) -> AppResult<(usize, bool)> {
    match get_bpe_from_model(model) {
        Ok(encoding) => Ok((encode_len(&encoding, text), false)),
        Err(e) => {
            warn!(
                model = %model,
                fallback_encoding = DEFAULT_ENCODING,
                error = %e,
                "Model not found, using fallback encoding"
            );
            record_encoding_fallback(ModelRoute::Subword(model).label());
            Ok((count_default(text)?, true))
        }
    }
}

/// Model-aware token counter
///
/// Tokenizers are built per call; only the hosted client is shared.
#[derive(Clone)]
pub struct TokenCounter {
    hosted: Arc<dyn HostedTokenCounter>,
}

impl TokenCounter {
    /// Create a new token counter
    pub fn new(hosted: Arc<dyn HostedTokenCounter>) -> Self {
        Self { hosted }
    }

    /// Name of the hosted backend
    pub fn hosted_backend(&self) -> &'static str {
        self.hosted.name()
    }

    /// Project and region the hosted backend targets
    pub fn hosted_target(&self) -> String {
        self.hosted.target()
    }

    /// Count tokens in `text` for an optional model and report which route
    /// handled the request
    pub async fn count(&self, text: &str, model: Option<&str>) -> AppResult<TokenCount> {
        let route = ModelRoute::classify(model);

        let (tokens, fell_back) = match route {
            ModelRoute::Default => {
                debug!(encoding = DEFAULT_ENCODING, "No model name provided, using default encoding");
                let text = text.to_owned();
                (run_blocking(move || count_default(&text)).await?, false)
            }
            ModelRoute::Hosted(name) => (self.hosted.count_tokens(name, text).await?, false),
            ModelRoute::Subword(name) => {
                let (name, text) = (name.to_owned(), text.to_owned());
                run_blocking(move || count_for_model(&name, &text)).await?
            }
            ModelRoute::Unsupported(name) => {
                return Err(AppError::UnsupportedModel(name.to_string()));
            }
        };

        Ok(TokenCount {
            tokens,
            route: route.label(),
            fell_back,
        })
    }
}

/// BPE construction and encoding are CPU bound; keep them off the executor.
async fn run_blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Tokenizer task failed: {}", e)))?
}
