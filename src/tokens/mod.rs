//! Token counting module
//!
//! Provides model routing over tiktoken-rs encodings and the Vertex AI
//! counting service.

pub mod counter;
pub mod vertex;

pub use counter::{TokenCounter, DEFAULT_ENCODING, DEFAULT_MODEL_LABEL};
pub use vertex::{HostedTokenCounter, VertexClient};
