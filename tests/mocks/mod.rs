//! Mock infrastructure for testing external services
//!
//! - Vertex AI `countTokens` endpoint

pub mod vertex;

pub use vertex::*;
