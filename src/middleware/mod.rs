//! Middleware module
//!
//! Contains Tower middleware for API key authentication.

pub mod auth;
