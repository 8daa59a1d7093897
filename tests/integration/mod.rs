//! Integration tests for Tokenmeter
//!
//! These tests drive the real router end to end. The hosted counting service
//! is replaced by a wiremock server or an unreachable address.

mod auth;
mod health;
