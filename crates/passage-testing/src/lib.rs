//! Test utilities for Passage services.
//!
//! Provides a fixed RSA key pair and helpers for authenticated test requests.
//! Import in tests only, never in production code.

pub mod auth;
pub mod keys;
