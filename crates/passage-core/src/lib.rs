//! Ambient building blocks shared by Passage services: configuration loading,
//! the generic error response, tracing setup, health probes and request ids.

pub mod config;
pub mod error;
pub mod health;
pub mod middleware;
pub mod tracing;
