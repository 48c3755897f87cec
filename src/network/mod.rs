//! HTTP networking module
//!
//! Provides the shared HTTP client used by remote providers.

mod client;

pub use client::{HttpClient, ProviderResponse};
