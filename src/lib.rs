//! LitFinder-RS: tiered book recommendation orchestration
//!
//! Fans a query out to unreliable search, enrichment and analysis
//! providers behind circuit breakers, merges their answers and escalates
//! FAST → STANDARD → COMPREHENSIVE within per-stage deadlines.

pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod network;
pub mod persistence;
pub mod progressive;
pub mod providers;
pub mod query;
pub mod results;
pub mod service;
pub mod tiers;
pub mod web;

pub use config::Settings;
pub use error::{Error, Result};
pub use progressive::{ProgressiveEmitter, RecommendationEvent};
pub use results::{RecommendationItem, ResultAggregator, TierResult};
pub use service::{RecommendationRequest, RecommendationService};
pub use tiers::{RecommendationQuery, Tier, TierController};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
