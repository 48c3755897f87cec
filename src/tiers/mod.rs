//! Tiered recommendation pipeline
//!
//! A query names the highest [`Tier`] it wants; the [`TierController`]
//! runs FAST, then escalates one stage at a time up to that tier.

mod controller;
mod models;

pub use controller::{StageDeadlines, TierController};
pub use models::{RecommendationQuery, Tier};
