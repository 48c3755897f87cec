//! Tier and query data models

use crate::results::FeedbackItem;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Latency/quality budget of a request
///
/// Variants are ordered by completeness.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Fast,
    #[default]
    Standard,
    Comprehensive,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Fast => "fast",
            Tier::Standard => "standard",
            Tier::Comprehensive => "comprehensive",
        }
    }

    /// The tier that follows this one, if any
    pub fn next(&self) -> Option<Tier> {
        match self {
            Tier::Fast => Some(Tier::Standard),
            Tier::Standard => Some(Tier::Comprehensive),
            Tier::Comprehensive => None,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fast" => Ok(Tier::Fast),
            "standard" => Ok(Tier::Standard),
            "comprehensive" => Ok(Tier::Comprehensive),
            other => Err(format!("unknown tier: {}", other)),
        }
    }
}

/// A recommendation request as seen by the tier controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationQuery {
    pub user_id: String,
    pub search_term: String,
    /// Previous search terms
    #[serde(default)]
    pub history: Vec<String>,
    #[serde(default)]
    pub feedback: Vec<FeedbackItem>,
    /// Highest tier to compute
    #[serde(default)]
    pub tier: Tier,
}

impl RecommendationQuery {
    /// Create a simple query for a single term
    pub fn simple(user_id: impl Into<String>, search_term: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            search_term: search_term.into(),
            history: Vec::new(),
            feedback: Vec::new(),
            tier: Tier::default(),
        }
    }

    /// Set requested tier
    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    /// Set search history
    pub fn with_history(mut self, history: Vec<String>) -> Self {
        self.history = history;
        self
    }

    /// Set user feedback
    pub fn with_feedback(mut self, feedback: Vec<FeedbackItem>) -> Self {
        self.feedback = feedback;
        self
    }

    /// Check if the term is empty
    pub fn is_empty(&self) -> bool {
        self.search_term.trim().is_empty()
    }
}
