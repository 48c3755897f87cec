//! Result type definitions

use crate::tiers::Tier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Clamp a score into `[0, 1]`, mapping NaN to zero
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// A single book recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationItem {
    /// Provider identifier, may be empty
    #[serde(default)]
    pub id: String,
    /// Book title
    pub title: String,
    /// Author name
    #[serde(default)]
    pub author: String,
    /// Short summary
    #[serde(default)]
    pub summary: String,
    /// Broad category (novel, paper, essay, ...)
    #[serde(default)]
    pub category: String,
    /// Genre, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    /// Relevance in `[0, 1]`
    #[serde(default, alias = "match_score")]
    pub match_score: f64,
    /// Extra metadata added by enrichment providers
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl RecommendationItem {
    /// Create a new item
    pub fn new(id: impl Into<String>, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            summary: String::new(),
            category: String::new(),
            genre: None,
            match_score: 0.0,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.match_score = clamp_score(score);
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    /// Whether the category still needs to be inferred
    pub fn has_generic_category(&self) -> bool {
        matches!(
            self.category.trim().to_lowercase().as_str(),
            "" | "book" | "unknown" | "other"
        )
    }
}

/// An item returned by an enrichment provider
///
/// `score` is `None` when the provider only added metadata; the merge then
/// leaves the existing score alone.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedItem {
    pub item: RecommendationItem,
    pub score: Option<f64>,
}

impl EnrichedItem {
    /// Metadata-only contribution
    pub fn unscored(item: RecommendationItem) -> Self {
        Self { item, score: None }
    }
}

impl From<RecommendationItem> for EnrichedItem {
    fn from(item: RecommendationItem) -> Self {
        Self {
            score: Some(item.match_score),
            item,
        }
    }
}

/// A review or social media post pointing at recommended reading
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mention {
    pub title: String,
    /// Publication or platform
    #[serde(default)]
    pub source: String,
    /// ISO-8601 date
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, alias = "link")]
    pub url: String,
    /// Provider-reported relevance, used to pick the top mention
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f64>,
}

/// Review of a recommended work
pub type ReviewItem = Mention;

/// Social media post about a recommended work
pub type SocialItem = Mention;

/// Feedback rating for a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Positive,
    Negative,
    Neutral,
}

/// User feedback on a category of books
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub category: String,
    pub rating: Rating,
}

impl FeedbackItem {
    pub fn new(category: impl Into<String>, rating: Rating) -> Self {
        Self {
            category: category.into(),
            rating,
        }
    }
}

/// Analysis object produced by an analysis provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// Provider that produced the analysis
    #[serde(default)]
    pub provider: String,
    #[serde(default, alias = "analysis")]
    pub summary: String,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub context: Vec<String>,
    /// True when generated locally because the provider was unavailable
    #[serde(default)]
    pub placeholder: bool,
}

impl Analysis {
    /// Deterministic stand-in used when a provider cannot answer
    pub fn placeholder(provider: impl Into<String>, term: &str) -> Self {
        let normalized = crate::query::normalize_term(term);
        Self {
            provider: provider.into(),
            summary: format!("Detailed analysis for \"{}\" is currently unavailable.", normalized),
            themes: crate::query::tokens(&normalized),
            context: Vec::new(),
            placeholder: true,
        }
    }
}

/// Why a provider contributed a fallback instead of its own payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    CircuitOpen,
    Timeout,
    Failure,
    Malformed,
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CircuitOpen => write!(f, "Circuit open"),
            Self::Timeout => write!(f, "Request timed out"),
            Self::Failure => write!(f, "Provider failure"),
            Self::Malformed => write!(f, "Malformed payload"),
        }
    }
}

/// A degraded provider contribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderIssue {
    pub provider: String,
    pub tier: Tier,
    pub reason: FallbackReason,
}

/// Bookkeeping attached to every tier result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub search_term: String,
    pub timestamp: DateTime<Utc>,
    pub processing_time_ms: u64,
    /// Set when a stage deadline elapsed and escalation stopped
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub timed_out: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ProviderIssue>,
    pub duplicates_removed: usize,
    pub total_results: usize,
}

impl ResultMetadata {
    pub fn new(search_term: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            timestamp: Utc::now(),
            processing_time_ms: 0,
            timed_out: false,
            error: None,
            errors: Vec::new(),
            duplicates_removed: 0,
            total_results: 0,
        }
    }
}

/// Ranked output of one tier, also the cache payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierResult {
    pub tier: Tier,
    pub items: Vec<RecommendationItem>,
    pub top_book: Option<RecommendationItem>,
    pub top_review: Option<ReviewItem>,
    pub top_social: Option<SocialItem>,
    #[serde(default)]
    pub reviews: Vec<ReviewItem>,
    #[serde(default)]
    pub social: Vec<SocialItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub analyses: Vec<Analysis>,
    pub metadata: ResultMetadata,
}

impl TierResult {
    /// Empty result for a tier
    pub fn empty(tier: Tier, search_term: impl Into<String>) -> Self {
        Self {
            tier,
            items: Vec::new(),
            top_book: None,
            top_review: None,
            top_social: None,
            reviews: Vec::new(),
            social: Vec::new(),
            analyses: Vec::new(),
            metadata: ResultMetadata::new(search_term),
        }
    }

    /// Whether the result may be stored in the response cache
    pub fn is_cacheable(&self) -> bool {
        !self.metadata.timed_out && self.metadata.error.is_none()
    }
}
