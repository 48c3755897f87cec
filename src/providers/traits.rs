//! Provider capability traits and payload types

use crate::error::Result;
use crate::results::{Analysis, EnrichedItem, FeedbackItem, Mention, RecommendationItem};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Typed payload of a search provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPayload {
    #[serde(default)]
    pub books: Vec<RecommendationItem>,
    #[serde(default)]
    pub reviews: Vec<Mention>,
    #[serde(default)]
    pub social: Vec<Mention>,
}

impl SearchPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_books(books: Vec<RecommendationItem>) -> Self {
        Self {
            books,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty() && self.reviews.is_empty() && self.social.is_empty()
    }
}

/// Input handed to every enrichment provider
///
/// Shared read-only by every provider of a stage.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentRequest {
    pub term: String,
    pub items: Vec<RecommendationItem>,
    pub history: Vec<String>,
    pub feedback: Vec<FeedbackItem>,
}

impl EnrichmentRequest {
    pub fn new(term: impl Into<String>, items: Vec<RecommendationItem>) -> Self {
        Self {
            term: term.into(),
            items,
            history: Vec::new(),
            feedback: Vec::new(),
        }
    }
}

/// Stage at which an enrichment provider runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStage {
    /// Reviews, social signals, basic insight (standard tier)
    Standard,
    /// Cross-validation of the standard ranking (comprehensive tier)
    CrossValidation,
}

/// Source of initial candidates, reviews and social posts
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Search for a term
    async fn search(&self, term: &str) -> Result<SearchPayload>;
}

/// Adjusts scores and fills in metadata for a list of items
#[async_trait]
pub trait EnrichmentProvider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Return the enriched items; an item without a score only adds metadata
    async fn enrich(&self, request: &EnrichmentRequest) -> Result<Vec<EnrichedItem>>;
}

/// Produces an analysis object for a term
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Analyze a term
    async fn analyze(&self, term: &str) -> Result<Analysis>;
}
