//! Local cross-validation from user feedback

use super::traits::{EnrichmentProvider, EnrichmentRequest};
use crate::error::Result;
use crate::results::{clamp_score, EnrichedItem, FeedbackItem, Rating, RecommendationItem};
use async_trait::async_trait;

/// Score adjustment per matching feedback entry
const FEEDBACK_WEIGHT: f64 = 0.1;

/// Boosts or demotes items whose category or genre the user rated
pub struct FeedbackValidator {
    name: String,
}

impl FeedbackValidator {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Apply feedback to one item; returns whether any entry matched
    pub fn adjust(item: &mut RecommendationItem, feedback: &[FeedbackItem]) -> bool {
        let mut delta = 0.0;
        let mut matched = false;
        for entry in feedback {
            if !matches_item(item, &entry.category) {
                continue;
            }
            matched = true;
            match entry.rating {
                Rating::Positive => delta += FEEDBACK_WEIGHT,
                Rating::Negative => delta -= FEEDBACK_WEIGHT,
                Rating::Neutral => {}
            }
        }
        item.match_score = clamp_score(item.match_score + delta);
        matched
    }
}

impl Default for FeedbackValidator {
    fn default() -> Self {
        Self::new("feedback")
    }
}

fn matches_item(item: &RecommendationItem, category: &str) -> bool {
    let category = category.trim();
    if category.is_empty() {
        return false;
    }
    item.category.trim().eq_ignore_ascii_case(category)
        || item
            .genre
            .as_deref()
            .map(|genre| genre.trim().eq_ignore_ascii_case(category))
            .unwrap_or(false)
}

#[async_trait]
impl EnrichmentProvider for FeedbackValidator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn enrich(&self, request: &EnrichmentRequest) -> Result<Vec<EnrichedItem>> {
        Ok(request
            .items
            .iter()
            .cloned()
            .map(|mut item| {
                if Self::adjust(&mut item, &request.feedback) {
                    EnrichedItem::from(item)
                } else {
                    EnrichedItem::unscored(item)
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_feedback_adjusts_scores() {
        let validator = FeedbackValidator::default();
        let mut request = EnrichmentRequest::new(
            "space",
            vec![
                RecommendationItem::new("1", "Dune", "Herbert")
                    .with_category("Novel")
                    .with_score(0.5),
                RecommendationItem::new("2", "Cosmos", "Sagan")
                    .with_genre("science")
                    .with_score(0.95),
                RecommendationItem::new("3", "Poems", "Plath").with_score(0.4),
            ],
        );
        request.feedback = vec![
            FeedbackItem::new("novel", Rating::Positive),
            FeedbackItem::new("Science", Rating::Positive),
            FeedbackItem::new("poetry", Rating::Negative),
        ];

        let items = validator.enrich(&request).await.unwrap();
        assert!((items[0].score.unwrap() - 0.6).abs() < 1e-9);
        assert_eq!(items[1].score, Some(1.0));
        // no feedback on "Poems": metadata only
        assert_eq!(items[2].score, None);
        assert_eq!(items[2].item.match_score, 0.4);
    }

    #[tokio::test]
    async fn test_no_feedback_is_pass_through() {
        let validator = FeedbackValidator::default();
        let request = EnrichmentRequest::new(
            "space",
            vec![RecommendationItem::new("1", "Dune", "Herbert").with_score(0.5)],
        );
        let items = validator.enrich(&request).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item, request.items[0]);
        assert!(items[0].score.is_none());
    }
}
