//! Deduplication, diversification and ranking of combined provider results

use super::canonical::CanonicalKey;
use super::types::*;
use crate::config::RankingSettings;
use crate::query;
use std::collections::HashMap;

/// Bonus per search-term token found in an item
const TOKEN_BONUS: f64 = 0.1;

/// Genre bucket for items that carry none
const UNKNOWN_GENRE: &str = "unknown";

/// Collapse items sharing a canonical key, keeping the higher score
///
/// Survivors keep the position of the first occurrence of their key.
/// Returns the unique items and the number of items removed.
pub fn deduplicate(items: Vec<RecommendationItem>) -> (Vec<RecommendationItem>, usize) {
    let input_len = items.len();
    let mut positions: HashMap<CanonicalKey, usize> = HashMap::with_capacity(input_len);
    let mut unique: Vec<RecommendationItem> = Vec::with_capacity(input_len);

    for item in items {
        let key = CanonicalKey::of(&item);
        match positions.get(&key) {
            Some(&pos) => {
                if item.match_score > unique[pos].match_score {
                    unique[pos] = item;
                }
            }
            None => {
                positions.insert(key, unique.len());
                unique.push(item);
            }
        }
    }

    let removed = input_len - unique.len();
    (unique, removed)
}

/// Stable sort by score, highest first
pub fn rank(items: &mut [RecommendationItem]) {
    items.sort_by(|a, b| clamp_score(b.match_score).total_cmp(&clamp_score(a.match_score)));
}

/// Keep the best-scoring items while capping repeats of an author or genre
///
/// Items without a genre share a single "unknown" genre bucket.
pub fn diversify(
    mut items: Vec<RecommendationItem>,
    max_per_author: usize,
    max_per_genre: usize,
    max_total: usize,
) -> Vec<RecommendationItem> {
    rank(&mut items);

    let mut author_counts: HashMap<String, usize> = HashMap::new();
    let mut genre_counts: HashMap<String, usize> = HashMap::new();
    let mut admitted = Vec::with_capacity(max_total.min(items.len()));

    for item in items {
        if admitted.len() >= max_total {
            break;
        }

        let author = item.author.trim().to_lowercase();
        let genre = item
            .genre
            .as_deref()
            .map(|g| g.trim().to_lowercase())
            .filter(|g| !g.is_empty())
            .unwrap_or_else(|| UNKNOWN_GENRE.to_string());

        let author_count = author_counts.get(&author).copied().unwrap_or(0);
        let genre_count = genre_counts.get(&genre).copied().unwrap_or(0);

        if author_count < max_per_author && genre_count < max_per_genre {
            *author_counts.entry(author).or_insert(0) += 1;
            *genre_counts.entry(genre).or_insert(0) += 1;
            admitted.push(item);
        }
    }

    admitted
}

/// Cheap lexical boost used by the fast tier
///
/// Each distinct term token found in the title or summary adds 0.1, and a
/// token found in the title adds another 0.1. Scores are clamped afterwards.
pub fn quick_score(items: Vec<RecommendationItem>, search_term: &str) -> Vec<RecommendationItem> {
    let tokens = query::tokens(search_term);

    items
        .into_iter()
        .map(|mut item| {
            let title = item.title.to_lowercase();
            let summary = item.summary.to_lowercase();
            let mut bonus = 0.0;

            for token in &tokens {
                let in_title = title.contains(token.as_str());
                if in_title || summary.contains(token.as_str()) {
                    bonus += TOKEN_BONUS;
                }
                if in_title {
                    bonus += TOKEN_BONUS;
                }
            }

            item.match_score = clamp_score(item.match_score + bonus);
            item
        })
        .collect()
}

/// Fold enrichment contributions into a baseline
///
/// Items already in the baseline take the mean of the scores reported for
/// them, and gain missing category, genre, summary and attributes. A
/// contribution without a score leaves the score untouched. Unknown items
/// are appended. Baseline items never disappear.
pub fn merge_enrichments(
    baseline: Vec<RecommendationItem>,
    contributions: Vec<Vec<EnrichedItem>>,
) -> Vec<RecommendationItem> {
    let mut merged = baseline;
    let mut positions: HashMap<CanonicalKey, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, item)| (CanonicalKey::of(item), i))
        .collect();
    // (sum of reported scores, number of reports) per merged item
    let mut reports: Vec<(f64, usize)> = vec![(0.0, 0); merged.len()];

    for contribution in contributions {
        for EnrichedItem { item, score } in contribution {
            let key = CanonicalKey::of(&item);
            match positions.get(&key) {
                Some(&pos) => {
                    if let Some(score) = score {
                        reports[pos].0 += clamp_score(score);
                        reports[pos].1 += 1;
                    }

                    let target = &mut merged[pos];
                    if target.has_generic_category() && !item.has_generic_category() {
                        target.category = item.category;
                    }
                    if target.genre.is_none() {
                        target.genre = item.genre;
                    }
                    if target.summary.is_empty() {
                        target.summary = item.summary;
                    }
                    for (k, v) in item.attributes {
                        target.attributes.entry(k).or_insert(v);
                    }
                }
                None => {
                    positions.insert(key, merged.len());
                    reports.push(match score {
                        Some(score) => (clamp_score(score), 1),
                        None => (0.0, 0),
                    });
                    merged.push(item);
                }
            }
        }
    }

    for (item, (sum, count)) in merged.iter_mut().zip(reports) {
        if count > 0 {
            item.match_score = clamp_score(sum / count as f64);
        }
    }

    merged
}

/// Pick the most relevant mention without randomness
///
/// Highest relevance wins, then the most recent date, then the earliest
/// position in the input.
pub fn top_mention(mentions: &[Mention]) -> Option<Mention> {
    let relevance = |m: &Mention| clamp_score(m.relevance.unwrap_or(0.0));

    mentions
        .iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| {
            relevance(a)
                .total_cmp(&relevance(b))
                .then_with(|| a.date.cmp(&b.date))
                .then_with(|| ib.cmp(ia))
        })
        .map(|(_, m)| m.clone())
}

/// Caps applied when diversifying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiversityCaps {
    pub max_per_author: usize,
    pub max_per_genre: usize,
    pub max_total: usize,
}

impl Default for DiversityCaps {
    fn default() -> Self {
        Self::from(&RankingSettings::default())
    }
}

impl From<&RankingSettings> for DiversityCaps {
    fn from(settings: &RankingSettings) -> Self {
        Self {
            max_per_author: settings.max_items_per_author,
            max_per_genre: settings.max_items_per_genre,
            max_total: settings.max_recommendations,
        }
    }
}

/// Applies dedup, diversity and top-pick selection to a tier result
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    caps: DiversityCaps,
}

impl ResultAggregator {
    pub fn new(caps: DiversityCaps) -> Self {
        Self { caps }
    }

    /// Replace the items of `result` with the deduplicated, diversified
    /// ranking of `items` and refresh the top picks
    pub fn finalize(&self, result: &mut TierResult, items: Vec<RecommendationItem>) {
        let (unique, removed) = deduplicate(items);
        let ranked = diversify(
            unique,
            self.caps.max_per_author,
            self.caps.max_per_genre,
            self.caps.max_total,
        );

        result.metadata.duplicates_removed += removed;
        result.metadata.total_results = ranked.len();
        result.top_book = ranked.first().cloned();
        result.top_review = top_mention(&result.reviews);
        result.top_social = top_mention(&result.social);
        result.items = ranked;
    }
}
