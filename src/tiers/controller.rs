//! Tier state machine
//!
//! FAST always runs. STANDARD and COMPREHENSIVE each extend the previous
//! stage's result. Every stage fans out to its providers concurrently and
//! joins them against a single deadline; a stage that misses its deadline
//! keeps whatever finished, marks the result `timed_out` and ends
//! escalation.

use super::models::{RecommendationQuery, Tier};
use crate::config::{secs, Settings, TierSettings};
use crate::providers::{
    EnrichmentRequest, EnrichmentStage, GatewayOutcome, ProviderRegistry, SearchPayload,
};
use crate::results::{
    merge_enrichments, quick_score, Analysis, DiversityCaps, EnrichedItem, FallbackReason,
    ProviderIssue, RecommendationItem, ResultAggregator, TierResult,
};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

/// Provider name attached to the analysis synthesized when none arrived
const LOCAL_ANALYSIS: &str = "local";

/// Upper bound on how long a stage waits for its providers
const MAX_STAGE_WAIT: Duration = Duration::from_secs(30 * 24 * 3600);

/// One deadline per stage, covering the whole fan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDeadlines {
    pub fast: Duration,
    pub standard: Duration,
    pub comprehensive: Duration,
}

impl Default for StageDeadlines {
    fn default() -> Self {
        Self::from(&TierSettings::default())
    }
}

impl From<&TierSettings> for StageDeadlines {
    fn from(settings: &TierSettings) -> Self {
        Self {
            fast: secs(settings.fast_deadline),
            standard: secs(settings.standard_deadline),
            comprehensive: secs(settings.comprehensive_deadline),
        }
    }
}

/// What a comprehensive-stage task produced
enum Contribution {
    Items(Vec<EnrichedItem>),
    Analysis(Analysis),
}

enum Slot<T> {
    Pending,
    Done(GatewayOutcome<T>),
    Crashed,
}

/// Outcome of joining one stage's tasks against its deadline
struct StageJoin<T> {
    slots: Vec<(String, Slot<T>)>,
    timed_out: bool,
}

/// Join spawned provider calls until all finish or the deadline passes
///
/// Tasks still running at the deadline are detached, not cancelled.
/// Slots stay in spawn order regardless of completion order.
async fn join_stage<T: Send + 'static>(
    tasks: Vec<(String, JoinHandle<GatewayOutcome<T>>)>,
    deadline: Duration,
) -> StageJoin<T> {
    let deadline = Instant::now() + deadline.min(MAX_STAGE_WAIT);
    let mut slots = Vec::with_capacity(tasks.len());
    let mut pending = FuturesUnordered::new();

    for (index, (name, handle)) in tasks.into_iter().enumerate() {
        slots.push((name, Slot::Pending));
        pending.push(async move { (index, handle.await) });
    }

    let mut timed_out = false;
    loop {
        match timeout_at(deadline, pending.next()).await {
            Ok(Some((index, Ok(outcome)))) => slots[index].1 = Slot::Done(outcome),
            Ok(Some((index, Err(e)))) => {
                warn!("Provider task {} ended abnormally: {}", slots[index].0, e);
                slots[index].1 = Slot::Crashed;
            }
            Ok(None) => break,
            Err(_) => {
                timed_out = true;
                break;
            }
        }
    }

    StageJoin { slots, timed_out }
}

/// Drives a query through the tiers it asked for
pub struct TierController {
    registry: Arc<ProviderRegistry>,
    deadlines: StageDeadlines,
    aggregator: ResultAggregator,
}

impl TierController {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        deadlines: StageDeadlines,
        aggregator: ResultAggregator,
    ) -> Self {
        Self {
            registry,
            deadlines,
            aggregator,
        }
    }

    /// Build a controller using the `tiers` and `ranking` settings
    pub fn from_settings(registry: Arc<ProviderRegistry>, settings: &Settings) -> Self {
        Self::new(
            registry,
            StageDeadlines::from(&settings.tiers),
            ResultAggregator::new(DiversityCaps::from(&settings.ranking)),
        )
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn deadlines(&self) -> StageDeadlines {
        self.deadlines
    }

    /// Compute the requested tier and return the final result
    pub async fn run(&self, query: &RecommendationQuery) -> TierResult {
        self.run_staged(query, None).await
    }

    /// Compute the requested tier, sending every intermediate stage result
    /// that is about to be escalated to `progress`
    ///
    /// Results are sent in tier order. The returned value is the final
    /// result and is never sent on `progress`.
    pub async fn run_staged(
        &self,
        query: &RecommendationQuery,
        progress: Option<&mpsc::Sender<TierResult>>,
    ) -> TierResult {
        let started = std::time::Instant::now();

        if query.is_empty() {
            let mut result = TierResult::empty(Tier::Fast, &query.search_term);
            result.metadata.error = Some("search term is empty".to_string());
            return result;
        }

        info!(
            "Running recommendation for '{}' up to {} tier",
            query.search_term, query.tier
        );

        let mut result = self.fast_stage(query).await;

        loop {
            if result.metadata.timed_out || result.metadata.error.is_some() {
                break;
            }
            let next = match result.tier.next() {
                Some(next) if next <= query.tier => next,
                _ => break,
            };

            if let Some(tx) = progress {
                let mut snapshot = result.clone();
                snapshot.metadata.processing_time_ms = started.elapsed().as_millis() as u64;
                if tx.send(snapshot).await.is_err() {
                    debug!("Progress receiver dropped, stopping at {} tier", result.tier);
                    break;
                }
            }

            result = match next {
                Tier::Fast => break,
                Tier::Standard => self.standard_stage(query, result).await,
                Tier::Comprehensive => self.comprehensive_stage(query, result).await,
            };
        }

        result.metadata.processing_time_ms = started.elapsed().as_millis() as u64;
        debug!(
            "Finished '{}' at {} tier in {}ms",
            query.search_term, result.tier, result.metadata.processing_time_ms
        );
        result
    }

    async fn fast_stage(&self, query: &RecommendationQuery) -> TierResult {
        let mut result = TierResult::empty(Tier::Fast, &query.search_term);
        let entries = self.registry.search_providers();

        if entries.is_empty() {
            warn!("No search providers configured");
            result.metadata.error = Some("no search providers configured".to_string());
            return result;
        }

        let term = query.search_term.trim().to_string();
        let tasks = entries
            .iter()
            .map(|entry| {
                let provider = entry.provider.clone();
                let gateway = entry.gateway.clone();
                let term = term.clone();
                let handle = tokio::spawn(async move {
                    gateway
                        .call(
                            || async move { provider.search(&term).await },
                            SearchPayload::default,
                        )
                        .await
                });
                (entry.gateway.name().to_string(), handle)
            })
            .collect();

        let join = join_stage(tasks, self.deadlines.fast).await;
        let mut books = Vec::new();
        for payload in collect(Tier::Fast, join, &mut result) {
            books.extend(payload.books);
            result.reviews.extend(payload.reviews);
            result.social.extend(payload.social);
        }

        let scored = quick_score(books, &term);
        self.aggregator.finalize(&mut result, scored);
        result
    }

    async fn standard_stage(
        &self,
        query: &RecommendationQuery,
        mut result: TierResult,
    ) -> TierResult {
        let entries = self.registry.enrichment_providers(EnrichmentStage::Standard);
        if entries.is_empty() {
            debug!("No enrichment providers, standard tier keeps the fast ranking");
            result.tier = Tier::Standard;
            return result;
        }

        let request = Arc::new(enrichment_request(query, &result.items));
        let tasks = entries
            .into_iter()
            .map(|entry| {
                let name = entry.gateway.name().to_string();
                let request = request.clone();
                let handle = tokio::spawn(async move {
                    let provider = entry.provider;
                    entry
                        .gateway
                        .call(|| async move { provider.enrich(&request).await }, Vec::new)
                        .await
                });
                (name, handle)
            })
            .collect();

        let join = join_stage(tasks, self.deadlines.standard).await;
        let timed_out = join.timed_out;
        let contributions = collect(Tier::Standard, join, &mut result);

        let baseline = std::mem::take(&mut result.items);
        self.aggregator
            .finalize(&mut result, merge_enrichments(baseline, contributions));

        if timed_out {
            warn!("Standard tier missed its deadline for '{}'", query.search_term);
        } else {
            result.tier = Tier::Standard;
        }
        result
    }

    async fn comprehensive_stage(
        &self,
        query: &RecommendationQuery,
        mut result: TierResult,
    ) -> TierResult {
        let request = Arc::new(enrichment_request(query, &result.items));
        let term = query.search_term.trim().to_string();
        let mut tasks = Vec::new();

        for entry in self
            .registry
            .enrichment_providers(EnrichmentStage::CrossValidation)
        {
            let name = entry.gateway.name().to_string();
            let request = request.clone();
            let handle = tokio::spawn(async move {
                let provider = entry.provider;
                entry
                    .gateway
                    .call(|| async move { provider.enrich(&request).await }, Vec::new)
                    .await
                    .map(Contribution::Items)
            });
            tasks.push((name, handle));
        }

        for entry in self.registry.analysis_providers() {
            let name = entry.gateway.name().to_string();
            let provider = entry.provider.clone();
            let gateway = entry.gateway.clone();
            let term = term.clone();
            let handle = tokio::spawn(async move {
                let fallback_name = gateway.name().to_string();
                let fallback_term = term.clone();
                gateway
                    .call(
                        || async move { provider.analyze(&term).await },
                        move || Analysis::placeholder(fallback_name, &fallback_term),
                    )
                    .await
                    .map(Contribution::Analysis)
            });
            tasks.push((name, handle));
        }

        let join = join_stage(tasks, self.deadlines.comprehensive).await;
        let timed_out = join.timed_out;

        let mut validations = Vec::new();
        for contribution in collect(Tier::Comprehensive, join, &mut result) {
            match contribution {
                Contribution::Items(items) => validations.push(items),
                Contribution::Analysis(analysis) => result.analyses.push(analysis),
            }
        }

        let baseline = std::mem::take(&mut result.items);
        self.aggregator
            .finalize(&mut result, merge_enrichments(baseline, validations));

        if timed_out {
            warn!(
                "Comprehensive tier missed its deadline for '{}'",
                query.search_term
            );
        } else {
            result.tier = Tier::Comprehensive;
            if result.analyses.is_empty() {
                result
                    .analyses
                    .push(Analysis::placeholder(LOCAL_ANALYSIS, &term));
            }
        }
        result
    }
}

fn enrichment_request(query: &RecommendationQuery, items: &[RecommendationItem]) -> EnrichmentRequest {
    EnrichmentRequest {
        term: query.search_term.trim().to_string(),
        items: items.to_vec(),
        history: query.history.clone(),
        feedback: query.feedback.clone(),
    }
}

/// Values of every call that finished, in spawn order
///
/// Fallbacks, crashed tasks and calls still pending at the deadline are
/// recorded in `result.metadata.errors`. A missed deadline marks the
/// result as timed out.
fn collect<T>(tier: Tier, join: StageJoin<T>, result: &mut TierResult) -> Vec<T> {
    let mut values = Vec::with_capacity(join.slots.len());
    if join.timed_out {
        result.metadata.timed_out = true;
    }

    for (provider, slot) in join.slots {
        let reason = match slot {
            Slot::Done(outcome) => {
                let reason = outcome.fallback_reason();
                values.push(outcome.value);
                reason
            }
            Slot::Pending => Some(FallbackReason::Timeout),
            Slot::Crashed => Some(FallbackReason::Failure),
        };

        if let Some(reason) = reason {
            result.metadata.errors.push(ProviderIssue {
                provider,
                tier,
                reason,
            });
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BreakerSettings, ProviderConfig};
    use crate::error::{Error, Result};
    use crate::metrics::Metrics;
    use crate::providers::{AnalysisProvider, EnrichmentProvider, FeedbackValidator, SearchProvider};
    use crate::results::{FeedbackItem, Rating};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSearch {
        name: &'static str,
        delay: Duration,
        books: Vec<RecommendationItem>,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl FakeSearch {
        fn new(name: &'static str, books: Vec<RecommendationItem>) -> Self {
            Self {
                name,
                delay: Duration::ZERO,
                books,
                fail: false,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }
    }

    #[async_trait]
    impl SearchProvider for FakeSearch {
        fn name(&self) -> &str {
            self.name
        }

        async fn search(&self, _term: &str) -> Result<SearchPayload> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(Error::ProviderFailure("boom".to_string()));
            }
            Ok(SearchPayload::with_books(self.books.clone()))
        }
    }

    struct FakeEnricher {
        name: &'static str,
        delay: Duration,
        category: &'static str,
    }

    #[async_trait]
    impl EnrichmentProvider for FakeEnricher {
        fn name(&self) -> &str {
            self.name
        }

        async fn enrich(&self, request: &EnrichmentRequest) -> Result<Vec<EnrichedItem>> {
            tokio::time::sleep(self.delay).await;
            Ok(request
                .items
                .iter()
                .cloned()
                .map(|item| EnrichedItem::unscored(item.with_category(self.category)))
                .collect())
        }
    }

    struct FakeAnalysis {
        delay: Duration,
    }

    #[async_trait]
    impl AnalysisProvider for FakeAnalysis {
        fn name(&self) -> &str {
            "analyst"
        }

        async fn analyze(&self, term: &str) -> Result<Analysis> {
            tokio::time::sleep(self.delay).await;
            Ok(Analysis {
                provider: "analyst".to_string(),
                summary: format!("about {}", term),
                themes: vec!["space".to_string()],
                context: Vec::new(),
                placeholder: false,
            })
        }
    }

    fn config(name: &str) -> ProviderConfig {
        ProviderConfig {
            name: name.to_string(),
            timeout: Some(5.0),
            ..Default::default()
        }
    }

    fn registry() -> ProviderRegistry {
        ProviderRegistry::new(BreakerSettings::default(), Arc::new(Metrics::new()))
    }

    fn deadlines(ms: u64) -> StageDeadlines {
        StageDeadlines {
            fast: Duration::from_millis(ms),
            standard: Duration::from_millis(ms),
            comprehensive: Duration::from_millis(ms),
        }
    }

    fn controller(registry: ProviderRegistry, deadlines: StageDeadlines) -> TierController {
        TierController::new(Arc::new(registry), deadlines, ResultAggregator::default())
    }

    fn books() -> Vec<RecommendationItem> {
        vec![
            RecommendationItem::new("1", "Dune", "Frank Herbert").with_score(0.6),
            RecommendationItem::new("2", "Hyperion", "Dan Simmons").with_score(0.5),
        ]
    }

    #[tokio::test]
    async fn test_fast_tier_stops_at_fast() {
        let mut registry = registry();
        registry.register_search(Arc::new(FakeSearch::new("perplexity", books())), &config("perplexity"));
        registry.register_enrichment(
            Arc::new(FakeEnricher {
                name: "claude",
                delay: Duration::ZERO,
                category: "novel",
            }),
            EnrichmentStage::Standard,
            &config("claude"),
        );
        let controller = controller(registry, deadlines(500));

        let query = RecommendationQuery::simple("u1", "dune").with_tier(Tier::Fast);
        let result = controller.run(&query).await;

        assert_eq!(result.tier, Tier::Fast);
        assert!(!result.metadata.timed_out);
        assert_eq!(result.items.len(), 2);
        // title match on "dune" adds 0.2
        assert_eq!(result.top_book.as_ref().unwrap().title, "Dune");
        assert!((result.items[0].match_score - 0.8).abs() < 1e-9);
        assert!(result.items.iter().all(|i| i.category.is_empty()));
    }

    #[tokio::test]
    async fn test_no_search_providers() {
        let controller = controller(registry(), deadlines(100));
        let result = controller.run(&RecommendationQuery::simple("u1", "dune")).await;

        assert_eq!(result.tier, Tier::Fast);
        assert!(result.items.is_empty());
        assert_eq!(
            result.metadata.error.as_deref(),
            Some("no search providers configured")
        );
    }

    #[tokio::test]
    async fn test_fast_timeout_stops_escalation() {
        let slow = FakeSearch::new("slow", books()).delayed(Duration::from_millis(300));
        let quick = FakeSearch::new("quick", vec![RecommendationItem::new("9", "Solaris", "Lem")]);
        let mut registry = registry();
        registry.register_search(Arc::new(slow), &config("slow"));
        registry.register_search(Arc::new(quick), &config("quick"));
        registry.register_enrichment(
            Arc::new(FakeEnricher {
                name: "claude",
                delay: Duration::ZERO,
                category: "novel",
            }),
            EnrichmentStage::Standard,
            &config("claude"),
        );
        let controller = controller(registry, deadlines(50));

        let started = std::time::Instant::now();
        let query = RecommendationQuery::simple("u1", "space").with_tier(Tier::Comprehensive);
        let result = controller.run(&query).await;

        assert!(started.elapsed() < Duration::from_millis(250));
        assert_eq!(result.tier, Tier::Fast);
        assert!(result.metadata.timed_out);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].title, "Solaris");
        assert!(result.metadata.errors.iter().any(|issue| issue.provider == "slow"
            && issue.reason == FallbackReason::Timeout
            && issue.tier == Tier::Fast));
    }

    #[tokio::test]
    async fn test_failed_search_degrades_to_fallback() {
        let mut registry = registry();
        registry.register_search(Arc::new(FakeSearch::new("good", books())), &config("good"));
        registry.register_search(
            Arc::new(FakeSearch::new("bad", Vec::new()).failing()),
            &config("bad"),
        );
        let controller = controller(registry, deadlines(500));

        let result = controller
            .run(&RecommendationQuery::simple("u1", "dune").with_tier(Tier::Fast))
            .await;

        assert!(!result.metadata.timed_out);
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.metadata.errors.len(), 1);
        assert_eq!(result.metadata.errors[0].reason, FallbackReason::Failure);
    }

    #[tokio::test]
    async fn test_standard_timeout_keeps_fast_tier() {
        let mut registry = registry();
        registry.register_search(Arc::new(FakeSearch::new("perplexity", books())), &config("perplexity"));
        registry.register_enrichment(
            Arc::new(FakeEnricher {
                name: "claude",
                delay: Duration::from_millis(400),
                category: "novel",
            }),
            EnrichmentStage::Standard,
            &config("claude"),
        );
        registry.register_analysis(
            Arc::new(FakeAnalysis {
                delay: Duration::ZERO,
            }),
            &config("analyst"),
        );
        let controller = controller(
            registry,
            StageDeadlines {
                fast: Duration::from_millis(500),
                standard: Duration::from_millis(50),
                comprehensive: Duration::from_millis(500),
            },
        );

        let query = RecommendationQuery::simple("u1", "dune").with_tier(Tier::Comprehensive);
        let result = controller.run(&query).await;

        assert_eq!(result.tier, Tier::Fast);
        assert!(result.metadata.timed_out);
        assert_eq!(result.items.len(), 2);
        assert!(result.analyses.is_empty());
    }

    #[tokio::test]
    async fn test_comprehensive_extends_standard() {
        let mut registry = registry();
        registry.register_search(Arc::new(FakeSearch::new("perplexity", books())), &config("perplexity"));
        registry.register_enrichment(
            Arc::new(FakeEnricher {
                name: "claude",
                delay: Duration::from_millis(5),
                category: "novel",
            }),
            EnrichmentStage::Standard,
            &config("claude"),
        );
        registry.register_enrichment(
            Arc::new(FeedbackValidator::default()),
            EnrichmentStage::CrossValidation,
            &config("feedback"),
        );
        registry.register_analysis(
            Arc::new(FakeAnalysis {
                delay: Duration::from_millis(5),
            }),
            &config("analyst"),
        );
        let controller = controller(registry, deadlines(500));

        let query = RecommendationQuery::simple("u1", "space")
            .with_tier(Tier::Comprehensive)
            .with_feedback(vec![FeedbackItem::new("novel", Rating::Negative)]);
        let result = controller.run(&query).await;

        assert_eq!(result.tier, Tier::Comprehensive);
        assert!(!result.metadata.timed_out);
        assert!(result.metadata.errors.is_empty());
        assert_eq!(result.items.len(), 2);
        assert!(result.items.iter().all(|i| i.category == "novel"));
        // negative feedback on "novel" demotes by 0.1
        assert!((result.items[0].match_score - 0.5).abs() < 1e-9);
        assert_eq!(result.analyses.len(), 1);
        assert!(!result.analyses[0].placeholder);
    }

    #[tokio::test]
    async fn test_comprehensive_without_analysis_gets_placeholder() {
        let mut registry = registry();
        registry.register_search(Arc::new(FakeSearch::new("perplexity", books())), &config("perplexity"));
        let controller = controller(registry, deadlines(500));

        let query = RecommendationQuery::simple("u1", "Space  Opera").with_tier(Tier::Comprehensive);
        let result = controller.run(&query).await;

        assert_eq!(result.tier, Tier::Comprehensive);
        assert_eq!(result.analyses.len(), 1);
        assert!(result.analyses[0].placeholder);
        assert_eq!(result.analyses[0].themes, vec!["space", "opera"]);
    }

    #[tokio::test]
    async fn test_open_breaker_skips_search_provider() {
        let search = FakeSearch::new("perplexity", books()).failing();
        let calls = search.calls.clone();
        let mut registry = registry();
        registry.register_search(
            Arc::new(search),
            &ProviderConfig {
                failure_threshold: Some(3),
                ..config("perplexity")
            },
        );
        let controller = controller(registry, deadlines(500));
        let query = RecommendationQuery::simple("u1", "dune").with_tier(Tier::Fast);

        for _ in 0..4 {
            controller.run(&query).await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let result = controller.run(&query).await;
        assert_eq!(result.metadata.errors[0].reason, FallbackReason::CircuitOpen);
    }

    #[tokio::test]
    async fn test_progress_receives_intermediate_tiers() {
        let mut registry = registry();
        registry.register_search(Arc::new(FakeSearch::new("perplexity", books())), &config("perplexity"));
        let controller = controller(registry, deadlines(500));
        let (tx, mut rx) = mpsc::channel(4);

        let query = RecommendationQuery::simple("u1", "dune").with_tier(Tier::Comprehensive);
        let result = controller.run_staged(&query, Some(&tx)).await;
        drop(tx);

        let mut tiers = Vec::new();
        while let Some(partial) = rx.recv().await {
            tiers.push(partial.tier);
        }
        assert_eq!(tiers, vec![Tier::Fast, Tier::Standard]);
        assert_eq!(result.tier, Tier::Comprehensive);
    }

    #[tokio::test]
    async fn test_unbounded_deadline_does_not_overflow() {
        let mut registry = registry();
        registry.register_search(Arc::new(FakeSearch::new("perplexity", books())), &config("perplexity"));
        let controller = controller(
            registry,
            StageDeadlines {
                fast: Duration::MAX,
                standard: Duration::MAX,
                comprehensive: Duration::MAX,
            },
        );

        let query = RecommendationQuery::simple("u1", "dune").with_tier(Tier::Comprehensive);
        let result = controller.run(&query).await;
        assert_eq!(result.tier, Tier::Comprehensive);
        assert!(!result.metadata.timed_out);
    }

    #[test]
    fn test_from_settings_uses_tier_deadlines() {
        let settings = Settings::from_yaml("tiers:\n  fast_deadline: 2.5\n  standard_deadline: 1.0e+20\n").unwrap();
        let controller = TierController::from_settings(Arc::new(registry()), &settings);

        let deadlines = controller.deadlines();
        assert_eq!(deadlines.fast, Duration::from_millis(2500));
        assert_eq!(deadlines.standard, Duration::from_secs(30 * 24 * 3600));
        assert_eq!(deadlines.comprehensive, Duration::from_secs(40));
    }

    #[tokio::test]
    async fn test_empty_term() {
        let controller = controller(registry(), deadlines(100));
        let result = controller.run(&RecommendationQuery::simple("u1", "   ")).await;
        assert!(result.metadata.error.is_some());
    }
}
