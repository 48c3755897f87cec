//! Recommendation service facade
//!
//! Ties the tier controller, progressive emitter, response cache and
//! persistence together behind the two public entry points.

use crate::cache::{MemoryStore, ResponseCache};
use crate::config::Settings;
use crate::metrics::Metrics;
use crate::persistence::{self, PersistenceCollaborator};
use crate::progressive::{ProgressiveEmitter, RecommendationEvent};
use crate::providers::ProviderRegistry;
use crate::results::{FeedbackItem, TierResult};
use crate::tiers::{RecommendationQuery, Tier, TierController};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Incoming recommendation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: String,
    pub search_term: String,
    #[serde(default)]
    pub history: Vec<String>,
    #[serde(default)]
    pub feedback: Vec<FeedbackItem>,
    #[serde(default)]
    pub tier: Tier,
    /// Stream intermediate tiers; progressive results are never cached
    #[serde(default)]
    pub progressive: bool,
    /// Bypass the cache read
    #[serde(default)]
    pub skip_cache: bool,
}

impl RecommendationRequest {
    pub fn new(user_id: impl Into<String>, search_term: impl Into<String>, tier: Tier) -> Self {
        Self {
            user_id: user_id.into(),
            search_term: search_term.into(),
            history: Vec::new(),
            feedback: Vec::new(),
            tier,
            progressive: false,
            skip_cache: false,
        }
    }

    fn to_query(&self) -> RecommendationQuery {
        RecommendationQuery::simple(&self.user_id, &self.search_term)
            .with_tier(self.tier)
            .with_history(self.history.clone())
            .with_feedback(self.feedback.clone())
    }
}

/// Main recommendation service
pub struct RecommendationService {
    controller: Arc<TierController>,
    emitter: ProgressiveEmitter,
    cache: ResponseCache,
    persistence: Arc<dyn PersistenceCollaborator>,
    metrics: Arc<Metrics>,
}

impl RecommendationService {
    pub fn new(
        controller: Arc<TierController>,
        cache: ResponseCache,
        persistence: Arc<dyn PersistenceCollaborator>,
    ) -> Self {
        let metrics = controller.registry().metrics().clone();
        Self {
            emitter: ProgressiveEmitter::new(controller.clone()),
            controller,
            cache,
            persistence,
            metrics,
        }
    }

    /// Build the service from settings and a loaded provider registry
    pub fn from_settings(settings: &Settings, registry: ProviderRegistry) -> Self {
        let controller = Arc::new(TierController::from_settings(Arc::new(registry), settings));
        let cache = if settings.cache.enabled {
            ResponseCache::new(
                Arc::new(MemoryStore::new(settings.cache.max_capacity)),
                Duration::from_secs(settings.cache.ttl),
            )
        } else {
            ResponseCache::disabled()
        };

        Self::new(controller, cache, persistence::from_settings(&settings.persistence))
    }

    /// Compute (or fetch from cache) the result for a request
    pub async fn get_recommendations(&self, request: &RecommendationRequest) -> TierResult {
        self.metrics.inc_request();

        if let Some(cached) = self.cached(request).await {
            return cached;
        }

        let query = self.prepare_query(request).await;
        let result = self.controller.run(&query).await;

        if !request.progressive
            && self
                .cache
                .set(&request.user_id, &request.search_term, request.tier, &result)
                .await
        {
            info!(
                "Cached {} result for '{}'",
                request.tier, request.search_term
            );
        }

        result
    }

    /// Stream events for a request, ending with exactly one final event
    pub async fn stream_recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> mpsc::Receiver<RecommendationEvent> {
        self.metrics.inc_request();

        if let Some(cached) = self.cached(request).await {
            let (tx, rx) = mpsc::channel(1);
            if tx
                .try_send(RecommendationEvent::new(Uuid::new_v4(), 0, cached, true))
                .is_err()
            {
                warn!("Failed to queue cached event for '{}'", request.search_term);
            }
            return rx;
        }

        let query = self.prepare_query(request).await;
        self.emitter.stream(query)
    }

    pub async fn invalidate_cache(&self, user_id: &str, search_term: &str, tier: Tier) -> bool {
        self.cache.invalidate(user_id, search_term, tier).await
    }

    pub async fn clear_cache(&self) -> bool {
        self.cache.clear().await
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        self.controller.registry()
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn persistence(&self) -> &Arc<dyn PersistenceCollaborator> {
        &self.persistence
    }

    async fn cached(&self, request: &RecommendationRequest) -> Option<TierResult> {
        if request.skip_cache || !self.cache.is_enabled() {
            return None;
        }

        match self
            .cache
            .get(&request.user_id, &request.search_term, request.tier)
            .await
        {
            Some(hit) => {
                self.metrics.record_cache_hit();
                info!(
                    "Returning cached recommendation for: {}, tier: {}",
                    request.search_term, request.tier
                );
                Some(hit)
            }
            None => {
                self.metrics.record_cache_miss();
                None
            }
        }
    }

    /// Fill in stored feedback when the request carries none
    async fn prepare_query(&self, request: &RecommendationRequest) -> RecommendationQuery {
        let mut query = request.to_query();
        if query.feedback.is_empty() && self.persistence.is_enabled() {
            query.feedback = self.persistence.feedback_for(&request.user_id).await;
        }
        query
    }
}
