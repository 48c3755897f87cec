//! Provider registry for managing configured recommendation providers

use super::breaker::{BreakerSnapshot, CircuitBreaker};
use super::gateway::ProviderGateway;
use super::traits::{AnalysisProvider, EnrichmentProvider, EnrichmentStage, SearchProvider};
use crate::config::{BreakerSettings, ProviderConfig};
use crate::metrics::Metrics;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// A search provider and its gateway
#[derive(Clone)]
pub struct SearchEntry {
    pub provider: Arc<dyn SearchProvider>,
    pub gateway: Arc<ProviderGateway>,
}

/// An enrichment provider, the stage it runs in, and its gateway
#[derive(Clone)]
pub struct EnrichmentEntry {
    pub provider: Arc<dyn EnrichmentProvider>,
    pub stage: EnrichmentStage,
    pub gateway: Arc<ProviderGateway>,
}

/// An analysis provider and its gateway
#[derive(Clone)]
pub struct AnalysisEntry {
    pub provider: Arc<dyn AnalysisProvider>,
    pub gateway: Arc<ProviderGateway>,
}

/// Registry of providers, grouped by capability
///
/// Each provider name owns exactly one gateway, and so one breaker.
pub struct ProviderRegistry {
    search: Vec<SearchEntry>,
    enrichment: Vec<EnrichmentEntry>,
    analysis: Vec<AnalysisEntry>,
    gateways: HashMap<String, Arc<ProviderGateway>>,
    metrics: Arc<Metrics>,
    defaults: BreakerSettings,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new(defaults: BreakerSettings, metrics: Arc<Metrics>) -> Self {
        Self {
            search: Vec::new(),
            enrichment: Vec::new(),
            analysis: Vec::new(),
            gateways: HashMap::new(),
            metrics,
            defaults,
        }
    }

    /// Register a search provider
    pub fn register_search(&mut self, provider: Arc<dyn SearchProvider>, config: &ProviderConfig) {
        let gateway = self.gateway_for(provider.name(), config);
        self.search.push(SearchEntry { provider, gateway });
    }

    /// Register an enrichment provider for a stage
    pub fn register_enrichment(
        &mut self,
        provider: Arc<dyn EnrichmentProvider>,
        stage: EnrichmentStage,
        config: &ProviderConfig,
    ) {
        let gateway = self.gateway_for(provider.name(), config);
        self.enrichment.push(EnrichmentEntry {
            provider,
            stage,
            gateway,
        });
    }

    /// Register an analysis provider
    pub fn register_analysis(
        &mut self,
        provider: Arc<dyn AnalysisProvider>,
        config: &ProviderConfig,
    ) {
        let gateway = self.gateway_for(provider.name(), config);
        self.analysis.push(AnalysisEntry { provider, gateway });
    }

    pub fn search_providers(&self) -> &[SearchEntry] {
        &self.search
    }

    /// Enrichment providers for one stage, in registration order
    pub fn enrichment_providers(&self, stage: EnrichmentStage) -> Vec<EnrichmentEntry> {
        self.enrichment
            .iter()
            .filter(|entry| entry.stage == stage)
            .cloned()
            .collect()
    }

    pub fn analysis_providers(&self) -> &[AnalysisEntry] {
        &self.analysis
    }

    /// Get a gateway by provider name
    pub fn gateway(&self, name: &str) -> Option<&Arc<ProviderGateway>> {
        self.gateways.get(name)
    }

    /// Force one breaker back to CLOSED
    pub fn reset_breaker(&self, name: &str) -> bool {
        match self.gateways.get(name) {
            Some(gateway) => {
                gateway.breaker().reset();
                true
            }
            None => false,
        }
    }

    /// Force every breaker back to CLOSED
    pub fn reset_all(&self) {
        for gateway in self.gateways.values() {
            gateway.breaker().reset();
        }
    }

    /// Breaker snapshots sorted by provider name
    pub fn breaker_states(&self) -> Vec<BreakerSnapshot> {
        let mut states: Vec<_> = self.gateways.values().map(|g| g.snapshot()).collect();
        states.sort_by(|a, b| a.name.cmp(&b.name));
        states
    }

    /// Get all provider names
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.gateways.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Get number of distinct providers
    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }

    fn gateway_for(&mut self, name: &str, config: &ProviderConfig) -> Arc<ProviderGateway> {
        if let Some(existing) = self.gateways.get(name) {
            return existing.clone();
        }

        let breaker = CircuitBreaker::new(
            name,
            config.failure_threshold(&self.defaults),
            config.recovery_timeout(&self.defaults),
        );
        let timeout = config.call_timeout(&self.defaults);
        info!("Registered provider {} with {:?} call timeout", name, timeout);

        let gateway = Arc::new(ProviderGateway::new(
            name,
            breaker,
            timeout,
            self.metrics.clone(),
        ));
        self.gateways.insert(name.to_string(), gateway.clone());
        gateway
    }
}
