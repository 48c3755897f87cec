//! Provider loader for building the registry from configuration

use super::feedback::FeedbackValidator;
use super::http::{HttpAnalysisProvider, HttpEnrichmentProvider, HttpSearchProvider};
use super::registry::ProviderRegistry;
use super::traits::EnrichmentStage;
use crate::config::{Capability, ProviderConfig, Settings};
use crate::metrics::Metrics;
use crate::network::HttpClient;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Loader for initializing providers from configuration
pub struct ProviderLoader;

impl ProviderLoader {
    /// Load all enabled providers from settings
    ///
    /// Misconfigured providers are logged and skipped.
    pub fn load(
        settings: &Settings,
        client: HttpClient,
        metrics: Arc<Metrics>,
    ) -> Result<ProviderRegistry> {
        let mut registry = ProviderRegistry::new(settings.breaker.clone(), metrics);

        for config in &settings.providers {
            if config.disabled {
                info!("Skipping disabled provider: {}", config.name);
                continue;
            }

            match Self::register(&mut registry, config, &client) {
                Ok(()) => info!(
                    "Loaded provider: {} ({}, {:?})",
                    config.name, config.engine, config.capability
                ),
                Err(e) => warn!("Failed to load provider {}: {}", config.name, e),
            }
        }

        info!("Loaded {} providers", registry.len());
        Ok(registry)
    }

    fn register(
        registry: &mut ProviderRegistry,
        config: &ProviderConfig,
        client: &HttpClient,
    ) -> Result<()> {
        if config.name.trim().is_empty() {
            return Err(anyhow!("provider name is empty"));
        }

        match config.engine.as_str() {
            "http" => {
                let url = config
                    .endpoint
                    .clone()
                    .ok_or_else(|| anyhow!("http provider requires an endpoint"))?;
                let key = config.api_key.clone();
                let name = config.name.clone();

                match config.capability {
                    Capability::Search => registry.register_search(
                        Arc::new(HttpSearchProvider::new(name, url, key, client.clone())),
                        config,
                    ),
                    Capability::Enrichment => registry.register_enrichment(
                        Arc::new(HttpEnrichmentProvider::new(name, url, key, client.clone())),
                        EnrichmentStage::Standard,
                        config,
                    ),
                    Capability::CrossValidation => registry.register_enrichment(
                        Arc::new(HttpEnrichmentProvider::new(name, url, key, client.clone())),
                        EnrichmentStage::CrossValidation,
                        config,
                    ),
                    Capability::Analysis => registry.register_analysis(
                        Arc::new(HttpAnalysisProvider::new(name, url, key, client.clone())),
                        config,
                    ),
                }
            }
            "feedback" => {
                let stage = match config.capability {
                    Capability::Enrichment => EnrichmentStage::Standard,
                    Capability::CrossValidation => EnrichmentStage::CrossValidation,
                    other => {
                        return Err(anyhow!("feedback provider cannot serve {:?}", other));
                    }
                };
                registry.register_enrichment(
                    Arc::new(FeedbackValidator::new(config.name.clone())),
                    stage,
                    config,
                );
            }
            other => return Err(anyhow!("Unknown provider engine: {}", other)),
        }

        Ok(())
    }

    /// Get list of available provider engines
    pub fn available_engines() -> Vec<&'static str> {
        vec!["http", "feedback"]
    }
}
