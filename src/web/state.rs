//! Application state shared across handlers

use crate::config::Settings;
use crate::providers::ProviderRegistry;
use crate::service::RecommendationService;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Recommendation pipeline
    pub service: Arc<RecommendationService>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, registry: ProviderRegistry) -> Self {
        let service = Arc::new(RecommendationService::from_settings(&settings, registry));
        Self {
            settings: Arc::new(settings),
            service,
        }
    }

    /// Wrap an already built service
    pub fn with_service(settings: Settings, service: RecommendationService) -> Self {
        Self {
            settings: Arc::new(settings),
            service: Arc::new(service),
        }
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }
}
