//! Settings structures for LitFinder-RS configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Main settings structure, loaded from settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub outgoing: OutgoingSettings,
    pub tiers: TierSettings,
    pub ranking: RankingSettings,
    pub breaker: BreakerSettings,
    pub cache: CacheSettings,
    pub persistence: PersistenceSettings,
    pub providers: Vec<ProviderConfig>,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with environment variables (LITFINDER_* prefix)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("LITFINDER_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Ok(val) = std::env::var("LITFINDER_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("LITFINDER_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Ok(val) = std::env::var("LITFINDER_CACHE_TTL") {
            if let Ok(ttl) = val.parse() {
                self.cache.ttl = ttl;
            }
        }
        if let Ok(val) = std::env::var("LITFINDER_PERSISTENCE_ENABLED") {
            self.persistence.enabled = val.parse().unwrap_or(false);
        }
    }

    /// Get provider config by name
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Get all enabled providers
    pub fn enabled_providers(&self) -> Vec<&ProviderConfig> {
        self.providers.iter().filter(|p| !p.disabled).collect()
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Instance name reported in logs
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "LitFinder".to_string(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8787,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Pool max idle connections per host
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 15.0,
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Stage deadlines in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TierSettings {
    pub fast_deadline: f64,
    pub standard_deadline: f64,
    pub comprehensive_deadline: f64,
}

impl Default for TierSettings {
    fn default() -> Self {
        Self {
            fast_deadline: 4.0,
            standard_deadline: 15.0,
            comprehensive_deadline: 40.0,
        }
    }
}

/// Ranking and diversity limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingSettings {
    pub max_recommendations: usize,
    pub max_items_per_author: usize,
    pub max_items_per_genre: usize,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            max_recommendations: 10,
            max_items_per_author: 3,
            max_items_per_genre: 3,
        }
    }
}

/// Circuit breaker defaults applied to every provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerSettings {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,
    /// Seconds before an open circuit lets a trial call through
    pub recovery_timeout: f64,
    /// Per-call timeout in seconds
    pub call_timeout: f64,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: 60.0,
            call_timeout: 15.0,
        }
    }
}

/// Response cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    /// Entry time-to-live in seconds
    pub ttl: u64,
    pub max_capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: 3600,
            max_capacity: 1000,
        }
    }
}

/// Persistence collaborator toggle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceSettings {
    pub enabled: bool,
}

/// Capability a provider is registered for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    #[default]
    Search,
    Enrichment,
    CrossValidation,
    Analysis,
}

/// Individual provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider name (unique identifier)
    pub name: String,
    /// Implementation to use (`http`, `feedback`)
    pub engine: String,
    /// Capability the provider serves
    pub capability: Capability,
    /// Endpoint for HTTP providers
    pub endpoint: Option<String>,
    /// API key if required
    pub api_key: Option<String>,
    /// Whether provider is disabled
    pub disabled: bool,
    /// Per-call timeout override in seconds
    pub timeout: Option<f64>,
    /// Failure threshold override
    pub failure_threshold: Option<u32>,
    /// Recovery timeout override in seconds
    pub recovery_timeout: Option<f64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            engine: "http".to_string(),
            capability: Capability::Search,
            endpoint: None,
            api_key: None,
            disabled: false,
            timeout: None,
            failure_threshold: None,
            recovery_timeout: None,
        }
    }
}

impl ProviderConfig {
    /// Effective call timeout
    pub fn call_timeout(&self, defaults: &BreakerSettings) -> Duration {
        secs(self.timeout.unwrap_or(defaults.call_timeout))
    }

    /// Effective failure threshold
    pub fn failure_threshold(&self, defaults: &BreakerSettings) -> u32 {
        self.failure_threshold.unwrap_or(defaults.failure_threshold).max(1)
    }

    /// Effective recovery timeout
    pub fn recovery_timeout(&self, defaults: &BreakerSettings) -> Duration {
        secs(self.recovery_timeout.unwrap_or(defaults.recovery_timeout))
    }
}

/// Longest duration a setting may express (30 days)
const MAX_SECS: f64 = 30.0 * 24.0 * 3600.0;

/// Seconds to a duration
///
/// Negative or NaN values become zero; anything larger than 30 days,
/// infinity included, is capped.
pub fn secs(value: f64) -> Duration {
    if value.is_nan() || value <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(value.min(MAX_SECS)).unwrap_or(Duration::ZERO)
}
