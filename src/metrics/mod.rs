//! Metrics collection module
//!
//! Tracks provider call outcomes, latency and cache effectiveness.

use crate::results::FallbackReason;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Number of latency samples kept per provider
const LATENCY_WINDOW: usize = 100;

#[derive(Debug, Default)]
struct ProviderCounters {
    calls: u64,
    successes: u64,
    fallbacks: HashMap<FallbackReason, u64>,
    response_times: VecDeque<u64>,
}

/// Shared metrics collector
#[derive(Debug, Default)]
pub struct Metrics {
    total_requests: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    providers: RwLock<HashMap<String, ProviderCounters>>,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment total request count
    pub fn inc_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a gateway call attempt
    pub fn record_call(&self, provider: &str) {
        self.write().entry(provider.to_string()).or_default().calls += 1;
    }

    /// Record a successful call and its latency
    pub fn record_success(&self, provider: &str, time_ms: u64) {
        let mut providers = self.write();
        let counters = providers.entry(provider.to_string()).or_default();
        counters.successes += 1;
        push_latency(counters, time_ms);
    }

    /// Record a fallback; latency is only kept when the provider was reached
    pub fn record_fallback(&self, provider: &str, reason: FallbackReason, time_ms: Option<u64>) {
        let mut providers = self.write();
        let counters = providers.entry(provider.to_string()).or_default();
        *counters.fallbacks.entry(reason).or_insert(0) += 1;
        if let Some(time_ms) = time_ms {
            push_latency(counters, time_ms);
        }
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    /// Statistics for one provider
    pub fn provider_stats(&self, provider: &str) -> Option<ProviderStats> {
        self.read().get(provider).map(ProviderStats::from)
    }

    /// Statistics for all providers seen so far
    pub fn all_provider_stats(&self) -> HashMap<String, ProviderStats> {
        self.read()
            .iter()
            .map(|(name, counters)| (name.clone(), ProviderStats::from(counters)))
            .collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, ProviderCounters>> {
        self.providers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, ProviderCounters>> {
        self.providers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn push_latency(counters: &mut ProviderCounters, time_ms: u64) {
    if counters.response_times.len() >= LATENCY_WINDOW {
        counters.response_times.pop_front();
    }
    counters.response_times.push_back(time_ms);
}

/// Statistics for a single provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStats {
    pub calls: u64,
    pub successes: u64,
    pub fallbacks: u64,
    pub circuit_open: u64,
    pub avg_response_time: Option<u64>,
    /// Percentage of calls that succeeded
    pub reliability: f64,
}

impl From<&ProviderCounters> for ProviderStats {
    fn from(counters: &ProviderCounters) -> Self {
        let fallbacks = counters.fallbacks.values().sum();
        let avg_response_time = if counters.response_times.is_empty() {
            None
        } else {
            Some(counters.response_times.iter().sum::<u64>() / counters.response_times.len() as u64)
        };
        let reliability = if counters.calls == 0 {
            100.0
        } else {
            (counters.successes as f64 / counters.calls as f64) * 100.0
        };

        Self {
            calls: counters.calls,
            successes: counters.successes,
            fallbacks,
            circuit_open: counters
                .fallbacks
                .get(&FallbackReason::CircuitOpen)
                .copied()
                .unwrap_or(0),
            avg_response_time,
            reliability,
        }
    }
}
