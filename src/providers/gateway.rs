//! Guarded provider calls
//!
//! Every outbound provider call goes through a [`ProviderGateway`], which
//! applies the provider's circuit breaker and call timeout and substitutes
//! a fallback value for any failure. Callers never see provider errors.

use super::breaker::{BreakerSnapshot, CircuitBreaker, CircuitState};
use crate::error::{Error, Result};
use crate::metrics::Metrics;
use crate::results::FallbackReason;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// How a gateway call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Success,
    Fallback(FallbackReason),
}

/// Value produced by a gateway call plus how it was obtained
#[derive(Debug, Clone)]
pub struct GatewayOutcome<T> {
    pub value: T,
    pub status: CallStatus,
    pub elapsed: Duration,
}

impl<T> GatewayOutcome<T> {
    pub fn is_success(&self) -> bool {
        self.status == CallStatus::Success
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self.status {
            CallStatus::Success => None,
            CallStatus::Fallback(reason) => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> GatewayOutcome<U> {
        GatewayOutcome {
            value: f(self.value),
            status: self.status,
            elapsed: self.elapsed,
        }
    }
}

/// Circuit breaker plus timeout around one provider
#[derive(Debug)]
pub struct ProviderGateway {
    name: String,
    breaker: CircuitBreaker,
    timeout: Duration,
    metrics: Arc<Metrics>,
}

impl ProviderGateway {
    pub fn new(
        name: impl Into<String>,
        breaker: CircuitBreaker,
        timeout: Duration,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            name: name.into(),
            breaker,
            timeout,
            metrics,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn state(&self) -> CircuitState {
        self.breaker.state()
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        self.breaker.snapshot()
    }

    /// Call the provider with the gateway's own timeout
    pub async fn call<T, F, Fut, D>(&self, call: F, fallback: D) -> GatewayOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
        D: FnOnce() -> T,
    {
        self.call_with_timeout(self.timeout, call, fallback).await
    }

    /// Call the provider, returning `fallback()` on any failure
    ///
    /// An open breaker short-circuits: `call` is never invoked.
    pub async fn call_with_timeout<T, F, Fut, D>(
        &self,
        limit: Duration,
        call: F,
        fallback: D,
    ) -> GatewayOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
        D: FnOnce() -> T,
    {
        self.metrics.record_call(&self.name);
        let start = Instant::now();

        if !self.breaker.allow_request() {
            debug!("Circuit {} is OPEN, using fallback", self.name);
            self.metrics
                .record_fallback(&self.name, FallbackReason::CircuitOpen, None);
            return GatewayOutcome {
                value: fallback(),
                status: CallStatus::Fallback(FallbackReason::CircuitOpen),
                elapsed: start.elapsed(),
            };
        }

        let result = timeout(limit, call()).await;
        let elapsed = start.elapsed();
        let time_ms = elapsed.as_millis() as u64;

        let reason = match result {
            Ok(Ok(value)) => {
                self.breaker.record_success();
                self.metrics.record_success(&self.name, time_ms);
                debug!("Provider {} answered in {:?}", self.name, elapsed);
                return GatewayOutcome {
                    value,
                    status: CallStatus::Success,
                    elapsed,
                };
            }
            Ok(Err(Error::Aggregation(detail))) => {
                warn!("Malformed payload from {}: {}", self.name, detail);
                FallbackReason::Malformed
            }
            Ok(Err(Error::ProviderTimeout(_))) | Err(_) => {
                warn!("Provider {} timed out after {:?}", self.name, limit);
                FallbackReason::Timeout
            }
            Ok(Err(e)) => {
                warn!("Provider {} failed: {}", self.name, e);
                FallbackReason::Failure
            }
        };

        self.breaker.record_failure();
        self.metrics
            .record_fallback(&self.name, reason, Some(time_ms));

        GatewayOutcome {
            value: fallback(),
            status: CallStatus::Fallback(reason),
            elapsed,
        }
    }
}
