//! Recommendation providers
//!
//! Providers are grouped by capability. Every call is wrapped in a
//! [`ProviderGateway`] carrying a circuit breaker and a call timeout.

mod breaker;
mod feedback;
mod gateway;
mod http;
mod loader;
mod registry;
mod traits;

pub use breaker::{BreakerSnapshot, CircuitBreaker, CircuitState};
pub use feedback::FeedbackValidator;
pub use gateway::{CallStatus, GatewayOutcome, ProviderGateway};
pub use http::{HttpAnalysisProvider, HttpEnrichmentProvider, HttpSearchProvider};
pub use loader::ProviderLoader;
pub use registry::{AnalysisEntry, EnrichmentEntry, ProviderRegistry, SearchEntry};
pub use traits::{
    AnalysisProvider, EnrichmentProvider, EnrichmentRequest, EnrichmentStage, SearchPayload,
    SearchProvider,
};
