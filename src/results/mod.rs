//! Recommendation data model and result aggregation
//!
//! Defines the items exchanged with providers and the operations that
//! combine them: canonical keys, deduplication, diversity caps, quick
//! scoring and enrichment merging.

mod aggregator;
mod canonical;
mod types;

pub use aggregator::*;
pub use canonical::CanonicalKey;
pub use types::*;
