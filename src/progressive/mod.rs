//! Progressive delivery of tier results
//!
//! The emitter runs the tier controller in its own task and streams one
//! event per completed stage. Every stream ends with exactly one event
//! whose `final` flag is set, even when the pipeline task fails.

use crate::error::Error;
use crate::results::TierResult;
use crate::tiers::{RecommendationQuery, Tier, TierController};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Buffer between the pipeline task and the emitter
const PROGRESS_BUFFER: usize = 4;

/// One step of a progressive response
///
/// Consumers replace their state with the latest event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationEvent {
    pub request_id: Uuid,
    /// Position of the event in its stream, starting at zero
    pub sequence: u32,
    pub tier: Tier,
    #[serde(rename = "final")]
    pub is_final: bool,
    pub timestamp: DateTime<Utc>,
    pub result: TierResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecommendationEvent {
    pub fn new(request_id: Uuid, sequence: u32, result: TierResult, is_final: bool) -> Self {
        Self {
            request_id,
            sequence,
            tier: result.tier,
            is_final,
            timestamp: Utc::now(),
            error: if is_final {
                result.metadata.error.clone()
            } else {
                None
            },
            result,
        }
    }
}

/// Build the terminal event from the pipeline outcome
///
/// A failed pipeline falls back to the most complete partial result seen,
/// or an empty FAST result.
fn terminal_event(
    request_id: Uuid,
    sequence: u32,
    outcome: Result<TierResult, Error>,
    last: Option<TierResult>,
    search_term: &str,
) -> RecommendationEvent {
    match outcome {
        Ok(result) => RecommendationEvent::new(request_id, sequence, result, true),
        Err(e) => {
            warn!("Recommendation pipeline for '{}' failed: {}", search_term, e);
            let mut result = last.unwrap_or_else(|| TierResult::empty(Tier::Fast, search_term));
            result.metadata.error = Some(e.to_string());
            RecommendationEvent::new(request_id, sequence, result, true)
        }
    }
}

/// Forward partial results of a running pipeline task, then its outcome
async fn relay(
    request_id: Uuid,
    search_term: &str,
    mut progress: mpsc::Receiver<TierResult>,
    task: JoinHandle<TierResult>,
    events: mpsc::Sender<RecommendationEvent>,
) {
    let mut sequence = 0u32;
    let mut last = None;

    while let Some(partial) = progress.recv().await {
        let event = RecommendationEvent::new(request_id, sequence, partial.clone(), false);
        if events.send(event).await.is_err() {
            debug!("Event receiver for {} dropped", request_id);
            return;
        }
        sequence += 1;
        last = Some(partial);
    }

    let outcome = task.await.map_err(Error::from);
    let event = terminal_event(request_id, sequence, outcome, last, search_term);
    if events.send(event).await.is_err() {
        debug!("Event receiver for {} dropped before final event", request_id);
    }
}

/// Streams intermediate and final tier results
#[derive(Clone)]
pub struct ProgressiveEmitter {
    controller: Arc<TierController>,
}

impl ProgressiveEmitter {
    pub fn new(controller: Arc<TierController>) -> Self {
        Self { controller }
    }

    /// Run `query` and send its events to `events`
    ///
    /// Returns early, without waiting for the pipeline, when the receiver
    /// is dropped.
    pub async fn emit(&self, query: RecommendationQuery, events: mpsc::Sender<RecommendationEvent>) {
        let (progress_tx, progress_rx) = mpsc::channel(PROGRESS_BUFFER);

        let controller = self.controller.clone();
        let task_query = query.clone();
        let task = tokio::spawn(async move {
            controller
                .run_staged(&task_query, Some(&progress_tx))
                .await
        });

        relay(Uuid::new_v4(), &query.search_term, progress_rx, task, events).await;
    }

    /// Spawn [`emit`](Self::emit) and return the event receiver
    pub fn stream(&self, query: RecommendationQuery) -> mpsc::Receiver<RecommendationEvent> {
        let (tx, rx) = mpsc::channel(PROGRESS_BUFFER);
        let emitter = self.clone();
        tokio::spawn(async move { emitter.emit(query, tx).await });
        rx
    }
}
