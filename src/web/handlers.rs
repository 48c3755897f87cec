//! HTTP request handlers

use super::state::AppState;
use crate::progressive::RecommendationEvent;
use crate::results::{FeedbackItem, RecommendationItem};
use crate::service::RecommendationRequest;
use crate::tiers::Tier;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream::{self, Stream};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::info;

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "instance": state.instance_name(),
        "providers": state.service.registry().len(),
    }))
}

/// Recommendation handler
///
/// Responds with a JSON `TierResult`, or with an event stream when the
/// request asks for progressive delivery.
pub async fn recommendations(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> Response {
    if request.search_term.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "search_term must not be empty");
    }
    if request.user_id.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "user_id must not be empty");
    }

    info!(
        "Recommendation request received: {} ({})",
        request.search_term, request.tier
    );

    if request.progressive {
        let rx = state.service.stream_recommendations(&request).await;
        return event_stream(rx).into_response();
    }

    let result = state.service.get_recommendations(&request).await;
    Json(result).into_response()
}

fn event_stream(
    rx: mpsc::Receiver<RecommendationEvent>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let events = stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        let kind = if event.is_final { "final" } else { "partial" };
        Some((Event::default().event(kind).json_data(&event), rx))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
pub struct InvalidateParams {
    pub user_id: Option<String>,
    pub search_term: Option<String>,
    #[serde(default)]
    pub tier: Tier,
    /// Drop every entry instead of a single one
    #[serde(default)]
    pub all: bool,
}

/// Cache invalidation handler
pub async fn invalidate_cache(
    State(state): State<AppState>,
    Json(params): Json<InvalidateParams>,
) -> Response {
    if params.all {
        let cleared = state.service.clear_cache().await;
        return Json(json!({ "cleared": cleared })).into_response();
    }

    match (params.user_id, params.search_term) {
        (Some(user_id), Some(search_term)) => {
            let invalidated = state
                .service
                .invalidate_cache(&user_id, &search_term, params.tier)
                .await;
            Json(json!({ "invalidated": invalidated })).into_response()
        }
        _ => error_response(
            StatusCode::BAD_REQUEST,
            "user_id and search_term are required unless all=true",
        ),
    }
}

/// Breaker states handler
pub async fn breakers(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.service.registry().breaker_states())
}

#[derive(Debug, Deserialize)]
pub struct ResetParams {
    pub provider: Option<String>,
}

/// Reset one breaker, or all of them when no provider is named
pub async fn reset_breakers(
    State(state): State<AppState>,
    params: Option<Json<ResetParams>>,
) -> Response {
    let registry = state.service.registry();

    match params.and_then(|Json(p)| p.provider) {
        Some(name) => {
            if !registry.reset_breaker(&name) {
                return error_response(
                    StatusCode::NOT_FOUND,
                    format!("unknown provider: {}", name),
                );
            }
        }
        None => registry.reset_all(),
    }

    Json(registry.breaker_states()).into_response()
}

/// Metrics handler
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let metrics = state.service.metrics();
    Json(json!({
        "totalRequests": metrics.total_requests(),
        "cacheHits": metrics.cache_hits(),
        "cacheMisses": metrics.cache_misses(),
        "providers": metrics.all_provider_stats(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SaveItemParams {
    pub user_id: String,
    pub item: RecommendationItem,
}

pub async fn save_item(
    State(state): State<AppState>,
    Json(params): Json<SaveItemParams>,
) -> impl IntoResponse {
    let saved = state
        .service
        .persistence()
        .save_item(&params.user_id, &params.item)
        .await;
    Json(json!({ "saved": saved }))
}

pub async fn saved_items(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    Json(state.service.persistence().saved_items(&user_id).await)
}

pub async fn remove_item(
    State(state): State<AppState>,
    Path((user_id, item_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let removed = state
        .service
        .persistence()
        .remove_item(&user_id, &item_id)
        .await;
    Json(json!({ "removed": removed }))
}

#[derive(Debug, Deserialize)]
pub struct FeedbackParams {
    pub user_id: String,
    #[serde(flatten)]
    pub feedback: FeedbackItem,
}

pub async fn record_feedback(
    State(state): State<AppState>,
    Json(params): Json<FeedbackParams>,
) -> impl IntoResponse {
    let recorded = state
        .service
        .persistence()
        .record_feedback(&params.user_id, params.feedback)
        .await;
    Json(json!({ "recorded": recorded }))
}
