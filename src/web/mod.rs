//! Web server module
//!
//! Thin HTTP transport over the recommendation service.

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryStore, ResponseCache};
    use crate::config::{BreakerSettings, ProviderConfig, Settings};
    use crate::error::Result;
    use crate::metrics::Metrics;
    use crate::persistence::InMemoryPersistence;
    use crate::providers::{ProviderRegistry, SearchPayload, SearchProvider};
    use crate::results::{RecommendationItem, ResultAggregator, TierResult};
    use crate::service::RecommendationService;
    use crate::tiers::{StageDeadlines, TierController};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;

    struct Books;

    #[async_trait]
    impl SearchProvider for Books {
        fn name(&self) -> &str {
            "books"
        }

        async fn search(&self, _term: &str) -> Result<SearchPayload> {
            Ok(SearchPayload::with_books(vec![
                RecommendationItem::new("1", "Dune", "Frank Herbert").with_score(0.7),
                RecommendationItem::new("2", "Emma", "Jane Austen").with_score(0.4),
            ]))
        }
    }

    async fn spawn_app() -> String {
        let mut registry = ProviderRegistry::new(BreakerSettings::default(), Arc::new(Metrics::new()));
        registry.register_search(
            Arc::new(Books),
            &ProviderConfig {
                name: "books".to_string(),
                ..Default::default()
            },
        );
        let deadlines = StageDeadlines {
            fast: Duration::from_millis(500),
            standard: Duration::from_millis(500),
            comprehensive: Duration::from_millis(500),
        };
        let controller = Arc::new(TierController::new(
            Arc::new(registry),
            deadlines,
            ResultAggregator::default(),
        ));
        let service = RecommendationService::new(
            controller,
            ResponseCache::new(Arc::new(MemoryStore::default()), Duration::from_secs(60)),
            Arc::new(InMemoryPersistence::new()),
        );
        let app = create_router(AppState::with_service(Settings::default(), service));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_json_recommendations() {
        let base = spawn_app().await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/api/recommendations", base))
            .json(&json!({"user_id": "u1", "search_term": "dune", "tier": "fast"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let result: TierResult = response.json().await.unwrap();
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.top_book.unwrap().title, "Dune");
    }

    #[tokio::test]
    async fn test_empty_term_is_rejected() {
        let base = spawn_app().await;
        let response = reqwest::Client::new()
            .post(format!("{}/api/recommendations", base))
            .json(&json!({"user_id": "u1", "search_term": "  "}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_progressive_stream() {
        let base = spawn_app().await;
        let response = reqwest::Client::new()
            .post(format!("{}/api/recommendations", base))
            .json(&json!({
                "user_id": "u1",
                "search_term": "dune",
                "tier": "comprehensive",
                "progressive": true
            }))
            .send()
            .await
            .unwrap();

        let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/event-stream"));

        let body = response.text().await.unwrap();
        assert_eq!(body.matches("event: partial").count(), 2);
        assert_eq!(body.matches("event: final").count(), 1);
    }

    #[tokio::test]
    async fn test_breaker_reset_and_cache_invalidate() {
        let base = spawn_app().await;
        let client = reqwest::Client::new();

        let states: Value = client
            .post(format!("{}/api/breakers/reset", base))
            .json(&json!({"provider": "books"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(states[0]["state"], "CLOSED");

        let missing = client
            .post(format!("{}/api/breakers/reset", base))
            .json(&json!({"provider": "nope"}))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), 404);

        let cleared: Value = client
            .post(format!("{}/api/cache/invalidate", base))
            .json(&json!({"all": true}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(cleared["cleared"], true);
    }

    #[tokio::test]
    async fn test_saved_items_and_feedback() {
        let base = spawn_app().await;
        let client = reqwest::Client::new();

        let saved: Value = client
            .post(format!("{}/api/saved", base))
            .json(&json!({"user_id": "u1", "item": {"id": "1", "title": "Dune", "author": "Frank Herbert"}}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(saved["saved"], true);

        let items: Vec<RecommendationItem> = client
            .get(format!("{}/api/saved/u1", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(items.len(), 1);

        let recorded: Value = client
            .post(format!("{}/api/feedback", base))
            .json(&json!({"user_id": "u1", "category": "novel", "rating": "positive"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(recorded["recorded"], true);
    }
}
