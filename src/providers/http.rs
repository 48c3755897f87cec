//! Remote providers speaking a small JSON-over-HTTP protocol
//!
//! Every call is a `POST` to the configured endpoint:
//!
//! | capability | request body                          | response body                  |
//! |------------|---------------------------------------|--------------------------------|
//! | search     | `{term}`                              | `{books, reviews, social}`     |
//! | enrichment | `{term, items, history, feedback}`    | `{items}`                      |
//! | analysis   | `{term}`                              | `{summary, themes, context}`   |

use super::traits::{
    AnalysisProvider, EnrichmentProvider, EnrichmentRequest, SearchPayload, SearchProvider,
};
use crate::error::{Error, Result};
use crate::network::{HttpClient, ProviderResponse};
use crate::results::{Analysis, EnrichedItem, RecommendationItem};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct TermRequest<'a> {
    term: &'a str,
}

#[derive(Deserialize)]
struct EnrichmentResponse {
    items: Vec<RecommendationItem>,
}

/// Second view of an enrichment response telling whether each item
/// actually carried a score
#[derive(Deserialize)]
struct ScoreReports {
    items: Vec<ScoreReport>,
}

#[derive(Deserialize)]
struct ScoreReport {
    #[serde(default, rename = "matchScore", alias = "match_score")]
    match_score: Option<f64>,
}

/// Connection details shared by the HTTP providers
#[derive(Clone)]
struct Endpoint {
    name: String,
    url: String,
    api_key: Option<String>,
    client: HttpClient,
}

impl Endpoint {
    async fn post<B: Serialize + ?Sized>(&self, body: &B) -> Result<ProviderResponse> {
        let response = self
            .client
            .post_json(&self.url, body, self.api_key.as_deref())
            .await?;

        if !response.is_success() {
            return Err(Error::ProviderFailure(format!(
                "{} returned HTTP {}",
                self.name, response.status
            )));
        }
        Ok(response)
    }
}

/// Search provider backed by an HTTP endpoint
pub struct HttpSearchProvider {
    endpoint: Endpoint,
}

impl HttpSearchProvider {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        api_key: Option<String>,
        client: HttpClient,
    ) -> Self {
        Self {
            endpoint: Endpoint {
                name: name.into(),
                url: url.into(),
                api_key,
                client,
            },
        }
    }
}

#[async_trait]
impl SearchProvider for HttpSearchProvider {
    fn name(&self) -> &str {
        &self.endpoint.name
    }

    async fn search(&self, term: &str) -> Result<SearchPayload> {
        self.endpoint.post(&TermRequest { term }).await?.json()
    }
}

/// Enrichment provider backed by an HTTP endpoint
pub struct HttpEnrichmentProvider {
    endpoint: Endpoint,
}

impl HttpEnrichmentProvider {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        api_key: Option<String>,
        client: HttpClient,
    ) -> Self {
        Self {
            endpoint: Endpoint {
                name: name.into(),
                url: url.into(),
                api_key,
                client,
            },
        }
    }
}

#[async_trait]
impl EnrichmentProvider for HttpEnrichmentProvider {
    fn name(&self) -> &str {
        &self.endpoint.name
    }

    async fn enrich(&self, request: &EnrichmentRequest) -> Result<Vec<EnrichedItem>> {
        let response = self.endpoint.post(request).await?;
        let decoded: EnrichmentResponse = response.json()?;
        let reports: ScoreReports = response.json()?;

        Ok(decoded
            .items
            .into_iter()
            .zip(reports.items)
            .map(|(item, report)| EnrichedItem {
                item,
                score: report.match_score,
            })
            .collect())
    }
}

/// Analysis provider backed by an HTTP endpoint
pub struct HttpAnalysisProvider {
    endpoint: Endpoint,
}

impl HttpAnalysisProvider {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        api_key: Option<String>,
        client: HttpClient,
    ) -> Self {
        Self {
            endpoint: Endpoint {
                name: name.into(),
                url: url.into(),
                api_key,
                client,
            },
        }
    }
}

#[async_trait]
impl AnalysisProvider for HttpAnalysisProvider {
    fn name(&self) -> &str {
        &self.endpoint.name
    }

    async fn analyze(&self, term: &str) -> Result<Analysis> {
        let mut analysis: Analysis = self.endpoint.post(&TermRequest { term }).await?.json()?;
        if analysis.provider.is_empty() {
            analysis.provider = self.endpoint.name.clone();
        }
        analysis.placeholder = false;
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock(server: &MockServer, route: &str, status: u16, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_search_parses_payload() {
        let server = MockServer::start().await;
        mock(
            &server,
            "/search",
            200,
            json!({
                "books": [{"id": "b1", "title": "Dune", "author": "Frank Herbert", "match_score": 0.8}],
                "reviews": [{"title": "A classic", "source": "NYT", "date": "2023-09-15", "link": "https://nyt.example"}]
            }),
        )
        .await;

        let provider = HttpSearchProvider::new(
            "perplexity",
            format!("{}/search", server.uri()),
            None,
            HttpClient::new().unwrap(),
        );
        let payload = provider.search("dune").await.unwrap();

        assert_eq!(payload.books[0].title, "Dune");
        assert_eq!(payload.books[0].match_score, 0.8);
        assert_eq!(payload.reviews[0].url, "https://nyt.example");
        assert!(payload.social.is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status_is_failure() {
        let server = MockServer::start().await;
        mock(&server, "/search", 503, json!({"error": "overloaded"})).await;

        let provider = HttpSearchProvider::new(
            "perplexity",
            format!("{}/search", server.uri()),
            None,
            HttpClient::new().unwrap(),
        );
        let err = provider.search("dune").await.unwrap_err();
        assert!(matches!(err, Error::ProviderFailure(_)));
    }

    #[tokio::test]
    async fn test_enrichment_sends_history_and_feedback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/enrich"))
            .and(body_partial_json(json!({"term": "dune", "history": ["foundation"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"id": "b1", "title": "Dune", "author": "Frank Herbert", "category": "novel"}]
            })))
            .mount(&server)
            .await;

        let provider = HttpEnrichmentProvider::new(
            "claude",
            format!("{}/enrich", server.uri()),
            Some("key".to_string()),
            HttpClient::new().unwrap(),
        );
        let mut request = EnrichmentRequest::new(
            "dune",
            vec![RecommendationItem::new("b1", "Dune", "Frank Herbert")],
        );
        request.history = vec!["foundation".to_string()];

        let items = provider.enrich(&request).await.unwrap();
        assert_eq!(items[0].item.category, "novel");
        assert_eq!(items[0].score, None);
    }

    #[tokio::test]
    async fn test_enrichment_reports_only_sent_scores() {
        let server = MockServer::start().await;
        mock(
            &server,
            "/enrich",
            200,
            json!({"items": [
                {"id": "b1", "title": "Dune", "author": "Frank Herbert", "genre": "Science Fiction"},
                {"id": "b2", "title": "Emma", "author": "Jane Austen", "matchScore": 0.3},
                {"id": "b3", "title": "Solaris", "author": "Stanislaw Lem", "match_score": 0.6}
            ]}),
        )
        .await;

        let provider = HttpEnrichmentProvider::new(
            "claude",
            format!("{}/enrich", server.uri()),
            None,
            HttpClient::new().unwrap(),
        );
        let request = EnrichmentRequest::new("dune", Vec::new());
        let items = provider.enrich(&request).await.unwrap();

        let scores: Vec<_> = items.iter().map(|i| i.score).collect();
        assert_eq!(scores, vec![None, Some(0.3), Some(0.6)]);
        assert_eq!(items[0].item.genre.as_deref(), Some("Science Fiction"));
    }

    #[tokio::test]
    async fn test_wrong_shape_is_aggregation() {
        let server = MockServer::start().await;
        mock(&server, "/enrich", 200, json!({"results": []})).await;

        let provider = HttpEnrichmentProvider::new(
            "claude",
            format!("{}/enrich", server.uri()),
            None,
            HttpClient::new().unwrap(),
        );
        let request = EnrichmentRequest::new("dune", Vec::new());
        let err = provider.enrich(&request).await.unwrap_err();
        assert!(matches!(err, Error::Aggregation(_)));
    }

    #[tokio::test]
    async fn test_analysis_fills_provider_name() {
        let server = MockServer::start().await;
        mock(
            &server,
            "/analyze",
            200,
            json!({"analysis": "Desert planet politics", "themes": ["ecology"]}),
        )
        .await;

        let provider = HttpAnalysisProvider::new(
            "openai",
            format!("{}/analyze", server.uri()),
            None,
            HttpClient::new().unwrap(),
        );
        let analysis = provider.analyze("dune").await.unwrap();
        assert_eq!(analysis.provider, "openai");
        assert_eq!(analysis.summary, "Desert planet politics");
        assert!(!analysis.placeholder);
    }
}
