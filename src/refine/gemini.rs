//! Gemini `generateContent` refiner.

use crate::error::{Result, SignStreamError};
use crate::refine::refiner::{Refiner, refinement_prompt};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Public Gemini API base URL.
pub const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Extract the first candidate's text from a `generateContent` response body.
fn parse_response(body: &str) -> Result<String> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| SignStreamError::Refinement {
            message: format!("unexpected Gemini response: {e}"),
        })?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        return Err(SignStreamError::Refinement {
            message: "Gemini returned no text".to_string(),
        });
    }
    Ok(text.to_string())
}

/// Refiner backed by Google's Gemini API.
pub struct GeminiRefiner {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiRefiner {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SignStreamError::Refinement {
                message: format!("HTTP client init: {e}"),
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            endpoint: GEMINI_ENDPOINT.to_string(),
        })
    }

    /// Build from the `GEMINI_API_KEY` environment variable.
    pub fn from_env(model: &str, timeout: Duration) -> Result<Self> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.is_empty() => Self::new(&key, model, timeout),
            _ => Err(SignStreamError::ConfigInvalidValue {
                key: API_KEY_ENV.to_string(),
                message: "not set".to_string(),
            }),
        }
    }

    /// Point the refiner at another API base URL.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    /// Request URL. The API key travels in a header so it never shows up in
    /// transport errors or logs.
    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl Refiner for GeminiRefiner {
    async fn refine(&self, raw: &str) -> Result<String> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": refinement_prompt(raw) }] }]
        });

        let response = self
            .client
            .post(self.url())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, &self.api_key)
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| SignStreamError::Refinement {
                message: format!("request failed: {}", e.without_url()),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| SignStreamError::Refinement {
            message: format!("reading response: {}", e.without_url()),
        })?;

        if !status.is_success() {
            return Err(SignStreamError::Refinement {
                message: format!("HTTP {status}: {}", text.chars().take(200).collect::<String>()),
            });
        }

        parse_response(&text)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::routing::post;

    #[test]
    fn parse_response_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Hello, "},{"text":"friend.\n"}]}}]}"#;
        assert_eq!(parse_response(body).unwrap(), "Hello, friend.");
    }

    #[test]
    fn parse_response_without_candidates_errors() {
        let result = parse_response(r#"{"candidates":[]}"#);
        assert!(matches!(result, Err(SignStreamError::Refinement { .. })));
    }

    #[test]
    fn parse_response_rejects_non_json() {
        assert!(parse_response("<html>").is_err());
    }

    #[test]
    fn url_names_model_but_not_key() {
        let refiner = GeminiRefiner::new("k123", "gemini-pro", Duration::from_secs(5))
            .unwrap()
            .with_endpoint("http://localhost:9/");
        assert_eq!(
            refiner.url(),
            "http://localhost:9/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[tokio::test]
    async fn transport_error_does_not_leak_key() {
        let refiner = GeminiRefiner::new("SECRETKEY123", "gemini-pro", Duration::from_secs(2))
            .unwrap()
            .with_endpoint("http://127.0.0.1:1");

        let err = refiner.refine("hello").await.unwrap_err();
        assert!(matches!(err, SignStreamError::Refinement { .. }));
        assert!(!err.to_string().contains("SECRETKEY123"), "got: {err}");
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn refine_round_trips_through_http() {
        let router = Router::new().route(
            "/v1beta/models/{action}",
            post(|headers: axum::http::HeaderMap, body: String| async move {
                assert_eq!(headers[API_KEY_HEADER], "test");
                assert!(body.contains("hello friend"));
                r#"{"candidates":[{"content":{"parts":[{"text":"Hello friend!"}]}}]}"#
            }),
        );
        let base = serve(router).await;

        let refiner = GeminiRefiner::new("test", "gemini-pro", Duration::from_secs(5))
            .unwrap()
            .with_endpoint(&base);

        assert_eq!(refiner.refine("hello friend").await.unwrap(), "Hello friend!");
    }

    #[tokio::test]
    async fn refine_reports_http_errors() {
        let router = Router::new().route(
            "/v1beta/models/{action}",
            post(|| async { (axum::http::StatusCode::TOO_MANY_REQUESTS, "quota") }),
        );
        let base = serve(router).await;

        let refiner = GeminiRefiner::new("test", "gemini-pro", Duration::from_secs(5))
            .unwrap()
            .with_endpoint(&base);

        let err = refiner.refine("hello").await.unwrap_err();
        assert!(err.to_string().contains("429"), "got: {err}");
    }
}
