/// Google Gemini text-completion provider
///
/// One `generateContent` call per recommendation batch. Only the text of the
/// first candidate is used; interpreting it is left to the caller.
use crate::{
    error::{AppError, AppResult},
    models::{GeminiRequest, GeminiResponse},
    services::providers::TextCompletion,
};
use reqwest::Client as HttpClient;
use std::time::Duration;

#[derive(Clone)]
pub struct GeminiProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, api_url: String, model: String, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            http_client: HttpClient::builder().timeout(timeout).build()?,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.api_url, self.model)
    }
}

#[async_trait::async_trait]
impl TextCompletion for GeminiProvider {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        if prompt.trim().is_empty() {
            return Err(AppError::InvalidInput("Prompt cannot be empty".to_string()));
        }

        let response = self
            .http_client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&GeminiRequest::from_prompt(prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Gemini API returned status {}: {}",
                status, body
            )));
        }

        let completion: GeminiResponse = response.json().await?;
        let text = completion
            .text()
            .ok_or_else(|| AppError::InvalidResponse("Gemini returned no candidates".to_string()))?
            .to_string();

        tracing::info!(
            model = %self.model,
            chars = text.len(),
            provider = self.name(),
            "Completion received"
        );

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_provider(api_url: String) -> GeminiProvider {
        GeminiProvider::new(
            "test_key".to_string(),
            api_url,
            "gemini-test".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_includes_model() {
        let provider = create_test_provider("http://test.local/".to_string());
        assert_eq!(
            provider.endpoint(),
            "http://test.local/v1beta/models/gemini-test:generateContent"
        );
    }

    #[tokio::test]
    async fn test_complete_returns_first_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .and(query_param("key", "test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "[]" }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = create_test_provider(server.uri());
        assert_eq!(provider.complete("recommend").await.unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_complete_surfaces_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .mount(&server)
            .await;

        let provider = create_test_provider(server.uri());
        let err = provider.complete("recommend").await.unwrap_err();
        assert!(matches!(err, AppError::ExternalApi(msg) if msg.contains("429")));
    }

    #[tokio::test]
    async fn test_complete_without_candidates_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let provider = create_test_provider(server.uri());
        let err = provider.complete("recommend").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected() {
        let provider = create_test_provider("http://test.local".to_string());
        assert!(matches!(
            provider.complete("  ").await,
            Err(AppError::InvalidInput(_))
        ));
    }
}
