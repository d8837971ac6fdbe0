//! Authenticated request pipeline for the CineMatch backend.
//!
//! Every request goes through the same cycle:
//!
//! ```text
//! attach token → dispatch → 2xx ─────────────────────────────→ done
//!                         → 401 (first time) → refresh → attach token → dispatch (once more)
//!                         → other status ─────────────────────→ error
//! ```
//!
//! A failed refresh wipes the session and reports it as expired. The retry flag
//! belongs to a single call of [`ApiClient::execute`], so concurrent requests
//! never share retry state.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client as HttpClient, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    auth::{events::SessionEvents, session::Session},
    error::{AppError, AppResult, GENERIC_ERROR_MESSAGE},
    models::{RefreshRequest, TokenPair},
};

const REFRESH_PATH: &str = "/auth/refresh";

/// A replayable backend request
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Attaches a JSON body; it is kept as a value so the request can be replayed
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> AppResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| AppError::InvalidInput(format!("Unserializable request body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }
}

/// HTTP client that injects bearer tokens and recovers from one token expiry
#[derive(Clone)]
pub struct ApiClient {
    http_client: HttpClient,
    base_url: String,
    session: Arc<Session>,
    events: Arc<dyn SessionEvents>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: Arc<Session>,
        events: Arc<dyn SessionEvents>,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            events,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.send(ApiRequest::new(Method::GET, path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::new(Method::POST, path).json(body)?)
            .await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::new(Method::PUT, path).json(body)?)
            .await
    }

    /// Sends a request whose response body is not needed
    pub async fn send_empty(&self, request: ApiRequest) -> AppResult<()> {
        self.execute(&request).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> AppResult<()> {
        self.send_empty(ApiRequest::new(Method::DELETE, path)).await
    }

    /// Sends a request and decodes its JSON response
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> AppResult<T> {
        let response = self.execute(&request).await?;
        let payload = response.json::<T>().await.map_err(|e| {
            AppError::InvalidResponse(format!(
                "Unexpected response for {} {}: {}",
                request.method, request.path, e
            ))
        })?;
        Ok(payload)
    }

    /// Runs the attach/dispatch/refresh cycle for one request
    pub async fn execute(&self, request: &ApiRequest) -> AppResult<Response> {
        let mut retried = false;

        loop {
            let response = self.dispatch(request).await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            if status == StatusCode::UNAUTHORIZED && !retried {
                retried = true;
                self.refresh_session().await?;
                tracing::debug!(
                    method = %request.method,
                    path = %request.path,
                    "Retrying request with refreshed token"
                );
                continue;
            }

            return Err(self.error_from_response(response).await);
        }
    }

    async fn dispatch(&self, request: &ApiRequest) -> AppResult<Response> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.http_client.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = self.session.access_token().await {
            builder = builder.bearer_auth(token);
        }

        Ok(builder.send().await?)
    }

    /// Exchanges the persisted refresh token for a new token pair
    ///
    /// Without a refresh token the original 401 is propagated untouched. A
    /// rejected refresh clears the session and signals the login redirect.
    async fn refresh_session(&self) -> AppResult<()> {
        let Some(refresh_token) = self.session.refresh_token().await else {
            tracing::debug!("No refresh token available");
            return Err(AppError::Unauthorized);
        };

        match self.request_token_refresh(&refresh_token).await {
            Ok(tokens) => {
                self.session.set_tokens(&tokens).await;
                tracing::info!("Access token refreshed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, clearing session");
                self.session.clear().await;
                self.events.session_expired();
                Err(AppError::SessionExpired)
            }
        }
    }

    async fn request_token_refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let url = format!("{}{}", self.base_url, REFRESH_PATH);
        let response = self
            .http_client
            .post(&url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let tokens: TokenPair = response.json().await?;
        Ok(tokens)
    }

    async fn error_from_response(&self, response: Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match status {
            StatusCode::UNAUTHORIZED => AppError::Unauthorized,
            StatusCode::BAD_REQUEST => {
                let message = error_message(&body)
                    .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
                self.events.notify_error(&message);
                AppError::BadRequest(message)
            }
            StatusCode::NOT_FOUND => {
                AppError::NotFound(error_message(&body).unwrap_or(body))
            }
            _ => AppError::Api {
                status: status.as_u16(),
                message: error_message(&body).unwrap_or(body),
            },
        }
    }
}

/// Extracts the `message` field of a JSON error body
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_json_body() {
        assert_eq!(
            error_message(r#"{"message":"Email already taken"}"#),
            Some("Email already taken".to_string())
        );
    }

    #[test]
    fn test_error_message_missing_or_invalid() {
        assert_eq!(error_message(r#"{"error":"nope"}"#), None);
        assert_eq!(error_message(r#"{"message":""}"#), None);
        assert_eq!(error_message("<html>Bad Request</html>"), None);
        assert_eq!(error_message(""), None);
    }

    #[test]
    fn test_request_builder_keeps_body_for_replay() {
        let request = ApiRequest::new(Method::POST, "/feedback")
            .query("page", "2")
            .json(&serde_json::json!({ "rating": 4 }))
            .unwrap();

        let replay = request.clone();
        assert_eq!(replay.body, Some(serde_json::json!({ "rating": 4 })));
        assert_eq!(replay.query, vec![("page".to_string(), "2".to_string())]);
    }
}
