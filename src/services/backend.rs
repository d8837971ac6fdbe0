use reqwest::Method;

use crate::{
    auth::{ApiClient, ApiRequest},
    error::{AppError, AppResult},
    models::{Feedback, LoginRequest, NewFeedback, RegisterRequest, TokenPair, User, UserPreferences},
};

/// Typed access to the CineMatch backend REST API
///
/// Every call goes through the authenticated pipeline, so an expired access
/// token is refreshed transparently.
#[derive(Clone)]
pub struct BackendClient {
    api: ApiClient,
}

impl BackendClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Logs in and installs the issued tokens in the session
    pub async fn login(&self, credentials: &LoginRequest) -> AppResult<()> {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(AppError::InvalidInput(
                "Email and password are required".to_string(),
            ));
        }

        let tokens: TokenPair = self.api.post("/auth/login", credentials).await?;
        self.api.session().set_tokens(&tokens).await;
        tracing::info!("Logged in");
        Ok(())
    }

    pub async fn register(&self, request: &RegisterRequest) -> AppResult<()> {
        let tokens: TokenPair = self.api.post("/auth/register", request).await?;
        self.api.session().set_tokens(&tokens).await;
        tracing::info!("Registered");
        Ok(())
    }

    /// Forgets the local credentials; the backend is told on a best-effort basis
    pub async fn logout(&self) {
        if self.api.session().is_authenticated().await {
            if let Err(e) = self.api.send_empty(ApiRequest::new(Method::POST, "/auth/logout")).await {
                tracing::debug!(error = %e, "Backend logout failed");
            }
        }
        self.api.session().clear().await;
        tracing::info!("Logged out");
    }

    pub async fn current_user(&self) -> AppResult<User> {
        self.api.get("/users/me").await
    }

    pub async fn get_user(&self, user_id: &str) -> AppResult<User> {
        self.api.get(&format!("/users/{}", path_segment(user_id)?)).await
    }

    pub async fn search_users(&self, query: &str) -> AppResult<Vec<User>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }
        self.api
            .send(ApiRequest::new(Method::GET, "/users/search").query("q", query.trim()))
            .await
    }

    pub async fn follow(&self, user_id: &str) -> AppResult<()> {
        self.api
            .send_empty(ApiRequest::new(
                Method::POST,
                format!("/users/{}/follow", path_segment(user_id)?),
            ))
            .await
    }

    pub async fn unfollow(&self, user_id: &str) -> AppResult<()> {
        self.api.delete(&format!("/users/{}/follow", path_segment(user_id)?)).await
    }

    pub async fn followers(&self, user_id: &str) -> AppResult<Vec<User>> {
        self.api.get(&format!("/users/{}/followers", path_segment(user_id)?)).await
    }

    pub async fn following(&self, user_id: &str) -> AppResult<Vec<User>> {
        self.api.get(&format!("/users/{}/following", path_segment(user_id)?)).await
    }

    pub async fn list_feedback(&self) -> AppResult<Vec<Feedback>> {
        self.api.get("/feedback").await
    }

    pub async fn create_feedback(&self, feedback: &NewFeedback) -> AppResult<Feedback> {
        feedback.validate().map_err(AppError::InvalidInput)?;
        self.api.post("/feedback", feedback).await
    }

    pub async fn delete_feedback(&self, feedback_id: &str) -> AppResult<()> {
        self.api.delete(&format!("/feedback/{}", path_segment(feedback_id)?)).await
    }

    pub async fn get_preferences(&self) -> AppResult<UserPreferences> {
        self.api.get("/preferences").await
    }

    pub async fn save_preferences(&self, preferences: &UserPreferences) -> AppResult<UserPreferences> {
        self.api.put("/preferences", preferences).await
    }
}

/// Percent-encodes an id for use as a single path segment
///
/// Dot segments are rejected outright since encoding leaves them intact and the
/// backend would resolve them against the parent path.
fn path_segment(id: &str) -> AppResult<String> {
    if id.is_empty() || id == "." || id == ".." {
        return Err(AppError::InvalidInput(format!("Invalid id: {:?}", id)));
    }
    Ok(urlencoding::encode(id).into_owned())
}
