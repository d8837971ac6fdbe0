use std::sync::Arc;

use tokio::sync::RwLock;

use crate::db::KeyValueStore;
use crate::models::TokenPair;

/// Store key holding the persisted refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Credentials of the signed-in user
///
/// The access token only lives in memory. The refresh token is persisted so a
/// restarted process can resume the session. A single `Session` is shared by
/// reference with the request pipeline; login, logout and refresh are its only
/// writers.
pub struct Session {
    access_token: RwLock<Option<String>>,
    store: Arc<dyn KeyValueStore>,
}

impl Session {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            access_token: RwLock::new(None),
            store,
        }
    }

    pub async fn access_token(&self) -> Option<String> {
        self.access_token.read().await.clone()
    }

    /// Reads the persisted refresh token; an unreadable store counts as absent
    pub async fn refresh_token(&self) -> Option<String> {
        match self.store.get(REFRESH_TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read refresh token");
                None
            }
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.access_token.read().await.is_some()
    }

    /// Installs a freshly issued token pair
    pub async fn set_tokens(&self, tokens: &TokenPair) {
        *self.access_token.write().await = Some(tokens.access_token.clone());

        if let Err(e) = self.store.set(REFRESH_TOKEN_KEY, &tokens.refresh_token).await {
            tracing::warn!(error = %e, "Failed to persist refresh token");
        }
    }

    /// Forgets both tokens
    pub async fn clear(&self) {
        *self.access_token.write().await = None;

        if let Err(e) = self.store.remove(REFRESH_TOKEN_KEY).await {
            tracing::warn!(error = %e, "Failed to remove refresh token");
        }
    }
}
