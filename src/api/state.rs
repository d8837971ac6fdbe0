use std::sync::Arc;

use crate::{
    auth::{ApiClient, RecordingEvents, Session},
    config::Config,
    db::{create_redis_client, FileStore, KeyValueStore, RecommendationCache, RedisStore},
    services::{
        providers::{GeminiProvider, TmdbProvider},
        BackendClient, RecommendationService,
    },
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommendations: RecommendationService,
    pub backend: BackendClient,
    /// Notifications and redirects waiting to be picked up by the UI
    pub events: Arc<RecordingEvents>,
}

impl AppState {
    pub fn new(
        recommendations: RecommendationService,
        backend: BackendClient,
        events: Arc<RecordingEvents>,
    ) -> Self {
        Self {
            recommendations,
            backend,
            events,
        }
    }

    /// Wires the production services described by `config`
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store: Arc<dyn KeyValueStore> = match &config.redis_url {
            Some(redis_url) => {
                tracing::info!("Using Redis key-value store");
                Arc::new(RedisStore::new(create_redis_client(redis_url)?))
            }
            None => {
                tracing::info!(path = %config.store_path, "Using file key-value store");
                Arc::new(FileStore::new(&config.store_path))
            }
        };

        let events = Arc::new(RecordingEvents::new());
        let session = Arc::new(Session::new(store.clone()));
        let api = ApiClient::new(
            &config.api_base_url,
            config.request_timeout(),
            session,
            events.clone(),
        )?;

        let completion = GeminiProvider::new(
            config.gemini_api_key.clone(),
            config.gemini_api_url.clone(),
            config.gemini_model.clone(),
            config.request_timeout(),
        )?;
        let metadata = TmdbProvider::new(
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            config.tmdb_image_url.clone(),
            config.request_timeout(),
        )?;

        let recommendations = RecommendationService::new(
            Arc::new(completion),
            Arc::new(metadata),
            RecommendationCache::new(store),
            config.recommendation_count,
        );

        Ok(Self::new(recommendations, BackendClient::new(api), events))
    }
}
