use std::sync::Arc;

use crate::{
    cached,
    db::{compute_key, RecommendationCache},
    error::AppResult,
    models::{RecommendationFilters, RecommendationRecord, TmdbMovieDetails},
    services::{
        prompt,
        providers::{MovieMetadata, TextCompletion},
    },
};

/// Generates personalized movie recommendations
///
/// Asks the completion model for a batch matching the user's filters, adds
/// posters from the metadata provider and caches the batch for an hour under
/// the filters' fingerprint, so identical requests in that window skip the
/// model entirely.
#[derive(Clone)]
pub struct RecommendationService {
    completion: Arc<dyn TextCompletion>,
    metadata: Arc<dyn MovieMetadata>,
    cache: RecommendationCache,
    count: usize,
}

impl RecommendationService {
    pub fn new(
        completion: Arc<dyn TextCompletion>,
        metadata: Arc<dyn MovieMetadata>,
        cache: RecommendationCache,
        count: usize,
    ) -> Self {
        Self {
            completion,
            metadata,
            cache,
            count,
        }
    }

    pub async fn recommend(
        &self,
        filters: &RecommendationFilters,
        special: bool,
    ) -> AppResult<Vec<RecommendationRecord>> {
        let key = compute_key(filters, special);

        cached!(self.cache, key, async {
            let records = self.generate(filters, special).await?;
            let records = self.metadata.enrich_posters(records).await;

            tracing::info!(
                recommendations = records.len(),
                posters = records.iter().filter(|r| r.poster_url.is_some()).count(),
                special = special,
                provider = self.completion.name(),
                "Recommendations generated"
            );

            AppResult::Ok(records)
        })
    }

    /// Canonical metadata for one recommended title
    pub async fn movie_details(&self, movie_id: u64) -> AppResult<TmdbMovieDetails> {
        self.metadata.movie_details(movie_id).await
    }

    /// Calls the model once and parses its answer, bypassing the cache
    async fn generate(
        &self,
        filters: &RecommendationFilters,
        special: bool,
    ) -> AppResult<Vec<RecommendationRecord>> {
        let prompt = prompt::build_prompt(filters, special, self.count);
        let completion = self.completion.complete(&prompt).await?;
        prompt::parse_recommendations(&completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::{MemoryStore, MockKeyValueStore};
    use crate::error::AppError;
    use crate::models::{TmdbMovie, TmdbMovieDetails};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedCompletion {
        reply: String,
        calls: AtomicUsize,
    }

    impl ScriptedCompletion {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl TextCompletion for ScriptedCompletion {
        async fn complete(&self, _prompt: &str) -> AppResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    struct StaticPosters;

    #[async_trait::async_trait]
    impl MovieMetadata for StaticPosters {
        async fn search_movie(&self, title: &str, _year: Option<i32>) -> AppResult<Vec<TmdbMovie>> {
            if title == "Unknown" {
                return Err(AppError::ExternalApi("down".to_string()));
            }
            Ok(vec![TmdbMovie {
                id: 1,
                title: title.to_string(),
                release_date: None,
                poster_path: Some(format!("/{}.jpg", title.to_lowercase())),
            }])
        }

        async fn movie_details(&self, id: u64) -> AppResult<TmdbMovieDetails> {
            Err(AppError::NotFound(id.to_string()))
        }

        fn poster_url(&self, poster_path: &str) -> String {
            format!("https://img.test{}", poster_path)
        }

        fn name(&self) -> &'static str {
            "static"
        }
    }

    const REPLY: &str = "```json\n[\
        {\"title\": \"Heat\", \"year\": 1995, \"synopsis\": \"s\", \"reason\": \"r\"},\
        {\"title\": \"Unknown\", \"year\": 2000, \"synopsis\": \"s\", \"reason\": \"r\"}\
    ]\n```";

    fn service(completion: Arc<ScriptedCompletion>) -> RecommendationService {
        RecommendationService::new(
            completion,
            Arc::new(StaticPosters),
            RecommendationCache::new(Arc::new(MemoryStore::new())),
            2,
        )
    }

    fn filters(genres: &[&str]) -> RecommendationFilters {
        RecommendationFilters {
            genres: genres.iter().map(|g| g.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_recommend_enriches_posters() {
        let completion = ScriptedCompletion::new(REPLY);
        let records = service(completion)
            .recommend(&filters(&["Crime"]), false)
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].poster_url.as_deref(), Some("https://img.test/heat.jpg"));
        assert_eq!(records[1].poster_url, None);
    }

    #[tokio::test]
    async fn test_repeated_request_served_from_cache() {
        let completion = ScriptedCompletion::new(REPLY);
        let service = service(completion.clone());

        let first = service
            .recommend(&filters(&["Drama", "Action"]), false)
            .await
            .unwrap();
        let second = service
            .recommend(&filters(&["Action", "Drama"]), false)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(completion.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_special_flag_uses_separate_entry() {
        let completion = ScriptedCompletion::new(REPLY);
        let service = service(completion.clone());

        service.recommend(&filters(&["Drama"]), false).await.unwrap();
        service.recommend(&filters(&["Drama"]), true).await.unwrap();

        assert_eq!(completion.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_malformed_completion_is_not_cached() {
        let completion = ScriptedCompletion::new("I cannot help with that.");
        let service = service(completion.clone());

        for _ in 0..2 {
            let err = service.recommend(&filters(&[]), false).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidResponse(_)));
        }
        assert_eq!(completion.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_persist_still_returns_generated_records() {
        let mut store = MockKeyValueStore::new();
        store.expect_get().returning(|_| Ok(None));
        store
            .expect_set()
            .returning(|_, _| Err(AppError::Internal("quota exceeded".to_string())));

        let completion = ScriptedCompletion::new(REPLY);
        let service = RecommendationService::new(
            completion.clone(),
            Arc::new(StaticPosters),
            RecommendationCache::new(Arc::new(store)),
            2,
        );

        for _ in 0..2 {
            let records = service.recommend(&filters(&["Crime"]), false).await.unwrap();
            assert_eq!(records.len(), 2);
            assert_eq!(records[0].title, "Heat");
        }
        assert_eq!(completion.calls.load(Ordering::SeqCst), 2);
    }
}
