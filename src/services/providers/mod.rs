use futures::future::join_all;

/// External data providers used to build recommendations
///
/// This module provides a pluggable architecture for the two services the
/// recommendation flow depends on: a generative text-completion model that
/// writes the recommendations, and a movie metadata database that supplies
/// posters and canonical titles.
use crate::{
    error::AppResult,
    models::{RecommendationRecord, TmdbMovie, TmdbMovieDetails},
};

pub mod gemini;
pub mod tmdb;

pub use gemini::GeminiProvider;
pub use tmdb::TmdbProvider;

/// Trait for generative text-completion providers
#[async_trait::async_trait]
pub trait TextCompletion: Send + Sync {
    /// Sends one prompt and returns the raw completion text
    async fn complete(&self, prompt: &str) -> AppResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Trait for movie metadata providers
#[async_trait::async_trait]
pub trait MovieMetadata: Send + Sync {
    /// Search for movies by title, optionally narrowed to a release year
    async fn search_movie(&self, title: &str, year: Option<i32>) -> AppResult<Vec<TmdbMovie>>;

    /// Fetch full details for one movie
    async fn movie_details(&self, id: u64) -> AppResult<TmdbMovieDetails>;

    /// Absolute URL of a poster path returned by the API
    fn poster_url(&self, poster_path: &str) -> String;

    /// Poster of the best match for a title, if the provider has one
    async fn find_poster(&self, title: &str, year: i32) -> AppResult<Option<String>> {
        let movies = self.search_movie(title, Some(year)).await?;
        Ok(movies
            .into_iter()
            .find_map(|m| m.poster_path)
            .map(|path| self.poster_url(&path)))
    }

    /// Fills in missing poster URLs concurrently
    ///
    /// A failed lookup only leaves that record without a poster.
    async fn enrich_posters(&self, records: Vec<RecommendationRecord>) -> Vec<RecommendationRecord> {
        let lookups = records.into_iter().map(|mut record| async move {
            if record.poster_url.is_none() {
                let lookup = self.find_poster(&record.title, record.year).await;
                match lookup {
                    Ok(poster) => record.poster_url = poster,
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            title = %record.title,
                            provider = self.name(),
                            "Poster lookup failed"
                        );
                    }
                }
            }
            record
        });

        join_all(lookups).await
    }

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
