/// TMDB movie metadata provider
///
/// Used to enrich AI recommendations with posters and to look up canonical
/// titles. Authenticated with the `api_key` query parameter.
use crate::{
    error::{AppError, AppResult},
    models::{TmdbMovie, TmdbMovieDetails, TmdbSearchResponse},
    services::providers::MovieMetadata,
};
use reqwest::Client as HttpClient;
use std::time::Duration;

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_url: String,
}

impl TmdbProvider {
    pub fn new(
        api_key: String,
        api_url: String,
        image_url: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        Ok(Self {
            http_client: HttpClient::builder().timeout(timeout).build()?,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            image_url: image_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);
        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(AppError::NotFound(format!("TMDB resource {}", path)));
            }
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl MovieMetadata for TmdbProvider {
    async fn search_movie(&self, title: &str, year: Option<i32>) -> AppResult<Vec<TmdbMovie>> {
        if title.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let mut query = vec![("query", title.to_string())];
        if let Some(year) = year {
            query.push(("year", year.to_string()));
        }

        let search: TmdbSearchResponse = self.get_json("/search/movie", &query).await?;

        tracing::debug!(
            query = %title,
            results = search.results.len(),
            provider = self.name(),
            "Movie search completed"
        );

        Ok(search.results)
    }

    async fn movie_details(&self, id: u64) -> AppResult<TmdbMovieDetails> {
        self.get_json(&format!("/movie/{}", id), &[]).await
    }

    fn poster_url(&self, poster_path: &str) -> String {
        format!("{}/{}", self.image_url, poster_path.trim_start_matches('/'))
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
