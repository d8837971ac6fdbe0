use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod user;
pub mod user_preferences;

pub use user::{
    Feedback, LoginRequest, NewFeedback, RefreshRequest, RegisterRequest, TokenPair, User,
};
pub use user_preferences::UserPreferences;

/// A single AI-generated movie recommendation returned to the client
///
/// Created from the completion response, enriched with a poster URL and never
/// modified after it has been cached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRecord {
    pub title: String,
    pub year: i32,
    #[serde(default, alias = "genre")]
    pub genres: Vec<String>,
    pub synopsis: String,
    /// Why the model picked this title for the user
    #[serde(alias = "reason")]
    pub rationale: String,
    /// Services the title can be streamed on
    #[serde(default, alias = "streamingPlatforms", alias = "streaming")]
    pub streaming_availability: Vec<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
}

/// Filters a user picks before asking for recommendations
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationFilters {
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub directors: Vec<String>,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub min_year: Option<i32>,
    /// Maximum runtime in minutes
    #[serde(default)]
    pub max_duration: Option<u32>,
    #[serde(default)]
    pub include_adult: bool,
}

/// Cached recommendation batch with its validity window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub data: Vec<RecommendationRecord>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// An entry is valid strictly before its expiry instant
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiPart {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// Request body for `models/{model}:generateContent`
#[derive(Debug, Serialize)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
}

impl GeminiRequest {
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    pub content: GeminiContent,
}

#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

impl GeminiResponse {
    /// Text of the first part of the first candidate, if any
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
    }
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Entry of `GET /search/movie`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TmdbMovie {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbSearchResponse {
    #[serde(default)]
    pub results: Vec<TmdbMovie>,
}

/// Response of `GET /movie/{id}`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TmdbMovieDetails {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_record_accepts_ai_field_names() {
        let json = r#"{
            "title": "Heat",
            "year": 1995,
            "genre": ["Crime", "Thriller"],
            "synopsis": "A thief and a detective.",
            "reason": "You like Michael Mann.",
            "streamingPlatforms": ["Netflix"]
        }"#;

        let record: RecommendationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.genres, vec!["Crime", "Thriller"]);
        assert_eq!(record.rationale, "You like Michael Mann.");
        assert_eq!(record.streaming_availability, vec!["Netflix"]);
        assert_eq!(record.poster_url, None);
    }

    #[test]
    fn test_record_missing_synopsis_rejected() {
        let json = r#"{"title": "Heat", "year": 1995, "reason": "x"}"#;
        assert!(serde_json::from_str::<RecommendationRecord>(json).is_err());
    }

    #[test]
    fn test_cache_entry_valid_until_expiry() {
        let created_at = Utc::now();
        let entry = CacheEntry {
            data: vec![],
            created_at,
            expires_at: created_at + Duration::hours(1),
        };

        assert!(entry.is_valid_at(created_at));
        assert!(entry.is_valid_at(entry.expires_at - Duration::milliseconds(1)));
        assert!(!entry.is_valid_at(entry.expires_at));
    }

    #[test]
    fn test_gemini_response_text() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"[]"}]}}]}"#;
        let response: GeminiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("[]"));

        let empty: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.text(), None);
    }
}
