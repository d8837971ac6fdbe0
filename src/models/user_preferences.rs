use serde::{Deserialize, Serialize};

use super::RecommendationFilters;

/// Preferences a user saves on the backend and reuses as recommendation filters
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub favorite_genres: Vec<String>,
    #[serde(default)]
    pub favorite_directors: Vec<String>,
    #[serde(default)]
    pub favorite_actors: Vec<String>,
    #[serde(default)]
    pub min_year: Option<i32>,
    #[serde(default)]
    pub max_duration: Option<u32>,
    #[serde(default)]
    pub include_adult: bool,
}

impl UserPreferences {
    /// Creates empty user preferences
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a favorite genre, ignoring duplicates
    pub fn add_genre(&mut self, genre: &str) {
        push_unique(&mut self.favorite_genres, genre);
    }

    pub fn add_director(&mut self, director: &str) {
        push_unique(&mut self.favorite_directors, director);
    }

    pub fn add_actor(&mut self, actor: &str) {
        push_unique(&mut self.favorite_actors, actor);
    }

    /// Filters used to request recommendations from these preferences
    pub fn to_filters(&self) -> RecommendationFilters {
        RecommendationFilters {
            genres: self.favorite_genres.clone(),
            directors: self.favorite_directors.clone(),
            actors: self.favorite_actors.clone(),
            min_year: self.min_year,
            max_duration: self.max_duration,
            include_adult: self.include_adult,
        }
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    if !list.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        list.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_preferences() {
        let prefs = UserPreferences::new();
        assert!(prefs.favorite_genres.is_empty());
        assert!(!prefs.include_adult);
    }

    #[test]
    fn test_add_genre_ignores_duplicates() {
        let mut prefs = UserPreferences::new();
        prefs.add_genre("Drama");
        prefs.add_genre("drama");
        prefs.add_genre(" ");
        assert_eq!(prefs.favorite_genres, vec!["Drama"]);
    }

    #[test]
    fn test_to_filters() {
        let mut prefs = UserPreferences::new();
        prefs.add_director("Agnès Varda");
        prefs.add_actor("Toni Collette");
        prefs.min_year = Some(1990);

        let filters = prefs.to_filters();
        assert_eq!(filters.directors, vec!["Agnès Varda"]);
        assert_eq!(filters.actors, vec!["Toni Collette"]);
        assert_eq!(filters.min_year, Some(1990));
        assert_eq!(filters.max_duration, None);
    }
}
