//! Prompt construction and completion parsing for AI recommendations.

use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{RecommendationFilters, RecommendationRecord},
};

/// Builds the completion prompt for one recommendation batch
pub fn build_prompt(filters: &RecommendationFilters, special: bool, count: usize) -> String {
    let mut lines = vec![format!(
        "You are a movie expert. Recommend exactly {} movies for a user with these preferences:",
        count
    )];

    lines.push(format!("- Favorite genres: {}", list_or_any(&filters.genres)));
    lines.push(format!("- Favorite directors: {}", list_or_any(&filters.directors)));
    lines.push(format!("- Favorite actors: {}", list_or_any(&filters.actors)));
    if let Some(min_year) = filters.min_year {
        lines.push(format!("- Released in {} or later", min_year));
    }
    if let Some(max_duration) = filters.max_duration {
        lines.push(format!("- Running time at most {} minutes", max_duration));
    }
    if !filters.include_adult {
        lines.push("- No adult content".to_string());
    }

    if special {
        lines.push(String::new());
        lines.push(
            "This is for a special occasion: favor memorable, crowd-pleasing films suited to sharing with someone."
                .to_string(),
        );
    }

    lines.push(String::new());
    lines.push(
        "Respond with a JSON array only, no commentary. Each element must have the fields \
         \"title\" (string), \"year\" (number), \"genres\" (array of strings), \"synopsis\" (string), \
         \"reason\" (string explaining why it fits these preferences) and \
         \"streamingPlatforms\" (array of strings)."
            .to_string(),
    );

    lines.join("\n")
}

fn list_or_any(values: &[String]) -> String {
    if values.is_empty() {
        "any".to_string()
    } else {
        values.join(", ")
    }
}

/// Removes a surrounding Markdown code fence such as ```` ```json ... ``` ````
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string ("json") on the opening fence line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };

    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CompletionPayload {
    List(Vec<RecommendationRecord>),
    Wrapped {
        recommendations: Vec<RecommendationRecord>,
    },
}

/// Parses the model's answer into records, keeping the model's order
///
/// Anything that is not a well-formed list of complete records is rejected.
pub fn parse_recommendations(completion: &str) -> AppResult<Vec<RecommendationRecord>> {
    let json = strip_code_fences(completion);

    let payload: CompletionPayload = serde_json::from_str(json).map_err(|e| {
        tracing::error!(error = %e, "Failed to parse AI recommendations");
        AppError::InvalidResponse(format!("Malformed recommendations from AI: {}", e))
    })?;

    let records = match payload {
        CompletionPayload::List(records) => records,
        CompletionPayload::Wrapped { recommendations } => recommendations,
    };

    if let Some(blank) = records.iter().position(|r| r.title.trim().is_empty()) {
        return Err(AppError::InvalidResponse(format!(
            "Recommendation {} has no title",
            blank + 1
        )));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD_JSON: &str = r#"[{
        "title": "Parasite",
        "year": 2019,
        "genres": ["Thriller", "Drama"],
        "synopsis": "A poor family schemes its way into a rich household.",
        "reason": "You like Bong Joon-ho.",
        "streamingPlatforms": ["Hulu"]
    }]"#;

    #[test]
    fn test_prompt_mentions_filters() {
        let filters = RecommendationFilters {
            genres: vec!["Drama".to_string(), "Action".to_string()],
            directors: vec![],
            actors: vec!["Song Kang-ho".to_string()],
            min_year: Some(2000),
            max_duration: Some(120),
            include_adult: false,
        };

        let prompt = build_prompt(&filters, false, 5);
        assert!(prompt.contains("exactly 5 movies"));
        assert!(prompt.contains("Favorite genres: Drama, Action"));
        assert!(prompt.contains("Favorite directors: any"));
        assert!(prompt.contains("2000 or later"));
        assert!(prompt.contains("at most 120 minutes"));
        assert!(prompt.contains("No adult content"));
        assert!(!prompt.contains("special occasion"));
    }

    #[test]
    fn test_prompt_special_occasion() {
        let mut filters = RecommendationFilters::default();
        filters.include_adult = true;

        let prompt = build_prompt(&filters, true, 3);
        assert!(prompt.contains("special occasion"));
        assert!(!prompt.contains("No adult content"));
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```\n[1]\n```\n"), "[1]");
        assert_eq!(strip_code_fences("  [1]  "), "[1]");
        assert_eq!(strip_code_fences("```json\n[1]"), "[1]");
    }

    #[test]
    fn test_parse_plain_and_fenced() {
        let plain = parse_recommendations(RECORD_JSON).unwrap();
        let fenced = parse_recommendations(&format!("```json\n{}\n```", RECORD_JSON)).unwrap();

        assert_eq!(plain, fenced);
        assert_eq!(plain[0].title, "Parasite");
        assert_eq!(plain[0].rationale, "You like Bong Joon-ho.");
        assert_eq!(plain[0].streaming_availability, vec!["Hulu"]);
    }

    #[test]
    fn test_parse_wrapped_object_keeps_order() {
        let json = r#"{"recommendations": [
            {"title": "B", "year": 2001, "synopsis": "s", "reason": "r"},
            {"title": "A", "year": 2002, "synopsis": "s", "reason": "r"}
        ]}"#;

        let records = parse_recommendations(json).unwrap();
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A"]);
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let err = parse_recommendations("Sure! Here are some movies: Heat, Alien").unwrap_err();
        assert!(matches!(err, AppError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_rejects_missing_fields_and_blank_titles() {
        assert!(parse_recommendations(r#"[{"title": "Heat"}]"#).is_err());
        assert!(parse_recommendations(
            r#"[{"title": " ", "year": 1995, "synopsis": "s", "reason": "r"}]"#
        )
        .is_err());
    }
}
