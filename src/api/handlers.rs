use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    auth::SessionEvent,
    error::AppResult,
    models::{
        Feedback, LoginRequest, NewFeedback, RecommendationFilters, RecommendationRecord,
        RegisterRequest, TmdbMovieDetails, User, UserPreferences,
    },
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    #[serde(default)]
    pub preferences: RecommendationFilters,
    #[serde(default)]
    pub special_occasion: bool,
}

#[derive(Debug, Deserialize)]
pub struct UserSearchQuery {
    pub q: String,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Generate (or reuse cached) recommendations for a set of filters
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<Vec<RecommendationRecord>>> {
    tracing::info!(
        genres = request.preferences.genres.len(),
        directors = request.preferences.directors.len(),
        actors = request.preferences.actors.len(),
        special = request.special_occasion,
        "Processing recommendation request"
    );

    let records = state
        .recommendations
        .recommend(&request.preferences, request.special_occasion)
        .await?;

    Ok(Json(records))
}

pub async fn movie_details(
    State(state): State<AppState>,
    Path(movie_id): Path<u64>,
) -> AppResult<Json<TmdbMovieDetails>> {
    Ok(Json(state.recommendations.movie_details(movie_id).await?))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<StatusCode> {
    state.backend.login(&request).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<StatusCode> {
    state.backend.register(&request).await?;
    Ok(StatusCode::CREATED)
}

pub async fn logout(State(state): State<AppState>) -> StatusCode {
    state.backend.logout().await;
    StatusCode::NO_CONTENT
}

/// Drain pending notifications and redirects for the UI
pub async fn session_events(State(state): State<AppState>) -> Json<Vec<SessionEvent>> {
    Json(state.events.drain())
}

pub async fn current_user(State(state): State<AppState>) -> AppResult<Json<User>> {
    Ok(Json(state.backend.current_user().await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<User>> {
    Ok(Json(state.backend.get_user(&user_id).await?))
}

pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<UserSearchQuery>,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.backend.search_users(&query.q).await?))
}

pub async fn followers(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.backend.followers(&user_id).await?))
}

pub async fn following(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.backend.following(&user_id).await?))
}

pub async fn follow(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<StatusCode> {
    state.backend.follow(&user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unfollow(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<StatusCode> {
    state.backend.unfollow(&user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_feedback(State(state): State<AppState>) -> AppResult<Json<Vec<Feedback>>> {
    Ok(Json(state.backend.list_feedback().await?))
}

pub async fn create_feedback(
    State(state): State<AppState>,
    Json(request): Json<NewFeedback>,
) -> AppResult<(StatusCode, Json<Feedback>)> {
    let feedback = state.backend.create_feedback(&request).await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

pub async fn delete_feedback(
    State(state): State<AppState>,
    Path(feedback_id): Path<String>,
) -> AppResult<StatusCode> {
    state.backend.delete_feedback(&feedback_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_preferences(State(state): State<AppState>) -> AppResult<Json<UserPreferences>> {
    Ok(Json(state.backend.get_preferences().await?))
}

pub async fn save_preferences(
    State(state): State<AppState>,
    Json(preferences): Json<UserPreferences>,
) -> AppResult<Json<UserPreferences>> {
    Ok(Json(state.backend.save_preferences(&preferences).await?))
}
