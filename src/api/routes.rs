use axum::{
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;

/// Creates the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Recommendations
        .route("/recommendations", post(handlers::recommend))
        .route("/movies/:id", get(handlers::movie_details))
        // Session
        .route("/session/login", post(handlers::login))
        .route("/session/register", post(handlers::register))
        .route("/session/logout", post(handlers::logout))
        .route("/session/events", get(handlers::session_events))
        // Users and following
        .route("/users/me", get(handlers::current_user))
        .route("/users/search", get(handlers::search_users))
        .route("/users/:id", get(handlers::get_user))
        .route("/users/:id/followers", get(handlers::followers))
        .route("/users/:id/following", get(handlers::following))
        .route(
            "/users/:id/follow",
            post(handlers::follow).delete(handlers::unfollow),
        )
        // Feedback
        .route(
            "/feedback",
            get(handlers::list_feedback).post(handlers::create_feedback),
        )
        .route("/feedback/:id", delete(handlers::delete_feedback))
        // Preferences
        .route(
            "/preferences",
            get(handlers::get_preferences).put(handlers::save_preferences),
        )
}
